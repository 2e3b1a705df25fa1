use super::model::CellValue;

/// Width of a canonical stock code.
pub const CODE_WIDTH: usize = 6;

/// Normalize a raw stock-code cell into its canonical form.
///
/// Returns the empty string for cells that carry no code. Codes imported as
/// floats (`600000.0`) lose their fractional part; codes longer than
/// [`CODE_WIDTH`] digits are kept whole.
pub fn normalize_code(raw: &CellValue) -> String {
    if raw.is_null() {
        return String::new();
    }
    match raw {
        CellValue::String(s) => normalize_str(s),
        other => normalize_str(&other.to_string()),
    }
}

/// Normalize a textual stock code, e.g. one typed by a user.
pub fn normalize_str(raw: &str) -> String {
    let trimmed = raw.trim();
    let integral = match trimmed.find('.') {
        Some(dot) => &trimmed[..dot],
        None => trimmed,
    };
    let digits: String = integral.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return digits;
    }
    format!("{digits:0>width$}", width = CODE_WIDTH)
}
