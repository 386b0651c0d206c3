/// Text shown in a display field when the driver call behind it failed.
pub const ERROR_TEXT: &str = "Error";

/// Packs eight toggle states into one output byte, toggle `i` becoming bit `i`.
pub fn pack_output_byte(bank: &[bool; 8]) -> u8 {
    bank.iter()
        .enumerate()
        .filter(|(_, &checked)| checked)
        .fold(0u8, |byte, (bit, _)| byte | (1 << bit))
}

/// Formats a byte value (adapter ID, output port) as two uppercase hex digits.
pub fn format_hex_byte(value: u8) -> String {
    format!("{:02X}", value)
}

/// Formats a value as uppercase hex without padding or prefix.
pub fn format_hex(value: u8) -> String {
    format!("{:X}", value)
}

/// Parses an adapter ID typed by the operator.
///
/// Leading whitespace is skipped and at most two hex digits are read, anything
/// after them is ignored. Returns `None` when no hex digit is found.
pub fn parse_hex_id(text: &str) -> Option<u8> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .take(2)
        .collect();
    if digits.is_empty() {
        return None;
    }
    u8::from_str_radix(&digits, 16).ok()
}
