use std::fmt::Write as _;

/// Renders `bytes` as `"<label> | <hex>"`, hex as space-separated lowercase
/// pairs. `hex2h264` turns a file of such lines back into a byte stream.
#[must_use]
pub fn format_hex_line(label: &str, bytes: &[u8]) -> String {
    let mut line = String::with_capacity(label.len() + 3 + bytes.len() * 3);
    line.push_str(label);
    line.push_str(" | ");
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        let _ = write!(line, "{b:02x}");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_then_hex_pairs() {
        assert_eq!(
            format_hex_line("sps", &[0x67, 0x42, 0x00, 0x1f]),
            "sps | 67 42 00 1f"
        );
    }

    #[test]
    fn empty_payload_keeps_separator() {
        assert_eq!(format_hex_line("x", &[]), "x | ");
    }
}
