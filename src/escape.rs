//! Unicode-safe encoding of source text for subprocess transport.

/// Rewrite every codepoint outside printable ASCII as a JavaScript
/// `\uXXXX` escape sequence.
///
/// Codepoints above the Basic Multilingual Plane become a UTF-16
/// surrogate pair of two escapes, which the target interpreter's parser
/// reassembles into the original codepoint. The result is pure ASCII, so
/// it survives whatever argv/stdin encoding the interpreter subprocess
/// applies, and line separators like U+2028 (legal inside JSON strings
/// but not inside older JavaScript string literals) never reach the
/// interpreter raw.
pub fn encode_unicode_codepoints(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut units = [0u16; 2];
    for ch in source.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let src = "function add(x, y) { return x + y; }";
        assert_eq!(encode_unicode_codepoints(src), src);
    }

    #[test]
    fn test_bmp_codepoint_escapes() {
        assert_eq!(encode_unicode_codepoints("\u{221a}"), "\\u221a");
        assert_eq!(encode_unicode_codepoints("caf\u{e9}"), "caf\\u00e9");
    }

    #[test]
    fn test_astral_codepoint_becomes_surrogate_pair() {
        // U+1F4A9 encodes as the pair D83D DCA9.
        assert_eq!(encode_unicode_codepoints("\u{1f4a9}"), "\\ud83d\\udca9");
    }

    #[test]
    fn test_line_separator_is_escaped() {
        assert_eq!(encode_unicode_codepoints("a\u{2028}b"), "a\\u2028b");
    }

    #[test]
    fn test_result_is_ascii() {
        let escaped = encode_unicode_codepoints("var s = '\u{65e5}\u{672c}\u{8a9e} \u{1f600}';");
        assert!(escaped.is_ascii());
    }
}
