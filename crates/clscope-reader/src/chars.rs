//! Byte classes shared by the scanner, element reader and tokenizer.
//!
//! Every structural character in Common Lisp source is ASCII, so the
//! scanner works on bytes; UTF-8 continuation bytes are always constituents.

pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

/// Terminating characters end a token.
pub fn is_delimiter(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b'(' | b')' | b'"' | b';' | b'\'' | b'`' | b',')
}

/// Characters that may appear between a quote marker and the datum it
/// quotes, e.g. the backquote in `'`(a ,b)` or the `#` of `'#(1 2)`.
pub fn is_marker_char(b: u8) -> bool {
    matches!(b, b'\'' | b'`' | b',' | b'@' | b'.' | b'#')
}

/// End offset of the atom starting at `start`. Handles `#\x` character
/// literals, single escapes (`\`) and multiple escapes (`|...|`).
pub fn atom_end(bytes: &[u8], start: usize) -> usize {
    let len = bytes.len();
    let mut i = start;
    if i + 1 < len && bytes[i] == b'#' && bytes[i + 1] == b'\\' {
        // The character after `#\` is taken literally, even `(` or `"`.
        i = (i + 3).min(len);
    }
    while i < len {
        match bytes[i] {
            b'\\' => i = (i + 2).min(len),
            b'|' => {
                i += 1;
                while i < len && bytes[i] != b'|' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i = (i + 1).min(len);
            }
            b if is_delimiter(b) => break,
            _ => i += 1,
        }
    }
    i
}

/// Check whether `token` reads as a number rather than a symbol.
/// `1+` and `1-` are symbols; `-1.5e3`, `2/3` and `.5` are numbers.
pub fn looks_numeric(token: &str) -> bool {
    let b = token.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i = 1;
    }
    let mut saw_digit = false;
    while i < b.len() && (b[i].is_ascii_digit() || b[i] == b'.' || b[i] == b'/') {
        saw_digit |= b[i].is_ascii_digit();
        i += 1;
    }
    if !saw_digit {
        return false;
    }
    if i < b.len() && matches!(b[i].to_ascii_lowercase(), b'e' | b'd' | b'f' | b's' | b'l') {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exponent_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exponent_start {
            return false;
        }
    }
    i == b.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_stops_at_delimiters() {
        let src = b"foo-bar)";
        assert_eq!(atom_end(src, 0), 7);
        assert_eq!(atom_end(b"abc def", 0), 3);
        assert_eq!(atom_end(b"x'y", 0), 1);
    }

    #[test]
    fn atom_character_literal_takes_bracket() {
        assert_eq!(atom_end(b"#\\( x", 0), 3);
        assert_eq!(atom_end(b"#\\Space)", 0), 7);
    }

    #[test]
    fn atom_multiple_escape() {
        assert_eq!(atom_end(b"|foo bar|baz qux", 0), 12);
        assert_eq!(atom_end(b"a\\ b c", 0), 4);
    }

    #[test]
    fn numeric_detection() {
        for n in ["1", "-1", "+2.5", ".5", "2/3", "1e10", "-1.5d-3"] {
            assert!(looks_numeric(n), "{n} should be numeric");
        }
        for s in ["1+", "1-", "+", "-", "...", "x1", "1e", "e1"] {
            assert!(!looks_numeric(s), "{s} should be a symbol");
        }
    }
}
