//! Symbol occurrences.
//!
//! Consumers (references, highlighting, call hierarchy) need every place a
//! symbol is written. Comments and strings are skipped using the scanner's
//! ranges; numbers, keywords and uninterned `#:` symbols are not reported.

use clscope_core::TextRange;

use crate::chars::{atom_end, is_delimiter, looks_numeric};
use crate::scanner::Scanned;

/// One symbol written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolToken {
    /// Lower-cased name.
    pub name: String,
    pub range: TextRange,
}

/// All symbol tokens of `text`, in source order.
pub fn symbol_tokens(text: &str, scanned: &Scanned) -> Vec<SymbolToken> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let skip = scanned.comment_string();
    let mut out = Vec::new();
    let mut i = 0;
    while i < len {
        if let Some(r) = skip.range_at(i) {
            i = r.end;
            continue;
        }
        let b = bytes[i];
        if is_delimiter(b) {
            i += 1;
            continue;
        }
        if b == b'#' {
            i = skip_dispatch(bytes, scanned, i);
            continue;
        }
        let end = atom_end(bytes, i);
        let token = &text[i..end];
        if !token.starts_with(':') && token != "." && !looks_numeric(token) {
            out.push(SymbolToken {
                name: token.to_lowercase(),
                range: TextRange::new(i, end),
            });
        }
        i = end.max(i + 1);
    }
    out
}

/// Skip a `#` dispatch prefix starting at `hash`, returning where ordinary
/// tokenizing resumes. An optional decimal argument (`#2A`, `#16r`) may sit
/// between `#` and the dispatch character.
fn skip_dispatch(bytes: &[u8], scanned: &Scanned, hash: usize) -> usize {
    let mut j = hash + 1;
    while bytes.get(j).is_some_and(u8::is_ascii_digit) {
        j += 1;
    }
    let Some(&dispatch) = bytes.get(j) else {
        return j;
    };
    match dispatch.to_ascii_lowercase() {
        b'\'' => j + 1,
        b'\\' => atom_end(bytes, hash).max(j + 1),
        b':' => atom_end(bytes, j + 1).max(j + 1),
        // Feature tests such as `#+sbcl` or `#-(or a b)` name
        // features, not variables.
        b'+' | b'-' => match scanned.pairs.close_of(j + 1) {
            Some(close) => close + 1,
            None => atom_end(bytes, j + 1).max(j + 1),
        },
        // Radix rationals (`#x1F`, `#b101`, `#36rZZ`) and bit vectors (`#*1010`).
        b'x' | b'b' | b'o' | b'r' | b'*' => atom_end(bytes, j + 1).max(j + 1),
        // `#c(1 2)`, `#p"/tmp"`, `#s(point :x 1)`, `#2a((1 2))`: the letter
        // prefixes the next object, which is read normally.
        b'c' | b'p' | b's' | b'a' => j + 1,
        _ => j,
    }
}
