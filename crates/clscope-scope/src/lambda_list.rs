//! Lambda-list parsing.
//!
//! Reads the parameter names out of an ordinary, specialized or
//! destructuring lambda list, bounded by the list's bracket pair. Nested
//! groups are walked through the element reader, so comments, strings,
//! quoted data and feature expressions inside the list never yield names.

use clscope_core::TextRange;
use clscope_reader::{ElementKind, Elements, Pair, Scanned};

use crate::binding::{is_bindable, normalize_name};

/// The lambda-list section currently being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Marker {
    #[default]
    None,
    Optional,
    Key,
    Aux,
    Rest,
}

impl Marker {
    /// Map an `&` word to the section it opens. `&whole`, `&environment`
    /// and `&allow-other-keys` open none.
    fn from_word(word: &str) -> Option<Marker> {
        match word.to_ascii_lowercase().as_str() {
            "&optional" => Some(Marker::Optional),
            "&key" => Some(Marker::Key),
            "&aux" => Some(Marker::Aux),
            "&rest" | "&body" => Some(Marker::Rest),
            _ => None,
        }
    }

    fn has_supplied_p(self) -> bool {
        matches!(self, Marker::Optional | Marker::Key)
    }
}

/// One parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaParam {
    /// Lower-cased name.
    pub name: String,
    pub range: TextRange,
    /// End of the top-level list element the name came from. Parameters are
    /// bound sequentially, so the name is visible from here on.
    pub visible_from: usize,
}

struct Parser<'a> {
    text: &'a str,
    scanned: &'a Scanned,
    destructuring: bool,
    out: Vec<LambdaParam>,
}

/// Parse the lambda list whose opening bracket is at `open`. Returns `None`
/// when that bracket has no known close.
pub fn parse_lambda_list(
    text: &str,
    scanned: &Scanned,
    open: usize,
    destructuring: bool,
) -> Option<Vec<LambdaParam>> {
    let pair = scanned.pairs.get(open)?;
    let mut parser = Parser {
        text,
        scanned,
        destructuring,
        out: Vec::new(),
    };
    parser.group(pair, None);
    Some(parser.out)
}

impl<'a> Parser<'a> {
    fn elements(&self, pair: Pair) -> Elements<'a> {
        self.scanned.elements(self.text, pair)
    }

    /// Walk one (possibly nested) lambda list. `outer` is the end of the
    /// enclosing top-level element when nested.
    fn group(&mut self, pair: Pair, outer: Option<usize>) {
        let mut marker = Marker::None;
        for el in self.elements(pair) {
            if el.quoted {
                continue;
            }
            let visible_from = outer.unwrap_or_else(|| el.end());
            match el.kind {
                ElementKind::Atom => {
                    let word = el.text(self.text);
                    if word.starts_with('&') {
                        if let Some(m) = Marker::from_word(word) {
                            marker = m;
                        }
                        continue;
                    }
                    self.push(el.range, visible_from);
                }
                ElementKind::Group(inner) => {
                    if self.destructuring && matches!(marker, Marker::None | Marker::Rest) {
                        self.group(inner, Some(visible_from));
                    } else {
                        self.spec(inner, marker, visible_from);
                    }
                }
                ElementKind::Str => {}
            }
        }
    }

    /// `(name default supplied-p)`, `((keyword var) default supplied-p)`
    /// or, in a specialized list, `(name specializer)`.
    fn spec(&mut self, spec: Pair, marker: Marker, visible_from: usize) {
        let mut parts = self.elements(spec);
        let Some(first) = parts.next() else {
            return;
        };
        if !first.quoted {
            match first.kind {
                ElementKind::Atom => self.push(first.range, visible_from),
                ElementKind::Group(name_part) if marker == Marker::Key => {
                    if let Some(var) = self.elements(name_part).nth(1) {
                        match var.kind {
                            ElementKind::Atom => self.push(var.range, visible_from),
                            ElementKind::Group(nested) if self.destructuring => {
                                self.group(nested, Some(visible_from))
                            }
                            _ => {}
                        }
                    }
                }
                ElementKind::Group(nested) if self.destructuring => {
                    self.group(nested, Some(visible_from))
                }
                _ => {}
            }
        }
        if marker.has_supplied_p() {
            // Skip the default form.
            if let Some(supplied) = parts.nth(1) {
                if supplied.is_atom() && !supplied.quoted {
                    self.push(supplied.range, visible_from);
                }
            }
        }
    }

    fn push(&mut self, range: TextRange, visible_from: usize) {
        let name = normalize_name(range.slice(self.text));
        if !is_bindable(&name) {
            return;
        }
        self.out.push(LambdaParam {
            name,
            range,
            visible_from,
        });
    }
}
