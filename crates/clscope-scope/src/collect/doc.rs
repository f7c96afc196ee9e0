use clscope_reader::{Element, ElementKind, Elements, Pair};

use super::Collector;

impl Collector<'_> {
    /// The documentation string among definition options: the first bare
    /// string literal, the string after a `:documentation` keyword, or the
    /// string of a `(:documentation "...")` option.
    pub(super) fn doc_string(&self, mut body: Elements<'_>) -> Option<String> {
        while let Some(el) = body.next() {
            match el.kind {
                ElementKind::Str if !el.quoted => return self.string_value(&el),
                ElementKind::Atom if self.is_documentation_keyword(&el) => {
                    return body.next().and_then(|s| self.string_value(&s));
                }
                ElementKind::Group(option) => {
                    if let Some(doc) = self.documentation_option(option) {
                        return Some(doc);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// The documentation string of a function body. Only declarations may
    /// precede it, and a string that ends the body is the return value.
    pub(super) fn body_doc_string(&self, mut body: Elements<'_>) -> Option<String> {
        while let Some(el) = body.next() {
            if el.is_string() && !el.quoted {
                body.next()?;
                return self.string_value(&el);
            }
            if !self.is_declaration(&el) {
                return None;
            }
        }
        None
    }

    /// `(declare ...)`.
    fn is_declaration(&self, el: &Element) -> bool {
        let Some(group) = el.group().filter(|_| !el.quoted) else {
            return false;
        };
        self.elements(group)
            .next()
            .is_some_and(|head| head.is_atom() && head.text(self.text).eq_ignore_ascii_case("declare"))
    }

    fn documentation_option(&self, option: Pair) -> Option<String> {
        let mut parts = self.elements(option);
        let head = parts.next()?;
        if !self.is_documentation_keyword(&head) {
            return None;
        }
        parts.next().and_then(|s| self.string_value(&s))
    }

    fn is_documentation_keyword(&self, el: &Element) -> bool {
        el.is_atom() && el.text(self.text).eq_ignore_ascii_case(":documentation")
    }

    /// Contents of a string literal with escapes removed.
    pub(super) fn string_value(&self, el: &Element) -> Option<String> {
        if !el.is_string() {
            return None;
        }
        let raw = el.text(self.text).strip_prefix('"')?;
        let raw = raw.strip_suffix('"').unwrap_or(raw);
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else {
                out.push(c);
            }
        }
        Some(out)
    }
}
