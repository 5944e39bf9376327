//! Incremental argument text
//!
//! A [`Render`] lives in the decode session, so a record opened while the
//! call is entering can be continued and closed when it exits. Separators
//! are tracked per nesting level.

use std::fmt::{self, Write};

use crate::ioc::{addr, hex};
use crate::record::Record;
use crate::xlat::{render_enum, render_flags, Xlat};

#[derive(Debug, Clone, Copy)]
struct Frame {
    has_items: bool,
    closer: char,
}

#[derive(Debug, Clone, Default)]
pub struct Render {
    out: String,
    frames: Vec<Frame>,
}

/// Last component of a dotted field path.
fn leaf(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

impl Render {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn separate(&mut self) {
        if let Some(top) = self.frames.last_mut() {
            if top.has_items {
                self.out.push_str(", ");
            }
            top.has_items = true;
        }
    }

    /// `name=`, preceded by a separator when the level already has items.
    pub fn label(&mut self, name: &str) {
        self.separate();
        self.out.push_str(name);
        self.out.push('=');
    }

    /// Array element separator.
    pub fn item(&mut self) {
        self.separate();
    }

    pub fn open(&mut self) {
        self.out.push('{');
        self.frames.push(Frame { has_items: false, closer: '}' });
    }

    pub fn open_array(&mut self) {
        self.out.push('[');
        self.frames.push(Frame { has_items: false, closer: ']' });
    }

    pub fn open_field(&mut self, name: &str) {
        self.label(name);
        self.open();
    }

    pub fn close(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.out.push(frame.closer);
        }
    }

    /// Separates entry fields from the fields the call wrote back.
    pub fn arrow(&mut self) {
        self.out.push_str(" => ");
    }

    /// Trailing truncation marker inside the current level.
    pub fn ellipsis(&mut self) {
        self.separate();
        self.out.push_str("...");
    }

    pub fn value(&mut self, name: &str, value: impl fmt::Display) {
        self.label(name);
        let _ = write!(self.out, "{}", value);
    }

    pub fn comment(&mut self, text: impl fmt::Display) {
        let _ = write!(self.out, " /* {} */", text);
    }

    pub fn u(&mut self, r: &Record, path: &str) {
        self.value(leaf(path), r.get(path));
    }

    pub fn d(&mut self, r: &Record, path: &str) {
        self.value(leaf(path), r.get_signed(path));
    }

    pub fn x(&mut self, r: &Record, path: &str) {
        self.value(leaf(path), hex(r.get(path)));
    }

    pub fn ptr(&mut self, r: &Record, path: &str) {
        self.value(leaf(path), addr(r.get(path)));
    }

    pub fn xval(&mut self, r: &Record, path: &str, table: &Xlat) {
        self.value(leaf(path), render_enum(table, r.get_symbolic(path)));
    }

    pub fn flags(&mut self, r: &Record, path: &str, table: &Xlat) {
        self.value(leaf(path), render_flags(table, r.get(path)));
    }

    /// Padding or reserved field, printed only when set.
    pub fn nonzero(&mut self, r: &Record, path: &str) {
        if r.get(path) != 0 {
            self.u(r, path);
        }
    }

    /// Inline scalar array, first `limit` elements, `...` past that.
    pub fn inline(&mut self, r: &Record, path: &str, limit: usize) {
        let len = r.array_len(path);
        self.label(leaf(path));
        self.open_array();
        for index in 0..len.min(limit) {
            self.item();
            let _ = write!(self.out, "{}", r.elem(path, index));
        }
        if len > limit {
            self.ellipsis();
        }
        self.close();
    }

    /// Fixed-size `char[]` field, up to the first NUL.
    pub fn cstr(&mut self, r: &Record, path: &str) {
        let raw = r.raw(path);
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let text = quote(&raw[..end]);
        self.value(leaf(path), text);
    }
}

impl fmt::Display for Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.out)
    }
}

/// Double-quoted C string literal with escapes.
pub fn quote(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            0x0b => out.push_str("\\v"),
            0x0c => out.push_str("\\f"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                // a following digit would be read as part of the escape
                let next_is_digit = bytes.get(i + 1).is_some_and(|n| n.is_ascii_digit());
                if next_is_digit {
                    let _ = write!(out, "\\{:03o}", b);
                } else {
                    let _ = write!(out, "\\{:o}", b);
                }
            }
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::{Field, Personality, RecordDesc, RecordLayout};
    use std::sync::Arc;

    static CAP: RecordDesc =
        RecordDesc::structure("cap", &[Field::u64("capability"), Field::u64("value")]);

    #[test]
    fn test_fields_and_separators() {
        let mut r = Render::new();
        r.open();
        r.value("a", 1);
        r.value("b", 2);
        r.close();
        assert_eq!(r.as_str(), "{a=1, b=2}");
    }

    #[test]
    fn test_nested_levels() {
        let mut r = Render::new();
        r.open();
        r.open_field("in");
        r.value("handle", 3);
        r.close();
        r.open_field("out");
        r.close();
        r.close();
        assert_eq!(r.as_str(), "{in={handle=3}, out={}}");
    }

    #[test]
    fn test_arrays_and_ellipsis() {
        let mut r = Render::new();
        r.open_array();
        r.item();
        r.raw("1");
        r.item();
        r.raw("2");
        r.ellipsis();
        r.close();
        assert_eq!(r.as_str(), "[1, 2, ...]");
    }

    #[test]
    fn test_continue_across_calls() {
        let mut r = Render::new();
        r.open();
        r.value("capability", "CAP_DUMB_BUFFER");
        let split = r.len();
        r.value("value", 1);
        r.close();
        assert_eq!(&r.as_str()[split..], ", value=1}");
    }

    #[test]
    fn test_arrow() {
        let mut r = Render::new();
        r.open();
        r.value("a", 1);
        r.close();
        r.arrow();
        r.open();
        r.value("b", 2);
        r.close();
        assert_eq!(r.as_str(), "{a=1} => {b=2}");
    }

    #[test]
    fn test_record_helpers() {
        let layout = Arc::new(RecordLayout::compute(&CAP, Personality::LP64));
        let mut bytes = 0x2au64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0u64.to_le_bytes());
        let rec = Record::new(layout, bytes);

        let mut r = Render::new();
        r.open();
        r.x(&rec, "capability");
        r.ptr(&rec, "value");
        r.close();
        assert_eq!(r.as_str(), "{capability=0x2a, value=NULL}");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(b"card0"), "\"card0\"");
        assert_eq!(quote(b"a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(quote(&[0x01, b'x']), "\"\\1x\"");
        assert_eq!(quote(&[0x01, b'7']), "\"\\0017\"");
    }
}
