//! Symbolic rendering of enumerations and bit flags
//!
//! Tables are static data: an ordered list of `(value, name)` pairs plus
//! the marker printed next to values the table does not know. Rendering is
//! pure and total.

pub mod amdgpu;
pub mod drm;
pub mod i915;

use crate::ioc::hex;

/// A value↔name translation table
#[derive(Debug)]
pub struct Xlat {
    pub entries: &'static [(u64, &'static str)],
    /// Printed in a trailing comment for unmatched values (`CAP_???`).
    pub unknown: &'static str,
    /// Text for a zero flag word.
    pub zero: &'static str,
}

impl Xlat {
    pub const fn new(entries: &'static [(u64, &'static str)], unknown: &'static str) -> Self {
        Self { entries, unknown, zero: "0" }
    }

    pub const fn with_zero(mut self, zero: &'static str) -> Self {
        self.zero = zero;
        self
    }

    pub fn lookup(&self, value: u64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, name)| *name)
    }
}

/// Exact match prints the name, anything else prints `0x2a /* CAP_??? */`.
pub fn render_enum(table: &Xlat, value: u64) -> String {
    match table.lookup(value) {
        Some(name) => name.to_string(),
        None => format!("{} /* {} */", hex(value), table.unknown),
    }
}

/// Decompose `value` into `A|B|0x40`; when nothing matches the residual is
/// followed by the unknown marker.
pub fn render_flags(table: &Xlat, value: u64) -> String {
    if value == 0 {
        return table.zero.to_string();
    }

    let mut names: Vec<&str> = Vec::new();
    let mut rest = value;
    for (bits, name) in table.entries {
        if *bits != 0 && rest & bits == *bits {
            names.push(name);
            rest &= !bits;
        }
    }

    if names.is_empty() {
        return format!("{} /* {} */", hex(value), table.unknown);
    }

    let mut out = names.join("|");
    if rest != 0 {
        out.push('|');
        out.push_str(&hex(rest));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    static COLORS: Xlat = Xlat::new(&[(1, "RED"), (2, "GREEN"), (7, "WHITE")], "COLOR_???");
    static BITS: Xlat = Xlat::new(&[(0x1, "A"), (0x2, "B"), (0x4, "C")], "BIT_???");
    static NAMED_ZERO: Xlat = Xlat::new(&[(0x1, "ONE")], "X_???").with_zero("NONE");

    #[test]
    fn test_enum_known() {
        assert_eq!(render_enum(&COLORS, 2), "GREEN");
    }

    #[test]
    fn test_enum_unknown() {
        assert_eq!(render_enum(&COLORS, 0x2a), "0x2a /* COLOR_??? */");
        assert_eq!(render_enum(&COLORS, 0), "0 /* COLOR_??? */");
    }

    #[test]
    fn test_flags_zero() {
        assert_eq!(render_flags(&BITS, 0), "0");
        assert_eq!(render_flags(&NAMED_ZERO, 0), "NONE");
    }

    #[test]
    fn test_flags_decompose_with_residual() {
        assert_eq!(render_flags(&BITS, 0x5), "A|C");
        assert_eq!(render_flags(&BITS, 0x43), "A|B|0x40");
    }

    #[test]
    fn test_flags_nothing_matches() {
        assert_eq!(render_flags(&BITS, 0x40), "0x40 /* BIT_??? */");
    }

    #[test]
    fn test_flags_multibit_entry_consumes_in_order() {
        // WHITE listed after RED and GREEN, so only the remaining bit 4 is left
        assert_eq!(render_flags(&COLORS, 7), "RED|GREEN|0x4");
    }
}
