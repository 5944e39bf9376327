//! Bounded rendering of count-and-stride arrays in tracee memory
//!
//! The declared count comes from the tracee and is never trusted: at most
//! `cap` elements are fetched, one read per element, and address
//! arithmetic that overflows counts as an unreadable element.

use tracing::trace;

use crate::ioc::addr;
use crate::memory::TraceeMemory;
use crate::render::Render;

/// Where an array lives and how far to walk it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArraySpec {
    pub base: u64,
    pub count: u64,
    pub stride: usize,
    pub cap: usize,
}

/// What the renderer managed to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOutcome {
    /// `[]`
    Empty,
    /// Null base with a nonzero count.
    Null,
    /// First element unreadable; the base address was printed.
    Unreadable,
    /// All declared elements printed.
    Complete(usize),
    /// Count exceeded the cap; this many elements printed.
    Capped(usize),
    /// A later element was unreadable; this many elements printed.
    Aborted(usize),
}

impl ArrayOutcome {
    pub fn printed(self) -> usize {
        match self {
            ArrayOutcome::Complete(n) | ArrayOutcome::Capped(n) | ArrayOutcome::Aborted(n) => n,
            _ => 0,
        }
    }

    pub fn is_truncated(self) -> bool {
        matches!(self, ArrayOutcome::Capped(_) | ArrayOutcome::Aborted(_))
    }
}

fn element_addr(base: u64, index: u64, stride: usize) -> Option<u64> {
    index
        .checked_mul(stride as u64)
        .and_then(|off| base.checked_add(off))
        .filter(|start| start.checked_add(stride as u64).is_some())
}

/// Walk `spec` and print each element with `element`.
pub fn render_array<F>(
    mem: &dyn TraceeMemory,
    out: &mut Render,
    spec: ArraySpec,
    mut element: F,
) -> ArrayOutcome
where
    F: FnMut(&mut Render, &[u8]),
{
    if spec.count == 0 {
        out.raw("[]");
        return ArrayOutcome::Empty;
    }
    if spec.base == 0 {
        out.raw("NULL");
        return ArrayOutcome::Null;
    }

    let wanted = spec.count.min(spec.cap as u64);
    let mut printed = 0usize;

    for index in 0..wanted {
        let bytes = element_addr(spec.base, index, spec.stride)
            .and_then(|at| match mem.read(at, spec.stride) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    trace!(index, %err, "array element unreadable");
                    None
                }
            });

        let Some(bytes) = bytes else {
            if printed == 0 {
                out.raw(&addr(spec.base));
                return ArrayOutcome::Unreadable;
            }
            out.ellipsis();
            out.close();
            return ArrayOutcome::Aborted(printed);
        };

        if printed == 0 {
            out.open_array();
        }
        out.item();
        element(out, &bytes);
        printed += 1;
    }

    if printed == 0 {
        // cap of zero
        out.open_array();
    }

    if spec.count > wanted {
        out.ellipsis();
        out.close();
        return ArrayOutcome::Capped(printed);
    }

    out.close();
    ArrayOutcome::Complete(printed)
}

/// Little-endian scalar element printers.
pub mod elem {
    use crate::render::Render;

    fn word<const N: usize>(bytes: &[u8]) -> [u8; N] {
        let mut buf = [0u8; N];
        let n = bytes.len().min(N);
        buf[..n].copy_from_slice(&bytes[..n]);
        buf
    }

    pub fn u16(out: &mut Render, bytes: &[u8]) {
        out.raw(&u16::from_le_bytes(word(bytes)).to_string());
    }

    pub fn u32(out: &mut Render, bytes: &[u8]) {
        out.raw(&u32::from_le_bytes(word(bytes)).to_string());
    }

    /// Fourcc codes and masks.
    pub fn u32_hex(out: &mut Render, bytes: &[u8]) {
        out.raw(&crate::ioc::hex(u32::from_le_bytes(word(bytes)).into()));
    }

    pub fn i32(out: &mut Render, bytes: &[u8]) {
        out.raw(&i32::from_le_bytes(word(bytes)).to_string());
    }

    pub fn u64(out: &mut Render, bytes: &[u8]) {
        out.raw(&u64::from_le_bytes(word(bytes)).to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryImage;

    fn u32_image(base: u64, values: &[u32]) -> MemoryImage {
        let mut mem = MemoryImage::new();
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        mem.map(base, bytes);
        mem
    }

    fn run(mem: &MemoryImage, spec: ArraySpec) -> (String, ArrayOutcome) {
        let mut out = Render::new();
        let outcome = render_array(mem, &mut out, spec, elem::u32);
        (out.as_str().to_string(), outcome)
    }

    #[test]
    fn test_complete_array() {
        let mem = u32_image(0x1000, &[1, 2, 3]);
        let spec = ArraySpec { base: 0x1000, count: 3, stride: 4, cap: 32 };
        assert_eq!(run(&mem, spec), ("[1, 2, 3]".to_string(), ArrayOutcome::Complete(3)));
    }

    #[test]
    fn test_empty_and_null() {
        let mem = MemoryImage::new();
        let empty = ArraySpec { base: 0x1000, count: 0, stride: 4, cap: 32 };
        assert_eq!(run(&mem, empty).0, "[]");
        let null = ArraySpec { base: 0, count: 5, stride: 4, cap: 32 };
        assert_eq!(run(&mem, null), ("NULL".to_string(), ArrayOutcome::Null));
    }

    #[test]
    fn test_first_element_unreadable_prints_base() {
        let mem = MemoryImage::new();
        let spec = ArraySpec { base: 0xdead0000, count: 2, stride: 4, cap: 32 };
        assert_eq!(run(&mem, spec), ("0xdead0000".to_string(), ArrayOutcome::Unreadable));
    }

    #[test]
    fn test_later_element_unreadable_aborts() {
        let mem = u32_image(0x1000, &[7, 8]);
        let spec = ArraySpec { base: 0x1000, count: 4, stride: 4, cap: 32 };
        let (text, outcome) = run(&mem, spec);
        assert_eq!(text, "[7, 8, ...]");
        assert_eq!(outcome, ArrayOutcome::Aborted(2));
        // nothing is read after the failing element
        assert_eq!(mem.reads().len(), 3);
    }

    #[test]
    fn test_capped_array() {
        let mem = u32_image(0x1000, &[0; 64]);
        let spec = ArraySpec { base: 0x1000, count: 0xFFFF_FFFF, stride: 4, cap: 32 };
        let (text, outcome) = run(&mem, spec);
        assert_eq!(outcome, ArrayOutcome::Capped(32));
        assert!(text.ends_with(", ...]"));
        assert!(mem.bytes_requested() <= 32 * 4);
    }

    #[test]
    fn test_overflowing_base() {
        let mem = MemoryImage::new();
        let spec = ArraySpec { base: u64::MAX - 2, count: 3, stride: 4, cap: 32 };
        assert_eq!(run(&mem, spec).1, ArrayOutcome::Unreadable);
        assert!(mem.reads().is_empty());
    }

    #[test]
    fn test_zero_cap() {
        let mem = u32_image(0x1000, &[1]);
        let spec = ArraySpec { base: 0x1000, count: 1, stride: 4, cap: 0 };
        assert_eq!(run(&mem, spec), ("[...]".to_string(), ArrayOutcome::Capped(0)));
    }

    #[test]
    fn test_outcome_helpers() {
        assert_eq!(ArrayOutcome::Capped(4).printed(), 4);
        assert!(ArrayOutcome::Aborted(1).is_truncated());
        assert!(!ArrayOutcome::Complete(3).is_truncated());
        assert_eq!(ArrayOutcome::Null.printed(), 0);
    }
}
