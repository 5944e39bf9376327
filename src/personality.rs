//! Per-process ABI selection and record layout
//!
//! Each command payload is described once as a [`RecordDesc`] (field names
//! and C types). A [`Personality`] supplies word width and 64-bit member
//! alignment, and [`RecordLayout::compute`] turns the description into
//! concrete offsets the same way the C compiler for that ABI would.

use std::fmt;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use fnv::FnvHashMap;
use object::{Architecture, Object};

/// Binary ABI of an observed process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    X86_64,
    Aarch64,
    I386,
    X32,
    Unknown,
}

impl Abi {
    pub const ALL: [Abi; 5] = [Abi::X86_64, Abi::Aarch64, Abi::I386, Abi::X32, Abi::Unknown];

    pub fn from_architecture(arch: Architecture) -> Self {
        match arch {
            Architecture::X86_64 => Abi::X86_64,
            Architecture::X86_64_X32 => Abi::X32,
            Architecture::I386 => Abi::I386,
            Architecture::Aarch64 => Abi::Aarch64,
            _ => Abi::Unknown,
        }
    }

    /// Inspect the ELF header of an executable.
    pub fn from_elf(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open executable {}", path.display()))?;

        // SAFETY: the mapping is read-only and dropped before returning
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .with_context(|| format!("Failed to mmap {}", path.display()))?;

        let object = object::File::parse(&*mmap)
            .with_context(|| format!("Failed to parse ELF header of {}", path.display()))?;

        Ok(Self::from_architecture(object.architecture()))
    }

    /// ABI of a running process, read through `/proc/PID/exe`.
    pub fn of_process(pid: i32) -> Result<Self> {
        Self::from_elf(Path::new(&format!("/proc/{}/exe", pid)))
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Abi::X86_64 => "x86_64",
            Abi::Aarch64 => "aarch64",
            Abi::I386 => "i386",
            Abi::X32 => "x32",
            Abi::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Width parameters that decide a record's layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Personality {
    /// `long` and pointer width in bytes.
    pub word: usize,
    /// Alignment of `__u64` members inside structures.
    pub u64_align: usize,
}

impl Personality {
    pub const LP64: Personality = Personality { word: 8, u64_align: 8 };
    pub const ILP32: Personality = Personality { word: 4, u64_align: 4 };
    pub const X32: Personality = Personality { word: 4, u64_align: 8 };
}

/// C scalar types used in DRM records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8,
    U16,
    U32,
    I32,
    U64,
    I64,
    Long,
    ULong,
    Ptr,
}

impl Scalar {
    pub fn size(self, p: Personality) -> usize {
        match self {
            Scalar::U8 => 1,
            Scalar::U16 => 2,
            Scalar::U32 | Scalar::I32 => 4,
            Scalar::U64 | Scalar::I64 => 8,
            Scalar::Long | Scalar::ULong | Scalar::Ptr => p.word,
        }
    }

    pub fn align(self, p: Personality) -> usize {
        match self {
            Scalar::U64 | Scalar::I64 => p.u64_align,
            other => other.size(p),
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Scalar::I32 | Scalar::I64 | Scalar::Long)
    }
}

/// Type of one field in a generic record description
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Scalar(Scalar),
    Array(Scalar, usize),
    /// `char name[n]`
    Bytes(usize),
    Record(&'static RecordDesc),
    Records(&'static RecordDesc, usize),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn scalar(name: &'static str, ty: Scalar) -> Self {
        Self { name, kind: FieldKind::Scalar(ty) }
    }

    pub const fn u8(name: &'static str) -> Self {
        Self::scalar(name, Scalar::U8)
    }

    pub const fn u16(name: &'static str) -> Self {
        Self::scalar(name, Scalar::U16)
    }

    pub const fn u32(name: &'static str) -> Self {
        Self::scalar(name, Scalar::U32)
    }

    pub const fn i32(name: &'static str) -> Self {
        Self::scalar(name, Scalar::I32)
    }

    pub const fn u64(name: &'static str) -> Self {
        Self::scalar(name, Scalar::U64)
    }

    pub const fn i64(name: &'static str) -> Self {
        Self::scalar(name, Scalar::I64)
    }

    pub const fn long(name: &'static str) -> Self {
        Self::scalar(name, Scalar::Long)
    }

    pub const fn ulong(name: &'static str) -> Self {
        Self::scalar(name, Scalar::ULong)
    }

    pub const fn ptr(name: &'static str) -> Self {
        Self::scalar(name, Scalar::Ptr)
    }

    pub const fn array(name: &'static str, ty: Scalar, len: usize) -> Self {
        Self { name, kind: FieldKind::Array(ty, len) }
    }

    pub const fn bytes(name: &'static str, len: usize) -> Self {
        Self { name, kind: FieldKind::Bytes(len) }
    }

    pub const fn record(name: &'static str, desc: &'static RecordDesc) -> Self {
        Self { name, kind: FieldKind::Record(desc) }
    }

    pub const fn records(name: &'static str, desc: &'static RecordDesc, len: usize) -> Self {
        Self { name, kind: FieldKind::Records(desc, len) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Struct,
    Union,
}

/// ABI-independent description of a C record
#[derive(Debug)]
pub struct RecordDesc {
    pub name: &'static str,
    pub shape: Shape,
    pub fields: &'static [Field],
}

impl RecordDesc {
    pub const fn structure(name: &'static str, fields: &'static [Field]) -> Self {
        Self { name, shape: Shape::Struct, fields }
    }

    pub const fn union(name: &'static str, fields: &'static [Field]) -> Self {
        Self { name, shape: Shape::Union, fields }
    }

    /// Layout differs between LP64 and ILP32.
    pub fn is_width_sensitive(&self) -> bool {
        RecordLayout::compute(self, Personality::LP64)
            != RecordLayout::compute(self, Personality::ILP32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaidKind {
    Scalar(Scalar),
    Array { elem: Scalar, len: usize, stride: usize },
    Bytes(usize),
    Record(Box<RecordLayout>),
    Records { elem: Box<RecordLayout>, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
    pub kind: LaidKind,
}

/// Concrete field offsets of a record under one personality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
    pub fields: Vec<FieldLayout>,
}

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align.max(1)) * align.max(1)
}

impl RecordLayout {
    pub fn compute(desc: &RecordDesc, p: Personality) -> Self {
        let mut fields = Vec::with_capacity(desc.fields.len());
        let mut cursor = 0usize;
        let mut widest = 0usize;
        let mut align = 1usize;

        for field in desc.fields {
            let (size, field_align, kind) = match field.kind {
                FieldKind::Scalar(ty) => (ty.size(p), ty.align(p), LaidKind::Scalar(ty)),
                FieldKind::Array(ty, len) => {
                    let stride = ty.size(p);
                    (stride * len, ty.align(p), LaidKind::Array { elem: ty, len, stride })
                }
                FieldKind::Bytes(len) => (len, 1, LaidKind::Bytes(len)),
                FieldKind::Record(inner) => {
                    let inner = RecordLayout::compute(inner, p);
                    (inner.size, inner.align, LaidKind::Record(Box::new(inner)))
                }
                FieldKind::Records(inner, len) => {
                    let inner = RecordLayout::compute(inner, p);
                    (
                        inner.size * len,
                        inner.align,
                        LaidKind::Records { elem: Box::new(inner), len },
                    )
                }
            };

            let offset = match desc.shape {
                Shape::Struct => {
                    cursor = round_up(cursor, field_align);
                    let at = cursor;
                    cursor += size;
                    at
                }
                Shape::Union => {
                    widest = widest.max(size);
                    0
                }
            };
            align = align.max(field_align);
            fields.push(FieldLayout { name: field.name, offset, size, kind });
        }

        let raw = match desc.shape {
            Shape::Struct => cursor,
            Shape::Union => widest,
        };

        Self {
            name: desc.name,
            size: round_up(raw, align),
            align,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve a dotted path (`in.handle`) to an absolute offset.
    pub fn locate(&self, path: &str) -> Option<(usize, &FieldLayout)> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let field = self.field(head)?;
        match (rest, &field.kind) {
            (None, _) => Some((field.offset, field)),
            (Some(rest), LaidKind::Record(inner)) => inner
                .locate(rest)
                .map(|(offset, f)| (field.offset + offset, f)),
            _ => None,
        }
    }
}

/// Maps observed ABIs to the personality their records use
#[derive(Debug, Clone)]
pub struct PersonalityResolver {
    registered: FnvHashMap<Abi, Personality>,
}

impl Default for PersonalityResolver {
    fn default() -> Self {
        let mut resolver = Self::empty();
        resolver.register(Abi::X86_64, Personality::LP64);
        resolver.register(Abi::Aarch64, Personality::LP64);
        resolver.register(Abi::I386, Personality::ILP32);
        resolver.register(Abi::X32, Personality::X32);
        resolver
    }
}

impl PersonalityResolver {
    pub fn empty() -> Self {
        Self { registered: FnvHashMap::default() }
    }

    pub fn register(&mut self, abi: Abi, personality: Personality) {
        self.registered.insert(abi, personality);
    }

    pub fn personality(&self, abi: Abi) -> Option<Personality> {
        self.registered.get(&abi).copied()
    }

    /// Layout of `desc` for a process running `abi`.
    ///
    /// Records without width-sensitive members share one canonical layout
    /// and resolve for any ABI. Width-sensitive records resolve only for
    /// registered ABIs.
    pub fn layout_for(&self, abi: Abi, desc: &RecordDesc) -> Option<RecordLayout> {
        match self.personality(abi) {
            Some(p) => Some(RecordLayout::compute(desc, p)),
            None if !desc.is_width_sensitive() => {
                Some(RecordLayout::compute(desc, Personality::LP64))
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static PAIR: RecordDesc =
        RecordDesc::structure("pair", &[Field::u32("a"), Field::u64("b")]);

    static WITH_PTR: RecordDesc = RecordDesc::structure(
        "with_ptr",
        &[Field::i32("len"), Field::ptr("data"), Field::u32("tail")],
    );

    static INNER: RecordDesc = RecordDesc::structure("inner", &[Field::u32("x"), Field::u32("y")]);

    static NESTED: RecordDesc = RecordDesc::structure(
        "nested",
        &[Field::u32("tag"), Field::record("in", &INNER), Field::array("data", Scalar::U16, 3)],
    );

    static OVERLAY: RecordDesc = RecordDesc::union(
        "overlay",
        &[Field::record("in", &INNER), Field::u64("wide"), Field::bytes("name", 12)],
    );

    #[test]
    fn test_u64_alignment_per_personality() {
        let lp64 = RecordLayout::compute(&PAIR, Personality::LP64);
        assert_eq!(lp64.field("b").unwrap().offset, 8);
        assert_eq!(lp64.size, 16);

        let ilp32 = RecordLayout::compute(&PAIR, Personality::ILP32);
        assert_eq!(ilp32.field("b").unwrap().offset, 4);
        assert_eq!(ilp32.size, 12);

        let x32 = RecordLayout::compute(&PAIR, Personality::X32);
        assert_eq!(x32.size, 16);
    }

    #[test]
    fn test_pointer_width() {
        let lp64 = RecordLayout::compute(&WITH_PTR, Personality::LP64);
        assert_eq!(lp64.field("data").unwrap().offset, 8);
        assert_eq!(lp64.field("tail").unwrap().offset, 16);
        assert_eq!(lp64.size, 24);

        let ilp32 = RecordLayout::compute(&WITH_PTR, Personality::ILP32);
        assert_eq!(ilp32.field("data").unwrap().offset, 4);
        assert_eq!(ilp32.size, 12);
    }

    #[test]
    fn test_nested_path() {
        let layout = RecordLayout::compute(&NESTED, Personality::LP64);
        let (offset, field) = layout.locate("in.y").unwrap();
        assert_eq!(offset, 8);
        assert_eq!(field.size, 4);
        // 4 + 8 + 6 = 18, padded to 4-byte alignment
        assert_eq!(layout.size, 20);
        assert!(layout.locate("in.z").is_none());
        assert!(layout.locate("tag.x").is_none());
    }

    #[test]
    fn test_union_layout() {
        let layout = RecordLayout::compute(&OVERLAY, Personality::LP64);
        assert!(layout.fields.iter().all(|f| f.offset == 0));
        assert_eq!(layout.size, 16);
        assert_eq!(RecordLayout::compute(&OVERLAY, Personality::ILP32).size, 12);
    }

    #[test]
    fn test_width_sensitivity() {
        assert!(PAIR.is_width_sensitive());
        assert!(WITH_PTR.is_width_sensitive());
        assert!(!INNER.is_width_sensitive());
    }

    #[test]
    fn test_resolver_unknown_abi() {
        let resolver = PersonalityResolver::default();
        assert!(resolver.layout_for(Abi::Unknown, &WITH_PTR).is_none());
        assert_eq!(resolver.layout_for(Abi::Unknown, &INNER).unwrap().size, 8);
        assert_eq!(resolver.layout_for(Abi::I386, &WITH_PTR).unwrap().size, 12);
    }

    #[test]
    fn test_resolver_without_foreign_abi() {
        let mut resolver = PersonalityResolver::empty();
        resolver.register(Abi::X86_64, Personality::LP64);
        assert!(resolver.layout_for(Abi::I386, &PAIR).is_none());
        assert!(resolver.layout_for(Abi::X86_64, &PAIR).is_some());
    }

    #[test]
    fn test_architecture_mapping() {
        assert_eq!(Abi::from_architecture(Architecture::X86_64), Abi::X86_64);
        assert_eq!(Abi::from_architecture(Architecture::X86_64_X32), Abi::X32);
        assert_eq!(Abi::from_architecture(Architecture::I386), Abi::I386);
        assert_eq!(Abi::from_architecture(Architecture::Riscv64), Abi::Unknown);
    }

    #[test]
    fn test_current_executable_abi() {
        let exe = std::env::current_exe().unwrap();
        let abi = Abi::from_elf(&exe).unwrap();
        #[cfg(target_arch = "x86_64")]
        assert_eq!(abi, Abi::X86_64);
        #[cfg(target_arch = "aarch64")]
        assert_eq!(abi, Abi::Aarch64);
        let _ = abi;
    }

    #[test]
    fn test_missing_executable_is_error() {
        assert!(Abi::from_elf(Path::new("/nonexistent/binary")).is_err());
    }
}
