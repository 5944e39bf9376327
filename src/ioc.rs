//! ioctl request number layout (asm-generic `_IOC` encoding)
//!
//! ```text
//!  31  30 29                 16 15          8 7            0
//! +------+---------------------+-------------+--------------+
//! | dir  |        size         |    type     |      nr      |
//! +------+---------------------+-------------+--------------+
//! ```

use std::fmt;

pub const NR_BITS: u32 = 8;
pub const TYPE_BITS: u32 = 8;
pub const SIZE_BITS: u32 = 14;
pub const DIR_BITS: u32 = 2;

pub const NR_SHIFT: u32 = 0;
pub const TYPE_SHIFT: u32 = NR_SHIFT + NR_BITS;
pub const SIZE_SHIFT: u32 = TYPE_SHIFT + TYPE_BITS;
pub const DIR_SHIFT: u32 = SIZE_SHIFT + SIZE_BITS;

pub const SIZE_MASK: u32 = (1 << SIZE_BITS) - 1;

/// Family tag of every DRM request.
pub const DRM_TYPE: u8 = b'd';

/// First command number reserved for driver-private requests.
pub const DRM_COMMAND_BASE: u8 = 0x40;
/// One past the last driver-private command number.
pub const DRM_COMMAND_END: u8 = 0xA0;

/// Data transfer direction as seen from user space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    None,
    Write,
    Read,
    ReadWrite,
}

impl Direction {
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Direction::None,
            1 => Direction::Write,
            2 => Direction::Read,
            _ => Direction::ReadWrite,
        }
    }

    pub const fn bits(self) -> u32 {
        match self {
            Direction::None => 0,
            Direction::Write => 1,
            Direction::Read => 2,
            Direction::ReadWrite => 3,
        }
    }

    /// Kernel copies the record back to user space.
    pub const fn writes_back(self) -> bool {
        matches!(self, Direction::Read | Direction::ReadWrite)
    }

    /// `_IOC_*` spelling used by the generic request formatter.
    fn ioc_name(self) -> &'static str {
        match self {
            Direction::None => "_IOC_NONE",
            Direction::Write => "_IOC_WRITE",
            Direction::Read => "_IOC_READ",
            Direction::ReadWrite => "_IOC_READ|_IOC_WRITE",
        }
    }

    fn drm_macro(self) -> &'static str {
        match self {
            Direction::None => "DRM_IO",
            Direction::Write => "DRM_IOW",
            Direction::Read => "DRM_IOR",
            Direction::ReadWrite => "DRM_IOWR",
        }
    }
}

/// A raw ioctl request number
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode(pub u32);

impl Opcode {
    pub const fn new(dir: Direction, ty: u8, nr: u8, size: usize) -> Self {
        Opcode(
            (dir.bits() << DIR_SHIFT)
                | (((size as u32) & SIZE_MASK) << SIZE_SHIFT)
                | ((ty as u32) << TYPE_SHIFT)
                | ((nr as u32) << NR_SHIFT),
        )
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn direction(self) -> Direction {
        Direction::from_bits(self.0 >> DIR_SHIFT)
    }

    pub const fn ty(self) -> u8 {
        (self.0 >> TYPE_SHIFT) as u8
    }

    pub const fn nr(self) -> u8 {
        (self.0 >> NR_SHIFT) as u8
    }

    /// Payload width encoded in the request number.
    pub const fn size(self) -> usize {
        ((self.0 >> SIZE_SHIFT) & SIZE_MASK) as usize
    }

    pub const fn is_drm(self) -> bool {
        self.ty() == DRM_TYPE
    }

    /// DRM request in the driver-private numeric range.
    pub const fn is_vendor(self) -> bool {
        self.is_drm() && self.nr() >= DRM_COMMAND_BASE && self.nr() < DRM_COMMAND_END
    }

    /// Key used for lookups that ignore the encoded size.
    pub const fn nr_key(self) -> (Direction, u8, u8) {
        (self.direction(), self.ty(), self.nr())
    }

    /// `_IOC(dir, type, nr, size)`, used when no name is known.
    pub fn generic_name(self) -> String {
        format!(
            "_IOC({}, {}, {}, {})",
            self.direction().ioc_name(),
            hex(self.ty() as u64),
            hex(self.nr() as u64),
            hex(self.size() as u64)
        )
    }

    /// Rendering for a request matched by command number only, where the
    /// encoded size differs from the known record.
    pub fn drifted_name(self, name: &str) -> String {
        let dir = self.direction();
        if dir == Direction::None {
            format!("{}({}) /* {} */", dir.drm_macro(), hex(self.nr() as u64), name)
        } else {
            format!(
                "{}({}, {}) /* {} */",
                dir.drm_macro(),
                hex(self.nr() as u64),
                hex(self.size() as u64),
                name
            )
        }
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opcode({:#010x})", self.0)
    }
}

impl From<u32> for Opcode {
    fn from(raw: u32) -> Self {
        Opcode(raw)
    }
}

/// `%#x` formatting: zero prints as a bare `0`.
pub fn hex(value: u64) -> String {
    if value == 0 {
        "0".to_string()
    } else {
        format!("{:#x}", value)
    }
}

/// Pointer formatting: zero prints as `NULL`.
pub fn addr(value: u64) -> String {
    if value == 0 {
        "NULL".to_string()
    } else {
        format!("{:#x}", value)
    }
}
