//! Syscall numbers the tracer reacts to
//!
//! Only `ioctl(2)` is decoded. The descriptor-lifetime calls are tracked so
//! the driver identity cache never outlives the descriptor it describes.

use crate::personality::Abi;

/// Syscalls the tracer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    Ioctl,
    Close,
    Dup2,
    Dup3,
    CloseRange,
    Execve,
    Other(u64),
}

/// Native x86_64 numbering
fn x86_64(num: u64) -> Syscall {
    match num {
        3 => Syscall::Close,
        16 => Syscall::Ioctl,
        33 => Syscall::Dup2,
        59 | 322 => Syscall::Execve,
        292 => Syscall::Dup3,
        436 => Syscall::CloseRange,
        other => Syscall::Other(other),
    }
}

/// i386 numbering, also used by compat tasks on x86_64
fn i386(num: u64) -> Syscall {
    match num {
        6 => Syscall::Close,
        11 | 358 => Syscall::Execve,
        54 => Syscall::Ioctl,
        63 => Syscall::Dup2,
        330 => Syscall::Dup3,
        436 => Syscall::CloseRange,
        other => Syscall::Other(other),
    }
}

/// Classify `num` under the tracee's syscall table.
pub fn classify(abi: Abi, num: u64) -> Syscall {
    match abi {
        Abi::I386 => i386(num),
        // x32 tasks share the native table with bit 30 set
        Abi::X32 => x86_64(num & !X32_SYSCALL_BIT),
        _ => x86_64(num),
    }
}

pub const X32_SYSCALL_BIT: u64 = 0x4000_0000;

/// Display name for debug logs.
pub fn syscall_name(call: Syscall) -> String {
    match call {
        Syscall::Ioctl => "ioctl".to_string(),
        Syscall::Close => "close".to_string(),
        Syscall::Dup2 => "dup2".to_string(),
        Syscall::Dup3 => "dup3".to_string(),
        Syscall::CloseRange => "close_range".to_string(),
        Syscall::Execve => "execve".to_string(),
        Syscall::Other(num) => format!("syscall_{}", num),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_numbers() {
        assert_eq!(classify(Abi::X86_64, 16), Syscall::Ioctl);
        assert_eq!(classify(Abi::X86_64, 3), Syscall::Close);
        assert_eq!(classify(Abi::X86_64, 292), Syscall::Dup3);
        assert_eq!(classify(Abi::X86_64, 0), Syscall::Other(0));
    }

    #[test]
    fn test_compat_numbers() {
        assert_eq!(classify(Abi::I386, 54), Syscall::Ioctl);
        assert_eq!(classify(Abi::I386, 6), Syscall::Close);
        // 16 is lchown on i386
        assert_eq!(classify(Abi::I386, 16), Syscall::Other(16));
    }

    #[test]
    fn test_x32_bit_stripped() {
        assert_eq!(classify(Abi::X32, X32_SYSCALL_BIT | 16), Syscall::Ioctl);
    }

    #[test]
    fn test_names() {
        assert_eq!(syscall_name(Syscall::CloseRange), "close_range");
        assert_eq!(syscall_name(Syscall::Other(999)), "syscall_999");
    }
}
