use std::fmt;

use crate::disk::Lba;

/// MSC 注册与主机传输错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MscError {
    InvalidIdentity {
        field: &'static str,
        reason: String,
    },
    CapacityOverflow(u64), // 块数超出 32 位 LBA
    AlreadyRegistered,
    NotRegistered,
    OutOfRange {
        lba: Lba,
        count: u32,
        capacity: u64,
    },
    ShortTransfer {
        lba: Lba,
        expected: usize,
        got: usize,
    },
    TransferTooLarge {
        len: usize,
        max: usize,
    },
}

impl fmt::Display for MscError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdentity { field, reason } => {
                write!(f, "Invalid USB {}: {}", field, reason)
            }
            Self::CapacityOverflow(blocks) => {
                write!(f, "{} blocks exceed the 32-bit LBA range", blocks)
            }
            Self::AlreadyRegistered => write!(f, "A block device is already registered"),
            Self::NotRegistered => write!(f, "No block device registered"),
            Self::OutOfRange {
                lba,
                count,
                capacity,
            } => write!(
                f,
                "Blocks {}..{} out of range (capacity {} blocks)",
                lba,
                *lba as u64 + *count as u64,
                capacity
            ),
            Self::ShortTransfer { lba, expected, got } => write!(
                f,
                "Short transfer at LBA {}: {} of {} bytes",
                lba, got, expected
            ),
            Self::TransferTooLarge { len, max } => {
                write!(f, "Transfer of {} bytes exceeds {} bytes", len, max)
            }
        }
    }
}

impl std::error::Error for MscError {}

pub type Result<T> = std::result::Result<T, MscError>;
