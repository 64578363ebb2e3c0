pub mod block_device;
pub mod error;
pub mod mount;
pub mod types;
pub mod virtual_disk;

pub use block_device::BlockDevice;
pub use error::{DiskError, Result};
pub use mount::SdCard;
pub use types::{Lba, BLOCK_SIZE};
pub use virtual_disk::VirtualDisk;
