use log::{debug, error, info};

use crate::{
    disk::{BlockDevice, Lba},
    msc::{
        error::Result,
        host::{MediaFlags, MscHandler, MscHost, Registration},
        identity::Identity,
    },
};

/// 适配器生命周期：启动时注册一次，之后一直处于 Active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Unregistered,
    Active,
}

/// MSC 回调面：把主机的块请求转给磁盘，写请求一律拒绝
///
/// 只借用磁盘，不拥有镜像文件。
#[derive(Debug)]
pub struct BlockDeviceAdapter<'d, D: BlockDevice> {
    disk: &'d D,
    identity: Identity,
    state: AdapterState,
}

impl<'d, D: BlockDevice> BlockDeviceAdapter<'d, D> {
    pub fn new(disk: &'d D, identity: Identity) -> Self {
        Self {
            disk,
            identity,
            state: AdapterState::Unregistered,
        }
    }

    /// 介质始终在位且只读
    pub fn flags(&self) -> MediaFlags {
        MediaFlags::MEDIA_PRESENT
    }

    pub fn registration(&self) -> Result<Registration> {
        Registration::new(
            self.identity.clone(),
            self.disk.capacity_blocks(),
            self.flags(),
        )
    }

    /// 向主机栈注册并交出自身，Unregistered -> Active 只发生这一次
    pub fn register<H: MscHost<'d>>(mut self, host: &mut H) -> Result<()>
    where
        D: 'd,
    {
        let registration = self.registration()?;
        self.state = AdapterState::Active;
        let (blocks, vendor, product) = (
            registration.block_count,
            self.identity.vendor_id().to_string(),
            self.identity.product_id().to_string(),
        );
        match host.begin(registration, Box::new(self)) {
            Ok(()) => {
                info!(
                    "USB MSC ready: {} {} ({} blocks, read-only)",
                    vendor, product, blocks
                );
                Ok(())
            }
            Err(e) => {
                error!("host refused registration: {}", e);
                Err(e)
            }
        }
    }

    pub fn on_read_request(&self, lba: Lba, offset: u32, buf: &mut [u8]) -> usize {
        if lba as u64 >= self.disk.capacity_blocks() {
            debug!(
                "read beyond capacity: lba={} (capacity {})",
                lba,
                self.disk.capacity_blocks()
            );
            return 0;
        }
        self.disk.read(lba, offset, buf)
    }

    /// 0 表示主机写入的字节一个也没被接受
    pub fn on_write_request(&self, lba: Lba, offset: u32, buf: &[u8]) -> usize {
        debug!(
            "write request rejected: lba={} offset={} len={}",
            lba,
            offset,
            buf.len()
        );
        0
    }
}

impl<'d, D: BlockDevice> MscHandler for BlockDeviceAdapter<'d, D> {
    fn on_read(&self, lba: Lba, offset: u32, buf: &mut [u8]) -> usize {
        self.on_read_request(lba, offset, buf)
    }

    fn on_write(&self, lba: Lba, offset: u32, buf: &[u8]) -> usize {
        self.on_write_request(lba, offset, buf)
    }

    fn state(&self) -> AdapterState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{
        disk::BLOCK_SIZE,
        msc::{error::MscError, loopback::LoopbackHost},
        test_support::pattern,
    };

    /// 内存块设备，记录写调用次数
    struct MemDisk {
        bytes: Vec<u8>,
        writes: Cell<usize>,
    }

    impl MemDisk {
        fn new(blocks: u64) -> Self {
            Self {
                bytes: pattern(blocks * BLOCK_SIZE as u64),
                writes: Cell::new(0),
            }
        }
    }

    impl BlockDevice for MemDisk {
        fn read(&self, lba: Lba, offset: u32, buf: &mut [u8]) -> usize {
            let start = lba as usize * BLOCK_SIZE + offset as usize;
            if start >= self.bytes.len() {
                return 0;
            }
            let n = buf.len().min(self.bytes.len() - start);
            buf[..n].copy_from_slice(&self.bytes[start..start + n]);
            n
        }

        fn write(&self, _lba: Lba, _offset: u32, _buf: &[u8]) -> usize {
            self.writes.set(self.writes.get() + 1);
            0
        }

        fn capacity_blocks(&self) -> u64 {
            (self.bytes.len() / BLOCK_SIZE) as u64
        }
    }

    fn identity() -> Identity {
        Identity::new("ESP32", "SDCardMSC", "1.0").unwrap()
    }

    #[test]
    fn registration_parameters() {
        let disk = MemDisk::new(2048);
        let adapter = BlockDeviceAdapter::new(&disk, identity());
        assert_eq!(adapter.state(), AdapterState::Unregistered);

        let reg = adapter.registration().unwrap();
        assert_eq!(reg.identity, identity());
        assert_eq!(reg.block_count, 2048);
        assert_eq!(reg.block_size, 512);
        assert!(reg.media_present());
        assert!(!reg.writable());
    }

    #[test]
    fn read_delegates_to_disk() {
        let disk = MemDisk::new(4);
        let adapter = BlockDeviceAdapter::new(&disk, identity());

        let mut buf = [0u8; BLOCK_SIZE];
        assert_eq!(adapter.on_read_request(2, 0, &mut buf), 512);
        assert_eq!(&buf[..], &disk.bytes[1024..1536]);

        let mut buf = [0u8; 10];
        assert_eq!(adapter.on_read_request(3, 500, &mut buf), 10);
        assert_eq!(&buf[..], &disk.bytes[2036..2046]);
    }

    #[test]
    fn read_beyond_capacity_returns_zero() {
        let disk = MemDisk::new(4);
        let adapter = BlockDeviceAdapter::new(&disk, identity());
        let mut buf = [0xEEu8; BLOCK_SIZE];
        assert_eq!(adapter.on_read_request(4, 0, &mut buf), 0);
        assert_eq!(adapter.on_read_request(u32::MAX, 0, &mut buf), 0);
        assert!(buf.iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn writes_never_reach_the_disk() {
        let disk = MemDisk::new(8);
        let adapter = BlockDeviceAdapter::new(&disk, identity());
        assert_eq!(adapter.on_write_request(5, 0, &[0u8; 512]), 0);
        assert_eq!(adapter.on_write_request(0, 7, &[1, 2, 3]), 0);
        assert_eq!(adapter.on_write_request(99, 0, &[]), 0);
        assert_eq!(disk.writes.get(), 0);
    }

    #[test]
    fn register_activates_once() {
        let disk = MemDisk::new(8);
        let mut host = LoopbackHost::new();

        BlockDeviceAdapter::new(&disk, identity())
            .register(&mut host)
            .unwrap();
        assert_eq!(host.state(), Some(AdapterState::Active));
        assert_eq!(host.registration().unwrap().block_count, 8);

        let second = BlockDeviceAdapter::new(&disk, identity()).register(&mut host);
        assert_eq!(second, Err(MscError::AlreadyRegistered));
    }

    #[test]
    fn oversized_disk_is_not_registered() {
        struct HugeDisk;
        impl BlockDevice for HugeDisk {
            fn read(&self, _: Lba, _: u32, _: &mut [u8]) -> usize {
                0
            }
            fn write(&self, _: Lba, _: u32, _: &[u8]) -> usize {
                0
            }
            fn capacity_blocks(&self) -> u64 {
                u32::MAX as u64 + 1
            }
        }

        let mut host = LoopbackHost::new();
        let result = BlockDeviceAdapter::new(&HugeDisk, identity()).register(&mut host);
        assert!(matches!(result, Err(MscError::CapacityOverflow(_))));
        assert_eq!(host.state(), None);
    }
}
