use bitflags::bitflags;

use crate::{
    disk::{types::MAX_BLOCK_COUNT, Lba, BLOCK_SIZE},
    msc::{
        adapter::AdapterState,
        error::{MscError, Result},
        identity::Identity,
    },
};

bitflags! {
    /// 告知主机的介质状态
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MediaFlags: u8 {
        const MEDIA_PRESENT = 1 << 0;
        const WRITABLE = 1 << 1;
    }
}

/// 注册时一次性提交给主机 USB 栈的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub identity: Identity,
    pub block_count: u64,
    pub block_size: u32,
    pub flags: MediaFlags,
}

impl Registration {
    pub fn new(identity: Identity, block_count: u64, flags: MediaFlags) -> Result<Self> {
        if block_count > MAX_BLOCK_COUNT {
            return Err(MscError::CapacityOverflow(block_count));
        }
        Ok(Self {
            identity,
            block_count,
            block_size: BLOCK_SIZE as u32,
            flags,
        })
    }

    pub fn media_present(&self) -> bool {
        self.flags.contains(MediaFlags::MEDIA_PRESENT)
    }

    pub fn writable(&self) -> bool {
        self.flags.contains(MediaFlags::WRITABLE)
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.block_count * self.block_size as u64
    }
}

/// 主机 USB 栈回调的块设备
///
/// 回调在主机的处理上下文中同步执行，主机阻塞等待返回值；
/// 返回 0 表示没有数据（读）或拒绝（写）。
pub trait MscHandler {
    fn on_read(&self, lba: Lba, offset: u32, buf: &mut [u8]) -> usize;
    fn on_write(&self, lba: Lba, offset: u32, buf: &[u8]) -> usize;
    fn state(&self) -> AdapterState;
}

/// 主机 USB 栈：接受一次注册，之后负责描述符、端点调度和 SCSI 解析
pub trait MscHost<'a> {
    fn begin(&mut self, registration: Registration, handler: Box<dyn MscHandler + 'a>)
        -> Result<()>;
}
