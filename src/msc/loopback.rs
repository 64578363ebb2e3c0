use log::{debug, info};

use crate::{
    disk::{types::Block, Lba, BLOCK_SIZE},
    msc::{
        adapter::AdapterState,
        error::{MscError, Result},
        host::{MscHandler, MscHost, Registration},
    },
};

/// 单次原始回调的最大传输长度
pub const MAX_RAW_TRANSFER: usize = 64 * 1024;

struct Session<'a> {
    registration: Registration,
    handler: Box<dyn MscHandler + 'a>,
}

/// 进程内的主机 USB 栈
///
/// 按块发起回调，传输缓冲区归主机所有，只在一次回调期间借给设备。
#[derive(Default)]
pub struct LoopbackHost<'a> {
    session: Option<Session<'a>>,
}

impl<'a> LoopbackHost<'a> {
    pub fn new() -> Self {
        Self { session: None }
    }

    fn session(&self) -> Result<&Session<'a>> {
        self.session.as_ref().ok_or(MscError::NotRegistered)
    }

    pub fn registration(&self) -> Result<&Registration> {
        Ok(&self.session()?.registration)
    }

    pub fn state(&self) -> Option<AdapterState> {
        self.session.as_ref().map(|s| s.handler.state())
    }

    pub fn media_present(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| s.registration.media_present())
    }

    /// READ CAPACITY 的结果：(块数, 块大小)
    pub fn capacity(&self) -> Result<(u64, u32)> {
        let reg = self.registration()?;
        Ok((reg.block_count, reg.block_size))
    }

    fn check_range(&self, lba: Lba, count: u32) -> Result<&Session<'a>> {
        let session = self.session()?;
        let capacity = session.registration.block_count;
        if lba as u64 + count as u64 > capacity {
            return Err(MscError::OutOfRange {
                lba,
                count,
                capacity,
            });
        }
        Ok(session)
    }

    /// 读取 `count` 个整块，每块一次回调；遇到不足一块的传输即停止
    pub fn read_blocks(&self, lba: Lba, count: u32) -> Result<Vec<u8>> {
        let session = self.check_range(lba, count)?;
        let mut data = Vec::with_capacity(count as usize * BLOCK_SIZE);
        let mut transfer: Block = [0u8; BLOCK_SIZE];

        for block in lba..lba + count {
            let n = session.handler.on_read(block, 0, &mut transfer);
            if n < BLOCK_SIZE {
                debug!("short read at lba {}: {} bytes", block, n);
                return Err(MscError::ShortTransfer {
                    lba: block,
                    expected: BLOCK_SIZE,
                    got: n,
                });
            }
            data.extend_from_slice(&transfer);
        }
        Ok(data)
    }

    /// 不经过主机侧范围检查，直接发起一次原始读回调
    pub fn read_raw(&self, lba: Lba, offset: u32, len: usize) -> Result<Vec<u8>> {
        let session = self.session()?;
        if len > MAX_RAW_TRANSFER {
            return Err(MscError::TransferTooLarge {
                len,
                max: MAX_RAW_TRANSFER,
            });
        }
        let mut buf = vec![0u8; len];
        let n = session.handler.on_read(lba, offset, &mut buf);
        buf.truncate(n);
        Ok(buf)
    }

    /// 按块下发写请求，返回设备接受的总字节数；第一次被拒绝即停止
    pub fn write_blocks(&self, lba: Lba, data: &[u8]) -> Result<usize> {
        let count = data.len().div_ceil(BLOCK_SIZE) as u32;
        let session = self.check_range(lba, count)?;

        let mut accepted = 0;
        for (i, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
            let n = session.handler.on_write(lba + i as u32, 0, chunk);
            accepted += n;
            if n < chunk.len() {
                debug!("write at lba {} accepted {} bytes", lba + i as u32, n);
                break;
            }
        }
        Ok(accepted)
    }
}

impl<'a> MscHost<'a> for LoopbackHost<'a> {
    fn begin(
        &mut self,
        registration: Registration,
        handler: Box<dyn MscHandler + 'a>,
    ) -> Result<()> {
        if self.session.is_some() {
            return Err(MscError::AlreadyRegistered);
        }
        info!(
            "host: {} {} rev {} attached, {} x {} bytes",
            registration.identity.vendor_id(),
            registration.identity.product_id(),
            registration.identity.product_revision(),
            registration.block_count,
            registration.block_size
        );
        self.session = Some(Session {
            registration,
            handler,
        });
        Ok(())
    }
}
