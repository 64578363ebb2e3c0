/// 每个逻辑块（扇区）的大小：512 字节
/// 主机侧 MSC 协议协商的块大小，整个会话期间不变。
pub const BLOCK_SIZE: usize = 512;

/// 主机 READ CAPACITY(10) 能表示的最大块数（32 位 LBA）
pub const MAX_BLOCK_COUNT: u64 = u32::MAX as u64;

/// 主机下发的逻辑块地址
pub type Lba = u32;

/// 一个完整扇区
pub type Block = [u8; BLOCK_SIZE];

/// 计算 `lba * BLOCK_SIZE + offset`，溢出时返回 None
pub fn byte_offset(lba: Lba, offset: u32) -> Option<u64> {
    (lba as u64)
        .checked_mul(BLOCK_SIZE as u64)?
        .checked_add(offset as u64)
}

/// 文件字节数换算成可寻址块数，尾部不足一块的字节不计入容量
pub fn blocks_for_len(len: u64) -> u64 {
    len / BLOCK_SIZE as u64
}
