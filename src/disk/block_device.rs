use crate::disk::types::Lba;

/// 以固定 512 字节块寻址的只读介质
///
/// 所有方法都以 `&self` 调用，可在主机的任意回调上下文中使用。
pub trait BlockDevice {
    /// 从 `lba` 块内 `offset` 处读取至多 `buf.len()` 字节，返回实际读到的字节数
    fn read(&self, lba: Lba, offset: u32, buf: &mut [u8]) -> usize;
    /// 返回被接受的字节数
    fn write(&self, lba: Lba, offset: u32, buf: &[u8]) -> usize;
    fn capacity_blocks(&self) -> u64;
}
