use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use log::{debug, info, trace, warn};

use crate::disk::{
    block_device::BlockDevice,
    mount::MountedVolume,
    types::{blocks_for_len, byte_offset, Lba, BLOCK_SIZE},
    DiskError, Result,
};

/// 把卡上的一个镜像文件映射成 512 字节块序列
///
/// 文件句柄不跨请求持有：每次读取都重新打开、定位、读取、关闭，
/// 并发访问的串行化交给文件系统层。
#[derive(Debug)]
pub struct VirtualDisk {
    backing_path: PathBuf,
    block_count: u64,
}

impl VirtualDisk {
    /// 挂载后调用一次，容量在此时确定，会话期间不再重算
    pub fn open(volume: &MountedVolume, card_path: &str) -> Result<Self> {
        let backing_path = volume.resolve(card_path);
        let meta = std::fs::metadata(&backing_path).map_err(|source| DiskError::BackingFile {
            path: backing_path.clone(),
            source,
        })?;
        if !meta.is_file() {
            return Err(DiskError::BackingFile {
                path: backing_path,
                source: std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        let block_count = blocks_for_len(meta.len());
        let trailing = meta.len() % BLOCK_SIZE as u64;
        if trailing != 0 {
            warn!(
                "{}: {} trailing bytes beyond the last full block are not exported",
                backing_path.display(),
                trailing
            );
        }
        info!(
            "virtual disk {}: {} blocks x {} bytes",
            backing_path.display(),
            block_count,
            BLOCK_SIZE
        );

        Ok(Self {
            backing_path,
            block_count,
        })
    }

    pub fn backing_path(&self) -> &Path {
        &self.backing_path
    }

    /// 对主机可见的字节数（整块）
    pub fn exported_bytes(&self) -> u64 {
        self.block_count * BLOCK_SIZE as u64
    }
}

impl BlockDevice for VirtualDisk {
    fn read(&self, lba: Lba, offset: u32, buf: &mut [u8]) -> usize {
        let Some(start) = byte_offset(lba, offset) else {
            return 0;
        };
        let end = self.exported_bytes();
        if start >= end {
            debug!("read past end: lba={} offset={}", lba, offset);
            return 0;
        }
        let len = (end - start).min(buf.len() as u64) as usize;

        let mut file = match File::open(&self.backing_path) {
            Ok(f) => f,
            Err(e) => {
                warn!("open {} failed: {}", self.backing_path.display(), e);
                return 0;
            }
        };
        if let Err(e) = file.seek(SeekFrom::Start(start)) {
            warn!("seek to {} failed: {}", start, e);
            return 0;
        }

        let n = read_up_to(&mut file, &mut buf[..len]);
        trace!("read lba={} offset={} len={} -> {}", lba, offset, buf.len(), n);
        n
    }

    fn write(&self, lba: Lba, offset: u32, buf: &[u8]) -> usize {
        debug!(
            "write rejected (read-only): lba={} offset={} len={}",
            lba,
            offset,
            buf.len()
        );
        0
    }

    fn capacity_blocks(&self) -> u64 {
        self.block_count
    }
}

/// 读到缓冲区满或 EOF 为止；中途出错时返回已读字节数
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("short read after {} bytes: {}", filled, e);
                break;
            }
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        disk::mount::SdCard,
        test_support::{scratch_dir, write_image, ScratchDir},
    };

    const MIB: u64 = 1_048_576;

    fn mount(dir: &ScratchDir) -> MountedVolume {
        let config = Config {
            card_root: dir.path().to_path_buf(),
            power_settle_ms: 0,
            ..Config::default()
        };
        let mut card = SdCard::new(&config);
        card.power_on();
        card.mount().unwrap()
    }

    #[test]
    fn one_mebibyte_image() {
        let dir = scratch_dir();
        let image = write_image(dir.path(), "usb.img", MIB);
        let disk = VirtualDisk::open(&mount(&dir), "/usb.img").unwrap();
        assert_eq!(disk.capacity_blocks(), 2048);

        let mut buf = [0u8; BLOCK_SIZE];
        assert_eq!(disk.read(0, 0, &mut buf), 512);
        assert_eq!(&buf[..], &image[..512]);

        assert_eq!(disk.read(2047, 0, &mut buf), 512);
        assert_eq!(&buf[..], &image[1_048_064..1_048_576]);

        assert_eq!(disk.read(2046, 0, &mut buf), 512);
        assert_eq!(&buf[..], &image[1_047_552..1_048_064]);

        assert_eq!(disk.read(2048, 0, &mut buf), 0);
    }

    #[test]
    fn trailing_partial_block_is_not_exported() {
        let dir = scratch_dir();
        let image = write_image(dir.path(), "usb.img", 512 * 4 + 100);
        let disk = VirtualDisk::open(&mount(&dir), "/usb.img").unwrap();
        assert_eq!(disk.capacity_blocks(), 4);

        let mut buf = [0u8; 1024];
        assert_eq!(disk.read(3, 0, &mut buf), 512);
        assert_eq!(&buf[..512], &image[1536..2048]);
        assert_eq!(disk.read(4, 0, &mut buf), 0);
    }

    #[test]
    fn offsets_within_block() {
        let dir = scratch_dir();
        let image = write_image(dir.path(), "usb.img", 512 * 8);
        let disk = VirtualDisk::open(&mount(&dir), "/usb.img").unwrap();

        for offset in [0u32, 1, 255, 511] {
            let mut buf = [0u8; 64];
            let n = disk.read(5, offset, &mut buf);
            let start = 5 * 512 + offset as usize;
            assert_eq!(n, 64);
            assert_eq!(&buf[..n], &image[start..start + 64]);
        }
    }

    #[test]
    fn never_reads_past_exported_range() {
        let dir = scratch_dir();
        let image = write_image(dir.path(), "usb.img", 512 * 8);
        let disk = VirtualDisk::open(&mount(&dir), "/usb.img").unwrap();

        let mut buf = vec![0xAAu8; 4096];
        let n = disk.read(7, 100, &mut buf);
        assert_eq!(n, 412);
        assert_eq!(&buf[..n], &image[7 * 512 + 100..]);
        assert!(buf[n..].iter().all(|&b| b == 0xAA));

        let mut buf = [0u8; 16];
        assert_eq!(disk.read(u32::MAX, u32::MAX, &mut buf), 0);
    }

    #[test]
    fn empty_buffer_reads_nothing() {
        let dir = scratch_dir();
        write_image(dir.path(), "usb.img", 512);
        let disk = VirtualDisk::open(&mount(&dir), "/usb.img").unwrap();
        assert_eq!(disk.read(0, 0, &mut []), 0);
    }

    #[test]
    fn backing_file_removed_after_open() {
        let dir = scratch_dir();
        write_image(dir.path(), "usb.img", 512 * 16);
        let disk = VirtualDisk::open(&mount(&dir), "/usb.img").unwrap();
        std::fs::remove_file(disk.backing_path()).unwrap();

        let mut buf = [0u8; BLOCK_SIZE];
        for lba in 0..16 {
            assert_eq!(disk.read(lba, 0, &mut buf), 0);
        }
        assert_eq!(disk.capacity_blocks(), 16);
    }

    #[test]
    fn write_is_rejected_and_file_unchanged() {
        let dir = scratch_dir();
        let image = write_image(dir.path(), "usb.img", 512 * 8);
        let disk = VirtualDisk::open(&mount(&dir), "/usb.img").unwrap();

        assert_eq!(disk.write(5, 0, &[0x55; 512]), 0);
        assert_eq!(disk.write(100, 3, &[]), 0);

        let after = std::fs::read(disk.backing_path()).unwrap();
        assert_eq!(after, image);
    }

    #[test]
    fn missing_backing_file_fails_open() {
        let dir = scratch_dir();
        let err = VirtualDisk::open(&mount(&dir), "/usb.img").unwrap_err();
        assert!(matches!(err, DiskError::BackingFile { .. }));
    }

    #[test]
    fn directory_is_not_a_backing_file() {
        let dir = scratch_dir();
        std::fs::create_dir(dir.path().join("usb.img")).unwrap();
        assert!(VirtualDisk::open(&mount(&dir), "/usb.img").is_err());
    }
}
