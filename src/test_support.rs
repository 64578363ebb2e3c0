//! 测试辅助：临时目录与带图案的镜像文件

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::utils::generate_uuid;

/// 位于系统临时目录下的唯一目录，drop 时删除
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

pub fn scratch_dir() -> ScratchDir {
    let path = std::env::temp_dir().join(format!("sd-msc-{}", generate_uuid()));
    fs::create_dir_all(&path).unwrap();
    ScratchDir { path }
}

/// 第 i 个字节的内容，保证相邻扇区内容不同
pub fn pattern_byte(i: u64) -> u8 {
    ((i % 251) ^ (i / 512)) as u8
}

pub fn pattern(len: u64) -> Vec<u8> {
    (0..len).map(pattern_byte).collect()
}

/// 在 `root` 下写入长度为 `len` 的图案镜像，返回其内容
pub fn write_image(root: &Path, name: &str, len: u64) -> Vec<u8> {
    let bytes = pattern(len);
    fs::write(root.join(name.trim_start_matches('/')), &bytes).unwrap();
    bytes
}
