use std::{fmt, path::PathBuf};

/// 磁盘层错误类型
#[derive(Debug)]
pub enum DiskError {
    Mount(PathBuf),        // SD 卡挂载失败，带挂载点
    InvalidConfig(String), // 启动配置非法
    BackingFile {
        path: PathBuf,
        source: std::io::Error,
    }, // 镜像文件无法打开或读取元数据
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mount(root) => write!(f, "SD_MMC mount failed: {}", root.display()),
            Self::InvalidConfig(desc) => write!(f, "Invalid configuration: {}", desc),
            Self::BackingFile { path, source } => {
                write!(f, "Backing image unavailable: {} ({})", path.display(), source)
            }
        }
    }
}

impl std::error::Error for DiskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BackingFile { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// 磁盘层统一结果类型
pub type Result<T> = std::result::Result<T, DiskError>;
