use std::{
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use log::{debug, error, info};

use crate::{
    config::Config,
    disk::{DiskError, Result},
};

/// SD 卡外设：供电引脚 + SDMMC 总线 + 代表卡内容的目录
#[derive(Debug)]
pub struct SdCard {
    root: PathBuf,
    power_pin: u8,
    power_settle: Duration,
    powered: bool,
}

impl SdCard {
    pub fn new(config: &Config) -> Self {
        for (name, pin) in config.bus_pins() {
            debug!("SDMMC {} -> GPIO{}", name, pin);
        }
        Self {
            root: config.card_root.clone(),
            power_pin: config.power_pin,
            power_settle: Duration::from_millis(config.power_settle_ms),
            powered: false,
        }
    }

    /// 拉高供电引脚，等待卡稳定
    pub fn power_on(&mut self) {
        info!("card power on (GPIO{} high)", self.power_pin);
        thread::sleep(self.power_settle);
        self.powered = true;
    }

    /// 挂载失败不可恢复，调用方必须停止启动
    pub fn mount(&self) -> Result<MountedVolume> {
        if !self.powered {
            error!("mount attempted without card power");
            return Err(DiskError::Mount(self.root.clone()));
        }
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {
                info!("card mounted at {}", self.root.display());
                Ok(MountedVolume {
                    root: self.root.clone(),
                })
            }
            Ok(_) => {
                error!("{} is not a directory", self.root.display());
                Err(DiskError::Mount(self.root.clone()))
            }
            Err(e) => {
                error!("cannot mount {}: {}", self.root.display(), e);
                Err(DiskError::Mount(self.root.clone()))
            }
        }
    }
}

/// 已挂载的卷，只有挂载成功才能拿到
#[derive(Debug, Clone)]
pub struct MountedVolume {
    root: PathBuf,
}

impl MountedVolume {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 卡内路径 `/usb.img` -> 主机路径
    pub fn resolve(&self, card_path: &str) -> PathBuf {
        card_path
            .split('/')
            .filter(|part| !matches!(*part, "" | "." | ".."))
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}
