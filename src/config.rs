use std::{
    collections::HashSet,
    fs,
    io::{Error, ErrorKind},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    disk::{DiskError, Result},
    msc::Identity,
};

/// ESP32-S3 可用的最大 GPIO 编号
pub const MAX_GPIO: u8 = 48;

/// 默认导出的镜像文件（卡内路径）
pub const DEFAULT_IMAGE_PATH: &str = "/usb.img";

/// SDMMC 总线引脚
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdmmcPins {
    pub clk: u8,
    pub cmd: u8,
    pub d0: u8,
    pub d1: u8,
    pub d2: u8,
    pub d3: u8,
}

impl Default for SdmmcPins {
    fn default() -> Self {
        Self {
            clk: 14,
            cmd: 15,
            d0: 16,
            d1: 17,
            d2: 18,
            d3: 21,
        }
    }
}

/// 启动配置，启动时一次性传入，运行期间不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub card_root: PathBuf,   // 代表 SD 卡内容的目录
    pub image_path: String,   // 卡内镜像路径
    pub pins: SdmmcPins,      // 总线引脚
    pub power_pin: u8,        // 卡供电引脚
    pub mode_1bit: bool,      // 1 线模式
    pub power_settle_ms: u64, // 上电后等待时间
    /** USB 识别字符串 */
    pub vendor_id: String,
    pub product_id: String,
    pub product_revision: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            card_root: PathBuf::from("sdcard"),
            image_path: DEFAULT_IMAGE_PATH.to_string(),
            pins: SdmmcPins::default(),
            power_pin: 13,
            mode_1bit: true,
            power_settle_ms: 100,
            vendor_id: "ESP32".to_string(),
            product_id: "SDCardMSC".to_string(),
            product_revision: "1.0".to_string(),
        }
    }
}

impl Config {
    /// `~/.sd-msc/config.bin`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sd-msc")
            .join("config.bin")
    }

    /// 配置文件存在则读取，否则使用默认值
    pub fn load_or_default(path: &Path) -> std::io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = fs::read(path)?;
        bincode::deserialize(&bytes).map_err(|e| Error::new(ErrorKind::InvalidData, e))
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = bincode::serialize(self).map_err(|e| Error::new(ErrorKind::Other, e))?;
        fs::write(path, bytes)
    }

    /// 1 线模式只用到 D0
    pub fn bus_pins(&self) -> Vec<(&'static str, u8)> {
        let p = &self.pins;
        let mut pins = vec![("CLK", p.clk), ("CMD", p.cmd), ("D0", p.d0)];
        if !self.mode_1bit {
            pins.extend([("D1", p.d1), ("D2", p.d2), ("D3", p.d3)]);
        }
        pins
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (name, pin) in self
            .bus_pins()
            .into_iter()
            .chain(std::iter::once(("POWER", self.power_pin)))
        {
            if pin > MAX_GPIO {
                return Err(DiskError::InvalidConfig(format!(
                    "{} pin GPIO{} out of range",
                    name, pin
                )));
            }
            if !seen.insert(pin) {
                return Err(DiskError::InvalidConfig(format!(
                    "GPIO{} assigned twice ({})",
                    pin, name
                )));
            }
        }
        Identity::from_config(self).map_err(|e| DiskError::InvalidConfig(e.to_string()))?;
        if !self.image_path.starts_with('/') {
            return Err(DiskError::InvalidConfig(format!(
                "image path must be absolute on the card: {}",
                self.image_path
            )));
        }
        Ok(())
    }
}
