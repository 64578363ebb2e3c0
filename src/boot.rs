use std::sync::mpsc::Sender;

use log::{error, info};

use crate::{
    config::Config,
    disk::{Result, SdCard, VirtualDisk},
};

/// 启动线程发往控制台的进度消息
#[derive(Debug)]
pub enum BootProgress {
    Step(&'static str),
    Progress(u64),
    Finished(Result<VirtualDisk>),
}

/// 在后台线程中运行启动流程，结果通过 `tx` 送回
pub fn perform_startup(config: Config, tx: Sender<BootProgress>) {
    let result = startup(&config, &tx);
    if let Err(e) = &result {
        error!("startup halted: {}", e);
    }
    let _ = tx.send(BootProgress::Finished(result));
}

/// 校验配置 -> 上电 -> 挂载 -> 打开镜像；任何一步失败都不会进入 USB 注册
pub fn startup(config: &Config, tx: &Sender<BootProgress>) -> Result<VirtualDisk> {
    let report = |step: &'static str, pct: u64| {
        let _ = tx.send(BootProgress::Step(step));
        let _ = tx.send(BootProgress::Progress(pct));
    };

    report("🧾 Checking configuration...", 10);
    config.validate()?;

    report("🔌 Powering SD card...", 30);
    let mut card = SdCard::new(config);
    card.power_on();

    report("⚙️ Mounting SD card...", 60);
    let volume = card.mount()?;

    report("🧠 Opening virtual disk image...", 90);
    let disk = VirtualDisk::open(&volume, &config.image_path)?;

    let _ = tx.send(BootProgress::Progress(100));
    info!(
        "startup complete: {} on {}",
        config.image_path,
        volume.root().display()
    );
    Ok(disk)
}
