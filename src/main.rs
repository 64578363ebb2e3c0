use std::{path::PathBuf, process::ExitCode};

use log::warn;

use crate::{config::Config, shell::start_shell};

mod boot;
mod config;
mod disk;
mod logging;
mod msc;
mod shell;
#[cfg(test)]
mod test_support;
mod utils;

fn main() -> ExitCode {
    logging::init_logger();

    let config_path = Config::default_path();
    let mut config = Config::load_or_default(&config_path).unwrap_or_else(|e| {
        warn!("ignoring {}: {}", config_path.display(), e);
        Config::default()
    });

    // 第一个参数覆盖卡根目录
    if let Some(root) = std::env::args_os().nth(1) {
        config.card_root = PathBuf::from(root);
    }

    start_shell(config)
}
