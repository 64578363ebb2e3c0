use std::io::Write;

use colored::*;
use env_logger::{Builder, Env};
use log::Level;

use crate::utils::timestamp;

/// 默认 info，可用 RUST_LOG 覆盖
pub fn init_logger() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        let level = match record.level() {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN ".yellow(),
            Level::Info => "INFO ".green(),
            Level::Debug => "DEBUG".blue(),
            Level::Trace => "TRACE".bright_black(),
        };
        writeln!(
            buf,
            "{} {} {}",
            timestamp().bright_black(),
            level,
            record.args()
        )
    });
    // 测试中可能被重复调用
    let _ = builder.try_init();
}
