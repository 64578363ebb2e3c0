use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;

use crate::{
    config::Config,
    disk::{Lba, VirtualDisk, BLOCK_SIZE},
    msc::LoopbackHost,
    utils::hex_dump,
};

/// 一次 `read` 最多转储的块数
pub const MAX_DUMP_BLOCKS: u32 = 16;

/// 一次 `peek` 最多转储的字节数
pub const MAX_PEEK_BYTES: usize = MAX_DUMP_BLOCKS as usize * BLOCK_SIZE;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Info,
    Read { lba: Lba, count: u32 },
    Peek { lba: Lba, offset: u32, len: usize },
    Write { lba: Lba, fill: u8 },
    Scan,
    Config,
    SaveConfig,
    Exit,
}

/// 控制台持有的会话状态
pub struct Console<'a> {
    pub host: &'a LoopbackHost<'a>,
    pub disk: &'a VirtualDisk,
    pub config: &'a Config,
}

pub fn execute_command(cmd: &Command, console: &Console) -> Result<(), Box<dyn Error>> {
    let host = console.host;
    match cmd {
        Command::Help => print_help(),
        Command::Info => {
            let reg = host.registration()?;
            println!("{}", "💽 Block device".bright_yellow().bold());
            println!(
                "{}: {} / {} / {}",
                "Identity".blue(),
                reg.identity.vendor_id(),
                reg.identity.product_id(),
                reg.identity.product_revision()
            );
            println!(
                "{}: {} blocks x {} bytes ({} bytes)",
                "Geometry".blue(),
                reg.block_count,
                reg.block_size,
                reg.capacity_bytes()
            );
            println!(
                "{}: media {}, {}",
                "Flags".blue(),
                if host.media_present() { "present" } else { "absent" },
                if reg.writable() { "writable" } else { "read-only" }
            );
            if let Some(state) = host.state() {
                println!("{}: {:?}", "State".blue(), state);
            }
            println!(
                "{}: {}",
                "Backing".blue(),
                console.disk.backing_path().display()
            );
        }
        Command::Read { lba, count } => {
            if *count == 0 || *count > MAX_DUMP_BLOCKS {
                return Err(format!("count must be 1..={}", MAX_DUMP_BLOCKS).into());
            }
            let data = host.read_blocks(*lba, *count)?;
            for (i, block) in data.chunks(BLOCK_SIZE).enumerate() {
                let block_lba = *lba as u64 + i as u64;
                println!("{}", format!("── LBA {} ──", block_lba).cyan());
                for line in hex_dump(block_lba * BLOCK_SIZE as u64, block) {
                    println!("{}", line);
                }
            }
        }
        Command::Peek { lba, offset, len } => {
            if *len > MAX_PEEK_BYTES {
                return Err(format!("len must be at most {}", MAX_PEEK_BYTES).into());
            }
            let data = host.read_raw(*lba, *offset, *len)?;
            println!(
                "📖 {} of {} bytes transferred",
                data.len().to_string().green(),
                len
            );
            let base = *lba as u64 * BLOCK_SIZE as u64 + *offset as u64;
            for line in hex_dump(base, &data) {
                println!("{}", line);
            }
        }
        Command::Write { lba, fill } => {
            let data = vec![*fill; BLOCK_SIZE];
            let accepted = host.write_blocks(*lba, &data)?;
            if accepted == 0 {
                println!(
                    "🔒 {} 0 of {} bytes accepted at LBA {}",
                    "Medium is write-protected:".yellow(),
                    BLOCK_SIZE,
                    lba
                );
            } else {
                println!("✏️  {} bytes accepted at LBA {}", accepted, lba);
            }
        }
        Command::Scan => scan(host)?,
        Command::Config => print_config(console.config),
        Command::SaveConfig => {
            let path = Config::default_path();
            console.config.save(&path)?;
            println!("💾 Saved configuration to {}", path.display().to_string().cyan());
        }
        Command::Exit => println!("{}", "👋 Detaching USB device...".yellow().bold()),
    }

    Ok(())
}

/// 逐块读取整个设备，统计不足一块的传输
fn scan(host: &LoopbackHost) -> Result<(), Box<dyn Error>> {
    let (blocks, _) = host.capacity()?;
    let pb = ProgressBar::new(blocks);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.green/black}] {pos}/{len} blocks {msg}")?
            .progress_chars("#>-"),
    );

    let mut bad = Vec::new();
    // 注册时已保证块数在 32 位范围内
    for lba in 0..blocks as Lba {
        if host.read_blocks(lba, 1).is_err() {
            bad.push(lba);
        }
        pb.inc(1);
    }

    if bad.is_empty() {
        pb.finish_with_message("✅ all blocks readable");
    } else {
        pb.finish_with_message(format!("⚠️ {} unreadable", bad.len()));
        let shown: Vec<String> = bad.iter().take(8).map(|l| l.to_string()).collect();
        println!(
            "{} {}{}",
            "Unreadable LBAs:".red(),
            shown.join(", "),
            if bad.len() > 8 { ", ..." } else { "" }
        );
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("{}", "⚙️  Configuration".bright_yellow().bold());
    println!("{}: {}", "Card root".blue(), config.card_root.display());
    println!("{}: {}", "Image".blue(), config.image_path);
    let pins: Vec<String> = config
        .bus_pins()
        .iter()
        .map(|(name, pin)| format!("{}={}", name, pin))
        .collect();
    println!(
        "{}: {} ({})",
        "SDMMC".blue(),
        pins.join(" "),
        if config.mode_1bit { "1-bit" } else { "4-bit" }
    );
    println!(
        "{}: GPIO{} ({} ms settle)",
        "Power".blue(),
        config.power_pin,
        config.power_settle_ms
    );
    println!(
        "{}: {} / {} / {}",
        "USB".blue(),
        config.vendor_id,
        config.product_id,
        config.product_revision
    );
}

fn print_help() {
    println!("{}", "📘 SD-MSC Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  info                      Show registration and geometry
  read <lba> [count]        Host block read, hex dump (max 16 blocks)
  peek <lba> <off> <len>    Raw read callback with byte offset
  write <lba> [byte]        Host block write (always rejected)
  scan                      Read every block, report failures
  config                    Show startup configuration
  save-config               Persist configuration to ~/.sd-msc
  help                      Show this help message
  exit                      Quit the console
"
        .bright_black()
    );
}
