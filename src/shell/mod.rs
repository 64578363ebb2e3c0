pub mod command;
pub mod parse;

use crate::{
    boot::{perform_startup, BootProgress},
    config::Config,
    disk::VirtualDisk,
    msc::{BlockDeviceAdapter, Identity, LoopbackHost},
    shell::{
        command::{execute_command, Command, Console},
        parse::parse_command,
    },
    utils::generate_uuid,
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::{
    io::stdout,
    path::PathBuf,
    process::ExitCode,
    sync::mpsc,
    thread,
};

pub fn start_shell(config: Config) -> ExitCode {
    boot_banner();

    // 启动失败即停机：不注册 USB 设备
    let disk = match boot(&config) {
        Some(disk) => disk,
        None => {
            println!("{}", "⛔ Startup halted, no USB device presented.".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let identity = match Identity::from_config(&config) {
        Ok(id) => id,
        Err(e) => {
            error!("{}", e);
            println!("{} {}", "⛔ Startup halted:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut host = LoopbackHost::new();
    if let Err(e) = BlockDeviceAdapter::new(&disk, identity).register(&mut host) {
        println!("{} {}", "⛔ USB registration failed:".red().bold(), e);
        return ExitCode::FAILURE;
    }

    let session = generate_uuid();
    info!("console session {}", session);
    println!("{}", "✅ USB MSC ready!".green().bold());
    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    run_console(&Console {
        host: &host,
        disk: &disk,
        config: &config,
    });

    println!("{}", "GoodBye!".bright_yellow());
    ExitCode::SUCCESS
}

/// 后台线程执行启动流程，前台渲染进度条
fn boot(config: &Config) -> Option<VirtualDisk> {
    let (tx, rx) = mpsc::channel();
    let worker_config = config.clone();
    let worker = thread::spawn(move || perform_startup(worker_config, tx));

    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut outcome = None;
    for message in rx {
        match message {
            BootProgress::Step(step) => pb.set_message(step),
            BootProgress::Progress(pct) => pb.set_position(pct),
            BootProgress::Finished(result) => {
                outcome = Some(result);
                break;
            }
        }
    }
    let _ = worker.join();

    match outcome {
        Some(Ok(disk)) => {
            pb.finish_with_message("✅ Ready!");
            Some(disk)
        }
        Some(Err(e)) => {
            pb.abandon_with_message("❌ Failed");
            println!("{} {}", "❌ Error:".red().bold(), e);
            None
        }
        None => {
            pb.abandon_with_message("❌ Startup thread exited");
            None
        }
    }
}

fn run_console(console: &Console) {
    let username = whoami::username();
    let hostname = whoami::hostname();

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sd_msc_history");

    let mut line_editor = Reedline::create();
    match FileBackedHistory::with_file(100, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => error!("history unavailable: {}", e),
    }

    // 命令补全
    let commands = vec![
        "help",
        "info",
        "read",
        "peek",
        "write",
        "scan",
        "config",
        "save-config",
        "exit",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    let completer = reedline::DefaultCompleter::new_with_wordlen(commands, 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(format!("{}@{}:msc", username, hostname)),
        DefaultPromptSegment::Basic("SD-MSC".to_string()),
    );

    loop {
        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, console) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                        if cmd == Command::Exit {
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command or bad arguments. Type 'help' for command list."
                            .yellow()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => break,
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }
}

fn boot_banner() {
    let mut stdout = stdout();
    let _ = execute!(
        stdout,
        Clear(ClearType::All),
        cursor::MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        Print(format!("SD-MSC v{}\n", env!("CARGO_PKG_VERSION"))),
        ResetColor
    );
    println!("{}", "[Booting USB mass-storage emulator...]".bright_yellow().bold());
}
