use crate::shell::command::Command;

/// 支持十进制和 0x 前缀的十六进制
fn parse_num<T: TryFrom<u64>>(token: &str) -> Option<T> {
    let value = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => token.parse::<u64>().ok()?,
    };
    T::try_from(value).ok()
}

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.trim().split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let cmd = tokens[0];
    let args = &tokens[1..];

    match cmd {
        "help" => Some(Command::Help),
        "info" => Some(Command::Info),
        "read" => {
            let lba = parse_num(args.first()?)?;
            let count = match args.get(1) {
                Some(c) => parse_num(c)?,
                None => 1,
            };
            Some(Command::Read { lba, count })
        }
        "peek" => {
            if args.len() < 3 {
                return None;
            }
            Some(Command::Peek {
                lba: parse_num(args[0])?,
                offset: parse_num(args[1])?,
                len: parse_num(args[2])?,
            })
        }
        "write" => {
            let lba = parse_num(args.first()?)?;
            let fill = match args.get(1) {
                Some(b) => parse_num(b)?,
                None => 0,
            };
            Some(Command::Write { lba, fill })
        }
        "scan" => Some(Command::Scan),
        "config" => Some(Command::Config),
        "save-config" => Some(Command::SaveConfig),
        "exit" | "quit" => Some(Command::Exit),
        _ => None,
    }
}
