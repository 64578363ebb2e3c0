use chrono::Local;
use uuid::Uuid;

/// 本地时间戳，用于日志行
pub fn timestamp() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

/// 生成一个随机唯一 ID
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// 十六进制 + ASCII 转储，每行 16 字节，`base` 为首字节的绝对偏移
pub fn hex_dump(base: u64, bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(row, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!(
                "{:08x}  {:<47}  |{}|",
                base + (row * 16) as u64,
                hex.join(" "),
                ascii
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_rows() {
        let lines = hex_dump(0x200, b"MSDOS5.0\x00\x02\x01\x20\x00\x02\x00\x00AB");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000200  4d 53 44 4f 53 35 2e 30"));
        assert!(lines[0].ends_with("|MSDOS5.0... ....|"));
        assert!(lines[1].starts_with("00000210  41 42"));
        assert!(lines[1].ends_with("|AB|"));
    }
}
