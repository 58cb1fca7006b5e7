//! Minimal CSV reading for the landmark map and mask files.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// カンマ区切りファイルを読み、各セルをtrimして返す（空行は飛ばす）
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read table {}", path.display()))?;
    Ok(parse_table(&content))
}

/// [`read_table`] と同じだが、ファイルが無ければ空の表
pub fn read_table_or_empty<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("table {} not found, using empty table", path.display());
        return Ok(Vec::new());
    }
    read_table(path)
}

pub fn parse_table(content: &str) -> Vec<Vec<String>> {
    content
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(',')
                .map(|cell| unquote(cell.trim()).to_string())
                .collect()
        })
        .collect()
}

/// 両端の対になった引用符を1組だけ外す
pub fn unquote(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
