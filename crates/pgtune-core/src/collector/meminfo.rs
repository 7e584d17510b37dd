//! `/proc/meminfo` parsing.

use super::MemoryDetectError;

/// Parses the `MemTotal` value (in kB) from `/proc/meminfo` content.
pub fn parse_mem_total(content: &str) -> Result<u64, MemoryDetectError> {
    let line = content
        .lines()
        .find(|line| line.starts_with("MemTotal:"))
        .ok_or_else(|| MemoryDetectError::Parse("MemTotal not found".to_string()))?;

    let total_kb = line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| MemoryDetectError::Parse(format!("malformed line: {}", line.trim())))?;

    if total_kb == 0 {
        return Err(MemoryDetectError::Parse("MemTotal is zero".to_string()));
    }
    Ok(total_kb)
}
