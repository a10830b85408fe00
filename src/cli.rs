//! Command-line argument surface of the `seedquarry` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::search::SearchMode;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Parallel search engine for Minecraft world seeds")]
pub struct Args {
    /// Session file to load, resume and update
    #[arg(short = 's', long = "session", value_name = "FILE")]
    pub session: Option<PathBuf>,

    /// Number of worker threads (default: auto-detect)
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Search mode
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Option<CliSearchMode>,

    /// Start seed: decimal, 0x hex, "random", or free text (Java hash)
    #[arg(long = "start", value_name = "SEED", allow_hyphen_values = true)]
    pub start: Option<String>,

    /// Minecraft version, e.g. "1.16"
    #[arg(long = "mc", value_name = "VERSION")]
    pub mc: Option<String>,

    /// 64-bit seed list for list mode
    #[arg(long = "list64", value_name = "FILE")]
    pub list64: Option<PathBuf>,

    /// 48-bit seed list for the List48 generator mode
    #[arg(long = "list48", value_name = "FILE")]
    pub list48: Option<PathBuf>,

    /// Stop as soon as the first hit is reported
    #[arg(long = "stop-on-result")]
    pub stop_on_result: bool,

    /// Result cap
    #[arg(long = "max-results", value_name = "N")]
    pub max_results: Option<usize>,

    /// Also print the shadow companion of each hit
    #[arg(long = "shadow")]
    pub shadow: bool,

    /// Suppress the live status line
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliSearchMode {
    Incremental,
    #[value(name = "family")]
    FamilyBlocks,
    List,
}

impl From<CliSearchMode> for SearchMode {
    fn from(mode: CliSearchMode) -> Self {
        match mode {
            CliSearchMode::Incremental => SearchMode::Incremental,
            CliSearchMode::FamilyBlocks => SearchMode::FamilyBlocks,
            CliSearchMode::List => SearchMode::List,
        }
    }
}

/// Parse an i64 from decimal or 0x-prefixed hex.
pub fn parse_i64(value: &str) -> Result<i64, String> {
    let v = value.trim();
    if let Some(hexpart) = v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        u64::from_str_radix(hexpart, 16)
            .map(|u| u as i64)
            .map_err(|e| format!("invalid hex value '{}': {}", value, e))
    } else {
        v.parse::<i64>()
            .map_err(|e| format!("invalid decimal value '{}': {}", value, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64("42"), Ok(42));
        assert_eq!(parse_i64("-42"), Ok(-42));
        assert_eq!(parse_i64("0x10"), Ok(16));
        assert_eq!(parse_i64("0xffffffffffffffff"), Ok(-1));
        assert!(parse_i64("zap").is_err());
    }

    #[test]
    fn test_mode_mapping() {
        assert_eq!(SearchMode::from(CliSearchMode::FamilyBlocks), SearchMode::FamilyBlocks);
    }
}
