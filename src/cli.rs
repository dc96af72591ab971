use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::frame::FrameLayout;
use crate::io::HttpConfig;

#[derive(Parser, Debug)]
#[command(name = "runzst")]
#[command(version)]
#[command(about = "Walk a zstd archive frame by frame, with HTTP URL support", long_about = None)]
#[command(after_help = "Examples:\n  \
  runzst -l https://database.lichess.org/standard/lichess_db_standard_rated_2013-01.pgn.zst\n  \
  runzst -p -n 10 -s metadata.json URL | pgn-parser      stream ten frames and remember where we stopped\n  \
  runzst -l --layout descriptor local.zst                list frames of any zstd file")]
pub struct Cli {
    /// zstd archive path or HTTP URL
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Resume state file (created if missing)
    #[arg(short = 's', long = "state", value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Ignore any saved position and start at offset 0
    #[arg(long)]
    pub restart: bool,

    /// Number of frames to consume (default: until the end)
    #[arg(short = 'n', long = "frames", value_name = "N")]
    pub frames: Option<u64>,

    /// List frame spans
    #[arg(short = 'l')]
    pub list: bool,

    /// Decompress frames to stdout
    #[arg(short = 'p')]
    pub pipe: bool,

    /// How frame header and checksum lengths are determined
    #[arg(long, value_enum, default_value_t = LayoutArg::Fixed)]
    pub layout: LayoutArg,

    /// Read-ahead window in bytes (0 disables it)
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    pub read_ahead: usize,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// HTTP attempts on connection errors
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub retries: u32,

    /// Quiet mode
    #[arg(short = 'q')]
    pub quiet: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// 6-byte header and 4-byte checksum
    Fixed,
    /// Read lengths from the frame header descriptor
    Descriptor,
}

impl From<LayoutArg> for FrameLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Fixed => FrameLayout::Fixed,
            LayoutArg::Descriptor => FrameLayout::Descriptor,
        }
    }
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet || self.pipe
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_secs(self.timeout),
            max_retry: self.retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::parse_from([
            "runzst",
            "-p",
            "-n",
            "3",
            "--layout",
            "descriptor",
            "-s",
            "meta.json",
            "https://example.com/db.pgn.zst",
        ]);
        assert!(cli.is_http_url());
        assert!(cli.is_quiet());
        assert_eq!(cli.frames, Some(3));
        assert_eq!(FrameLayout::from(cli.layout), FrameLayout::Descriptor);
        assert_eq!(cli.state, Some(PathBuf::from("meta.json")));
        assert_eq!(cli.http_config().max_retry, 10);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["runzst", "games.pgn.zst"]);
        assert!(!cli.is_http_url());
        assert!(!cli.is_quiet());
        assert_eq!(cli.layout, LayoutArg::Fixed);
        assert_eq!(cli.read_ahead, 0);
    }
}
