//! Main entry point for the runzst CLI application.
//!
//! Walks a local or remote zstd archive frame by frame, optionally
//! decompressing each frame to stdout and saving the position after every
//! frame so that a later run continues where this one stopped.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use runzst::{
    ArchiveSession, Cli, FrameExtractor, FrameParser, HttpRangeReader, LocalFileReader,
    RangeFetcher, ReadAheadReader, StateFile,
};

/// Application entry point.
///
/// Parses command-line arguments and dispatches on whether the source is a
/// local file or an HTTP URL.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "error" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.is_http_url() {
        let reader = HttpRangeReader::with_config(cli.source.clone(), cli.http_config())
            .await
            .with_context(|| format!("Failed to open {}", cli.source))?;
        let reader = Arc::new(reader);

        run(reader.clone(), &cli).await?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            eprintln!(
                "Total bytes transferred: {} in {} requests",
                format_size(reader.transferred_bytes()),
                reader.request_count()
            );
        }
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.source))
            .with_context(|| format!("Failed to open {}", cli.source))?;
        run(reader, &cli).await?;
    }

    Ok(())
}

/// Wrap the reader in a read-ahead window if one was requested.
async fn run<R: RangeFetcher + 'static>(reader: R, cli: &Cli) -> Result<()> {
    if cli.read_ahead > 0 {
        process_archive(Arc::new(ReadAheadReader::new(reader, cli.read_ahead)), cli).await
    } else {
        process_archive(Arc::new(reader), cli).await
    }
}

/// Consume frames from the archive according to CLI options.
///
/// - List mode (`-l`): print `offset size blocks` per frame
/// - Pipe mode (`-p`): decompress every frame to stdout
///
/// The cursor position is written to the state file after each frame.
async fn process_archive<R: RangeFetcher + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let archive_len = reader.size();
    let parser = FrameParser::with_layout(reader.clone(), cli.layout.into());
    let state_file = cli.state.as_ref().map(StateFile::new);
    let mut session = ArchiveSession::open(parser, cli.source.clone(), state_file, cli.restart)
        .await
        .context("Failed to read state file")?
        .with_limit(cli.frames);

    let extractor = FrameExtractor::new(reader);
    let mut decoded = 0u64;

    loop {
        let span = match session.next_frame().await {
            Ok(Some(span)) => span,
            Ok(None) => break,
            Err(e) => {
                let offset = session.cursor().current();
                return Err(e).with_context(|| format!("Failed at offset {}", offset));
            }
        };

        if cli.list {
            println!("{:>14}  {:>10}  {:>6}", span.start, span.size, span.block_count);
        }
        if cli.pipe {
            decoded += extractor.extract_to_stdout(&span).await?;
        }

        session
            .commit()
            .await
            .context("Failed to write state file")?;
    }

    if !cli.is_quiet() {
        eprintln!(
            "{} frames, position {} of {}{}",
            session.frames(),
            format_size(session.cursor().current()),
            format_size(archive_len),
            if decoded > 0 {
                format!(", {} decompressed", format_size(decoded))
            } else {
                String::new()
            }
        );
    }

    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
