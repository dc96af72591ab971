//! Frame walking over synthetic and real zstd archives

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use runzst::{
    CursorPhase, Error, ErrorKind, FrameExtractor, FrameLayout, FrameParser, MemoryReader,
    RangeFetcher, StreamCursor,
};

fn skippable_frame(nibble: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = (0x184D2A50u32 | u32::from(nibble & 0x0F)).to_le_bytes().to_vec();
    out.extend((payload.len() as u32).to_le_bytes());
    out.extend(payload);
    out
}

/// Data frame with a 6-byte header, raw blocks and a checksum trailer
fn synthetic_frame(block_sizes: &[u32]) -> Vec<u8> {
    let mut out = vec![0x28, 0xB5, 0x2F, 0xFD, 0x04, 0x58];
    for (i, size) in block_sizes.iter().enumerate() {
        let last = u32::from(i + 1 == block_sizes.len());
        out.extend(&((size << 3) | last).to_le_bytes()[..3]);
        out.extend(std::iter::repeat_n(0x5A, *size as usize));
    }
    out.extend([0xC0, 0xFF, 0xEE, 0x00]);
    out
}

fn zstd_frame(data: &[u8]) -> Vec<u8> {
    let mut encoder = zstd::stream::Encoder::new(Vec::new(), 3).unwrap();
    encoder.include_checksum(true).unwrap();
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn pgn_text(min_len: usize) -> Vec<u8> {
    let mut text = String::new();
    let mut game = 0u64;
    while text.len() < min_len {
        game += 1;
        text.push_str(&format!(
            "[Event \"Rated Blitz game\"]\n[Site \"https://lichess.org/{:08x}\"]\n[WhiteElo \"{}\"]\n[BlackElo \"{}\"]\n\n1. e4 {{ [%clk 0:03:00] }} c5 2. Nf3 d6 {} 1-0\n\n",
            game.wrapping_mul(2654435761),
            1200 + game * 37 % 900,
            1100 + game * 53 % 1000,
            game * game % 10007
        ));
    }
    text.into_bytes()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_walks_real_zstd_archive() {
    let texts = [pgn_text(400_000), vec![0u8; 300_000], pgn_text(1_000)];
    let frames: Vec<Vec<u8>> = texts.iter().map(|t| zstd_frame(t)).collect();

    let mut archive = skippable_frame(0, b"seek table lives elsewhere");
    let mut expected = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        expected.push((archive.len() as u64, frame.len() as u64));
        archive.extend(frame);
        if i == 0 {
            archive.extend(skippable_frame(7, &[1, 2, 3]));
        }
    }

    let reader = Arc::new(MemoryReader::new(archive));
    let parser = FrameParser::with_layout(reader.clone(), FrameLayout::Descriptor);
    let mut cursor = StreamCursor::new(parser, "memory");
    let extractor = FrameExtractor::new(reader);

    let mut walked = Vec::new();
    while !cursor.is_at_end() {
        let span = cursor.next_frame().await.unwrap();
        assert_eq!(
            extractor.decompress_frame(&span).await.unwrap(),
            texts[walked.len()]
        );
        if walked.is_empty() {
            assert!(span.block_count >= 4, "expected several blocks");
        }
        walked.push((span.start, span.size));
    }

    assert_eq!(walked, expected);
}

#[tokio::test]
async fn test_magic_prefix_is_not_a_match() {
    let reader = Arc::new(MemoryReader::new(vec![0xFD, 0xB5, 0x2F, 0xFD, 0, 0, 0, 0]));
    let err = FrameParser::new(reader).locate(0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[tokio::test]
async fn test_skippable_frame_points_past_payload() {
    let mut data = skippable_frame(0, &[0u8; 10]);
    assert_eq!(&data[..8], &[0x50, 0x2A, 0x4D, 0x18, 0x0A, 0x00, 0x00, 0x00]);
    data.extend(synthetic_frame(&[1]));

    let reader = Arc::new(MemoryReader::with_read_log(data));
    let parser = FrameParser::new(reader.clone());
    assert_eq!(parser.locate(0).await.unwrap(), 18);
    assert_eq!(reader.read_log().last(), Some(&(18, 4)));
}

#[tokio::test]
async fn test_single_block_frame_size() {
    let mut data = vec![0u8; 32];
    data.extend(synthetic_frame(&[100]));
    let parser = FrameParser::new(Arc::new(MemoryReader::new(data)));
    assert_eq!(parser.size_of(32).await.unwrap(), 6 + 3 + 100 + 4);
}

/// Fails every read once `fail_after` reads have gone through
struct FlakyReader {
    inner: MemoryReader,
    reads: AtomicUsize,
    fail_after: AtomicUsize,
}

impl FlakyReader {
    fn new(data: Vec<u8>, fail_after: usize) -> Self {
        Self {
            inner: MemoryReader::new(data),
            reads: AtomicUsize::new(0),
            fail_after: AtomicUsize::new(fail_after),
        }
    }

    fn heal(&self) {
        self.fail_after.store(usize::MAX, Ordering::SeqCst);
    }
}

#[async_trait]
impl RangeFetcher for FlakyReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> runzst::Result<usize> {
        if self.reads.fetch_add(1, Ordering::SeqCst) >= self.fail_after.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        self.inner.read_at(offset, buf).await
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }
}

#[tokio::test]
async fn test_fetch_failure_leaves_cursor_in_place() {
    let mut data = synthetic_frame(&[10, 10]);
    data.extend(synthetic_frame(&[20, 30, 40]));

    // First advance needs 4 reads: magic, descriptor, two block headers
    let reader = Arc::new(FlakyReader::new(data, 6));
    let mut cursor = StreamCursor::new(FrameParser::new(reader.clone()), "flaky");

    let first = cursor.advance().await.unwrap();
    assert_eq!(first, 6 + 13 + 13 + 4);

    let err = cursor.advance().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(cursor.phase(), CursorPhase::Failed);
    assert_eq!(cursor.current(), first);

    reader.heal();
    assert_eq!(cursor.advance().await.unwrap(), first + 6 + 23 + 33 + 43 + 4);
}

#[tokio::test]
async fn test_current_is_idempotent() {
    let cursor = StreamCursor::new(
        FrameParser::new(Arc::new(MemoryReader::new(synthetic_frame(&[1])))),
        "u",
    );
    assert_eq!(cursor.current(), cursor.current());
}

proptest! {
    #[test]
    fn prop_locate_skips_any_chain(payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 0..8)) {
        let mut data = Vec::new();
        let mut magic_offsets = Vec::new();
        let mut expected_log = Vec::new();
        for (i, payload) in payloads.iter().enumerate() {
            let offset = data.len() as u64;
            magic_offsets.push(offset);
            expected_log.push((offset, 4));
            expected_log.push((offset + 4, 4));
            data.extend(skippable_frame(i as u8, payload));
        }
        let frame_start = data.len() as u64;
        magic_offsets.push(frame_start);
        expected_log.push((frame_start, 4));
        data.extend(synthetic_frame(&[3]));

        let reader = Arc::new(MemoryReader::with_read_log(data));
        let parser = FrameParser::new(reader.clone());
        let located = runtime().block_on(parser.locate(0)).unwrap();

        prop_assert_eq!(located, frame_start);
        prop_assert_eq!(reader.read_log(), expected_log);
        let magic_reads = reader
            .read_log()
            .iter()
            .filter(|(offset, _)| magic_offsets.contains(offset))
            .count();
        prop_assert_eq!(magic_reads, payloads.len() + 1);
    }

    #[test]
    fn prop_frame_size_sums_blocks(sizes in prop::collection::vec(0u32..2000, 1..12)) {
        let reader = Arc::new(MemoryReader::new(synthetic_frame(&sizes)));
        let parser = FrameParser::new(reader);
        let span = runtime().block_on(parser.frame_span(0)).unwrap();

        let expected = 6 + sizes.iter().map(|s| 3 + u64::from(*s)).sum::<u64>() + 4;
        prop_assert_eq!(span.size, expected);
        prop_assert_eq!(span.block_count, sizes.len());
    }
}
