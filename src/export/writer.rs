//! Output formatting and run statistics.
//!
//! The writer consumes filters in global height order. Regardless of the
//! selected mode it feeds every payload into one incremental aggregate
//! hash and tracks byte totals, so a run with no output mode still
//! produces verifiable statistics.

use std::io::Write;

use crate::config::Network;
use crate::error::{OutputError, OutputResult};

/// What gets written to stdout for each filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// A source-embeddable string literal of concatenated filter hashes.
    HashManifest,
    /// `[2-byte big-endian length][filter bytes]` records, no separators.
    Binary,
    /// Nothing; the run only computes statistics.
    StatsOnly,
}

impl OutputMode {
    /// Select the mode from the two (mutually exclusive) output flags.
    pub fn for_run(hashes: bool, binary: bool) -> Self {
        match (hashes, binary) {
            (true, _) => OutputMode::HashManifest,
            (_, true) => OutputMode::Binary,
            _ => OutputMode::StatsOnly,
        }
    }
}

/// Statistics accumulated over a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// Hex digest of the aggregate hash over all filter payloads, in
    /// height order.
    pub aggregate_hash: String,
    /// Total bytes across all filters.
    pub total_bytes: u64,
    /// Largest single filter seen.
    pub max_filter_bytes: u64,
    /// Number of filters exported.
    pub filter_count: u64,
}

impl RunStats {
    /// Average filter size, or `None` when no filters were exported.
    pub fn average_filter_bytes(&self) -> Option<u64> {
        (self.filter_count > 0).then(|| self.total_bytes / self.filter_count)
    }

    pub(crate) fn log_summary(&self) {
        tracing::info!("Aggregate hash of filter data: {}", self.aggregate_hash);
        tracing::info!("Total filter size: {:.2} MiB", self.total_bytes as f64 / 1024.0 / 1024.0);
        match self.average_filter_bytes() {
            Some(avg) => tracing::info!("Avg filter size: {} bytes", avg),
            None => tracing::info!("No filters exported"),
        }
        tracing::info!("Max filter size: {} bytes", self.max_filter_bytes);
    }
}

/// Writes filters to the output sink and accumulates run statistics.
pub struct FilterWriter<W: Write> {
    out: W,
    mode: OutputMode,
    network: Network,
    hasher: blake3::Hasher,
    total_bytes: u64,
    max_filter_bytes: u64,
    filter_count: u64,
}

impl<W: Write> FilterWriter<W> {
    pub fn new(out: W, mode: OutputMode, network: Network) -> Self {
        Self {
            out,
            mode,
            network,
            hasher: blake3::Hasher::new(),
            total_bytes: 0,
            max_filter_bytes: 0,
            filter_count: 0,
        }
    }

    /// Write any framing that precedes the first filter.
    pub fn begin(&mut self) -> OutputResult<()> {
        if self.mode == OutputMode::HashManifest {
            writeln!(self.out, "// Autogenerated by cfilter-export. Do not edit.")?;
            writeln!(self.out)?;
            write!(
                self.out,
                "pub const CFILTER_HASHES_{}: &str = \"",
                self.network.name().to_ascii_uppercase()
            )?;
        }
        Ok(())
    }

    /// Emit one filter and fold it into the running statistics.
    ///
    /// Filters must arrive in strictly increasing height order; the
    /// aggregate hash is order-sensitive.
    pub fn record(&mut self, filter: &[u8]) -> OutputResult<()> {
        match self.mode {
            OutputMode::HashManifest => {
                write!(self.out, "{}", blake3::hash(filter).to_hex())?;
            }
            OutputMode::Binary => {
                let len = filter.len();
                let prefix =
                    u16::try_from(len).map_err(|_| OutputError::FilterTooLarge { len })?;
                self.out.write_all(&prefix.to_be_bytes())?;
                self.out.write_all(filter)?;
            }
            OutputMode::StatsOnly => {}
        }

        self.hasher.update(filter);
        self.total_bytes += filter.len() as u64;
        self.max_filter_bytes = self.max_filter_bytes.max(filter.len() as u64);
        self.filter_count += 1;
        Ok(())
    }

    /// Write closing framing, flush the sink, and return the run stats.
    pub fn finish(mut self) -> OutputResult<RunStats> {
        if self.mode == OutputMode::HashManifest {
            writeln!(self.out, "\";")?;
        }
        self.out.flush()?;

        Ok(RunStats {
            aggregate_hash: self.hasher.finalize().to_hex().to_string(),
            total_bytes: self.total_bytes,
            max_filter_bytes: self.max_filter_bytes,
            filter_count: self.filter_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(mode: OutputMode, filters: &[&[u8]]) -> (Vec<u8>, RunStats) {
        let mut out = Vec::new();
        let mut writer = FilterWriter::new(&mut out, mode, Network::Mainnet);
        writer.begin().unwrap();
        for filter in filters {
            writer.record(filter).unwrap();
        }
        let stats = writer.finish().unwrap();
        (out, stats)
    }

    /// Decode one `[len][bytes]` record off the front of the buffer.
    fn decode_record(buf: &[u8]) -> (&[u8], &[u8]) {
        let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        (&buf[2..2 + len], &buf[2 + len..])
    }

    #[test]
    fn test_binary_records_round_trip() {
        let filters: Vec<Vec<u8>> = vec![vec![1, 2, 3], vec![], vec![9; 65_535]];
        let refs: Vec<&[u8]> = filters.iter().map(|f| f.as_slice()).collect();
        let (out, stats) = collect(OutputMode::Binary, &refs);

        let mut rest = out.as_slice();
        for filter in &filters {
            let (decoded, tail) = decode_record(rest);
            assert_eq!(decoded, filter.as_slice());
            rest = tail;
        }
        assert!(rest.is_empty());
        assert_eq!(stats.filter_count, 3);
    }

    #[test]
    fn test_binary_oversize_filter_is_an_error() {
        let big = vec![0u8; 65_536];
        let mut out = Vec::new();
        let mut writer = FilterWriter::new(&mut out, OutputMode::Binary, Network::Mainnet);
        writer.begin().unwrap();

        match writer.record(&big) {
            Err(OutputError::FilterTooLarge { len }) => assert_eq!(len, 65_536),
            other => panic!("expected FilterTooLarge, got {:?}", other),
        }
        // Nothing may reach the stream for the rejected record.
        assert!(out.is_empty());
    }

    #[test]
    fn test_manifest_framing_and_content() {
        let (out, _) = collect(OutputMode::HashManifest, &[b"abc", b"def"]);
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("// Autogenerated by cfilter-export."));
        assert!(text.contains("pub const CFILTER_HASHES_MAINNET: &str = \""));
        assert!(text.ends_with("\";\n"));

        let open = text.find('"').unwrap();
        let close = text.rfind('"').unwrap();
        let body = &text[open + 1..close];
        // Two filters, one 64-char hex hash each.
        assert_eq!(body.len(), 128);
        assert_eq!(&body[..64], blake3::hash(b"abc").to_hex().as_str());
        assert_eq!(&body[64..], blake3::hash(b"def").to_hex().as_str());
    }

    #[test]
    fn test_manifest_const_name_tracks_network() {
        let mut out = Vec::new();
        let mut writer = FilterWriter::new(&mut out, OutputMode::HashManifest, Network::Testnet);
        writer.begin().unwrap();
        writer.finish().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("CFILTER_HASHES_TESTNET3"));
    }

    #[test]
    fn test_stats_only_writes_nothing() {
        let (out, stats) = collect(OutputMode::StatsOnly, &[b"abc", b"defgh"]);

        assert!(out.is_empty());
        assert_eq!(stats.total_bytes, 8);
        assert_eq!(stats.max_filter_bytes, 5);
        assert_eq!(stats.filter_count, 2);
        assert_eq!(stats.average_filter_bytes(), Some(4));
    }

    #[test]
    fn test_aggregate_hash_is_deterministic_and_order_sensitive() {
        let (_, first) = collect(OutputMode::StatsOnly, &[b"abc", b"def"]);
        let (_, again) = collect(OutputMode::StatsOnly, &[b"abc", b"def"]);
        let (_, permuted) = collect(OutputMode::StatsOnly, &[b"def", b"abc"]);

        assert_eq!(first.aggregate_hash, again.aggregate_hash);
        assert_ne!(first.aggregate_hash, permuted.aggregate_hash);
    }

    #[test]
    fn test_aggregate_matches_concatenation() {
        let (_, stats) = collect(OutputMode::StatsOnly, &[b"abc", b"def"]);
        assert_eq!(stats.aggregate_hash, blake3::hash(b"abcdef").to_hex().to_string());
    }

    #[test]
    fn test_empty_run_average_is_guarded() {
        let (_, stats) = collect(OutputMode::StatsOnly, &[]);
        assert_eq!(stats.filter_count, 0);
        assert_eq!(stats.average_filter_bytes(), None);
    }
}
