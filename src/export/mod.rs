//! One-shot export pipeline: windowed concurrent fetch, height-ordered
//! output, run statistics.

mod fetch;
mod windows;
mod writer;

pub use windows::{WINDOW_WIDTH, Window, window_count, windows};
pub use writer::{FilterWriter, OutputMode, RunStats};

use std::io::Write;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{ConfigError, Result};
use crate::rpc::FilterSource;

/// Heights between progress lines.
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Export every filter in `[0, target]` from `source` to `out`.
///
/// The target is the configured height, or the chain tip when none is
/// configured; a target beyond the tip fails before any filter is
/// fetched. Windows are fetched sequentially, each with one concurrent
/// task per height, and output is emitted in strictly increasing height
/// order. The first failure anywhere aborts the whole run.
pub async fn run<S, W>(source: &Arc<S>, settings: &Settings, out: W) -> Result<RunStats>
where
    S: FilterSource + ?Sized + 'static,
    W: Write,
{
    let tip = source.tip_height().await?;
    let target = match settings.target_height {
        Some(target) if target > tip => {
            return Err(ConfigError::TargetBeyondTip { target, tip }.into());
        }
        Some(target) => target,
        None => tip,
    };

    if settings.progress {
        tracing::info!("Exporting filters up to block {} for {}", target, settings.network);
    }

    let mode = OutputMode::for_run(settings.hashes, settings.binary);
    let mut writer = FilterWriter::new(out, mode, settings.network);
    writer.begin()?;

    // One slot buffer for the whole run; each window refills it, keeping
    // memory bounded by the window width rather than the height range.
    let mut slots: Vec<Option<Vec<u8>>> = Vec::with_capacity(WINDOW_WIDTH as usize);

    for window in windows(target) {
        fetch::fetch_window(source, window, &mut slots).await?;

        for (offset, slot) in slots.iter_mut().enumerate() {
            let height = window.start + offset as u64;
            let filter = slot.take().expect("window slot filled after successful fetch");
            writer.record(&filter)?;

            if settings.progress && height % PROGRESS_INTERVAL == 0 {
                tracing::info!("Exported up to height {}", height);
            }
        }
    }

    let stats = writer.finish()?;
    if settings.progress {
        stats.log_summary();
    }
    Ok(stats)
}
