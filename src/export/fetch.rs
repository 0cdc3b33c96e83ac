//! Concurrent per-window filter retrieval.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::{RpcError, RpcResult};
use crate::export::windows::Window;
use crate::rpc::FilterSource;

/// Fetch every filter in `window` concurrently, placing results into
/// `slots` by in-window offset.
///
/// One task per height performs the hash lookup followed by the filter
/// lookup. The slot buffer is cleared and resized to the window length,
/// so callers can reuse one allocation across windows. On success every
/// slot is filled; completion order never affects slot order.
///
/// Tasks are never cancelled mid-window: all of them resolve before the
/// first error (if any) is returned, and a failed window produces no
/// partial output.
pub(crate) async fn fetch_window<S>(
    source: &Arc<S>,
    window: Window,
    slots: &mut Vec<Option<Vec<u8>>>,
) -> RpcResult<()>
where
    S: FilterSource + ?Sized + 'static,
{
    slots.clear();
    slots.resize(window.len, None);

    let mut tasks = JoinSet::new();
    for (offset, height) in window.heights().enumerate() {
        let source = Arc::clone(source);
        tasks.spawn(async move {
            let hash = source.block_hash(height).await?;
            let filter = source.cfilter(&hash).await?;
            Ok::<_, RpcError>((offset, filter))
        });
    }

    let mut first_err: Option<RpcError> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok((offset, filter))) => {
                debug_assert!(slots[offset].is_none(), "slot filled twice");
                slots[offset] = Some(filter);
            }
            Ok(Err(e)) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
            Err(join_err) => {
                if first_err.is_none() {
                    first_err = Some(RpcError::Task(join_err.to_string()));
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Deterministic filter payload for a height: length and content both
    /// derive from the height so misplaced slots are detectable.
    fn filter_for(height: u64) -> Vec<u8> {
        let len = (height % 40 + 9) as usize;
        let mut bytes = height.to_be_bytes().to_vec();
        bytes.resize(len, (height % 251) as u8);
        bytes
    }

    /// Source that completes each call after a random delay.
    struct JitterSource;

    #[async_trait]
    impl FilterSource for JitterSource {
        async fn tip_height(&self) -> RpcResult<u64> {
            Ok(u64::MAX)
        }

        async fn block_hash(&self, height: u64) -> RpcResult<String> {
            let delay = rand::thread_rng().gen_range(0..5u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(format!("{:016x}", height))
        }

        async fn cfilter(&self, block_hash: &str) -> RpcResult<Vec<u8>> {
            let delay = rand::thread_rng().gen_range(0..5u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let height = u64::from_str_radix(block_hash, 16).unwrap();
            Ok(filter_for(height))
        }
    }

    /// Source that fails the filter lookup at one height but serves the
    /// rest, counting every completed call.
    struct FailingSource {
        fail_at: u64,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl FilterSource for FailingSource {
        async fn tip_height(&self) -> RpcResult<u64> {
            Ok(u64::MAX)
        }

        async fn block_hash(&self, height: u64) -> RpcResult<String> {
            Ok(format!("{:016x}", height))
        }

        async fn cfilter(&self, block_hash: &str) -> RpcResult<Vec<u8>> {
            let height = u64::from_str_radix(block_hash, 16).unwrap();
            if height == self.fail_at {
                return Err(RpcError::Call {
                    method: "getcfilterv2".to_string(),
                    code: -5,
                    message: "no filter".to_string(),
                });
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(filter_for(height))
        }
    }

    #[tokio::test]
    async fn test_slots_filled_in_height_order_despite_jitter() {
        let source = Arc::new(JitterSource);
        let window = Window { start: 4000, len: 64 };
        let mut slots = Vec::new();

        fetch_window(&source, window, &mut slots).await.unwrap();

        assert_eq!(slots.len(), 64);
        for (offset, slot) in slots.iter().enumerate() {
            let height = window.start + offset as u64;
            assert_eq!(slot.as_deref(), Some(filter_for(height).as_slice()));
        }
    }

    #[tokio::test]
    async fn test_slot_buffer_is_reused_across_windows() {
        let source = Arc::new(JitterSource);
        let mut slots = Vec::new();

        fetch_window(&source, Window { start: 0, len: 32 }, &mut slots).await.unwrap();
        assert_eq!(slots.len(), 32);

        // A later, smaller window must not see stale slots.
        fetch_window(&source, Window { start: 32, len: 5 }, &mut slots).await.unwrap();
        assert_eq!(slots.len(), 5);
        for (offset, slot) in slots.iter().enumerate() {
            assert_eq!(slot.as_deref(), Some(filter_for(32 + offset as u64).as_slice()));
        }
    }

    #[tokio::test]
    async fn test_failed_height_fails_whole_window_after_join() {
        let source = Arc::new(FailingSource { fail_at: 10, completed: AtomicUsize::new(0) });
        let window = Window { start: 0, len: 20 };
        let mut slots = Vec::new();

        let err = fetch_window(&source, window, &mut slots).await.unwrap_err();
        assert!(matches!(err, RpcError::Call { .. }));

        // Fire-and-collect: the remaining tasks ran to completion before
        // the error surfaced.
        assert_eq!(source.completed.load(Ordering::SeqCst), 19);
    }
}
