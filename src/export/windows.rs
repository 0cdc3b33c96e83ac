//! Height-window partitioning for batched filter retrieval.

/// Number of heights fetched concurrently per window.
pub const WINDOW_WIDTH: u64 = 4000;

/// A contiguous sub-range of block heights processed as one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// First height in the window.
    pub start: u64,
    /// Number of heights in the window. Never zero, never above
    /// [`WINDOW_WIDTH`].
    pub len: usize,
}

impl Window {
    /// Last height in the window, inclusive.
    pub fn end(&self) -> u64 {
        self.start + self.len as u64 - 1
    }

    /// Heights covered by this window.
    pub fn heights(&self) -> impl Iterator<Item = u64> {
        self.start..=self.end()
    }
}

/// Iterator over the windows partitioning `[0, target]`.
///
/// Windows are consecutive, non-overlapping, and at most
/// [`WINDOW_WIDTH`] heights wide; the final window is clamped so its
/// last height equals `target` exactly.
#[derive(Debug, Clone)]
pub struct Windows {
    next_start: u64,
    target: u64,
    done: bool,
}

/// Partition `[0, target]` into fetch windows.
pub fn windows(target: u64) -> Windows {
    Windows { next_start: 0, target, done: false }
}

/// Total number of windows for the given target height.
pub fn window_count(target: u64) -> u64 {
    (target + 1).div_ceil(WINDOW_WIDTH)
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.done {
            return None;
        }

        let start = self.next_start;
        let remaining = self.target - start + 1;
        let len = remaining.min(WINDOW_WIDTH);

        self.next_start = start + len;
        self.done = self.next_start > self.target;

        Some(Window { start, len: len as usize })
    }
}
