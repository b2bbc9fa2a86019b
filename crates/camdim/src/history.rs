//! Rolling buffer of recent frame analyses.
//!
//! The analyzer keeps the last N results so callers can inspect recent
//! frames and so automatic calibration can pull a reference detection
//! from the latest analysis without re-running the pipeline.

use std::collections::VecDeque;

use crate::pipeline::FrameAnalysis;

/// Default number of analyses retained before eviction.
pub const DEFAULT_HISTORY_CAPACITY: usize = 32;

/// Bounded FIFO of [`FrameAnalysis`] results, oldest first.
#[derive(Debug, Clone)]
pub struct AnalysisHistory {
    entries: VecDeque<FrameAnalysis>,
    capacity: usize,
}

impl AnalysisHistory {
    /// Create a history that retains at most `capacity` analyses.
    ///
    /// A capacity of zero is bumped to one so `push` always retains the
    /// most recent result.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an analysis, evicting the oldest entry when full.
    pub fn push(&mut self, analysis: FrameAnalysis) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(analysis);
    }

    /// Most recent analysis, if any.
    pub fn latest(&self) -> Option<&FrameAnalysis> {
        self.entries.back()
    }

    /// Iterate retained analyses from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &FrameAnalysis> {
        self.entries.iter()
    }

    /// Number of retained analyses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained analyses.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all retained analyses.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for AnalysisHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}
