//! Load status of the visible page.
//!
//! The presentation layer reports when a page asset finished loading;
//! the tracker turns that into a busy flag for the page currently shown.

/// Whether the current page's asset has finished loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Pending,
    Complete,
}

/// Tracks asset completion for the current page index.
///
/// No timeout is applied; an asset that never completes leaves the
/// tracker busy until the index changes.
#[derive(Debug, Clone, Default)]
pub struct LoadStatusTracker {
    index: usize,
    status: LoadStatus,
}

impl LoadStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The page index now being shown; resets to pending.
    pub fn on_index_changed(&mut self, index: usize) {
        self.index = index;
        self.status = LoadStatus::Pending;
    }

    /// Records that the asset for `index` finished loading.
    ///
    /// Returns false and changes nothing when `index` is not the page
    /// being shown.
    pub fn on_asset_loaded(&mut self, index: usize) -> bool {
        if index != self.index {
            return false;
        }

        self.status = LoadStatus::Complete;
        true
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.status == LoadStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_busy() {
        let tracker = LoadStatusTracker::new();
        assert!(tracker.is_busy());
    }

    #[test]
    fn test_confirmation_for_current_index() {
        let mut tracker = LoadStatusTracker::new();
        tracker.on_index_changed(3);
        assert!(tracker.on_asset_loaded(3));
        assert_eq!(tracker.status(), LoadStatus::Complete);
        assert!(!tracker.is_busy());
    }

    #[test]
    fn test_stale_confirmation_discarded() {
        let mut tracker = LoadStatusTracker::new();
        tracker.on_index_changed(1);
        tracker.on_index_changed(2);

        assert!(!tracker.on_asset_loaded(1));
        assert!(tracker.is_busy());
    }

    #[test]
    fn test_index_change_resets_completion() {
        let mut tracker = LoadStatusTracker::new();
        tracker.on_index_changed(0);
        tracker.on_asset_loaded(0);
        tracker.on_index_changed(1);
        assert_eq!(tracker.status(), LoadStatus::Pending);
    }
}
