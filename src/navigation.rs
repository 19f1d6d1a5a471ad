//! Navigation engine for the paginated reader.
//!
//! Interprets previous/next/overlay input against the live session,
//! enforces page boundaries and starts next-chapter loads. Input handling
//! is synchronous; only chapter loads suspend, and their results are
//! applied through [`NavigationEngine::apply`], which drops anything stale.

use crate::error::SourceError;
use crate::load_status::LoadStatusTracker;
use crate::session::{ChapterRequest, ReaderSession, SessionState, SessionStatus};
use crate::source::{LoadOptions, LoadedChapter, PageSource};
use crate::view::ReaderView;
use futures::future::BoxFuture;
use log::debug;
use std::sync::Arc;

/// A classified user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Retreat,
    Advance,
    ToggleOverlay,
}

/// Maps a tap on the viewing surface to an intent.
///
/// Left third retreats, right third advances, everything else (including
/// the exact boundaries) toggles the overlay.
pub fn classify_tap_zone(x: f64, width: f64) -> Intent {
    if !(width.is_finite() && width > 0.0) || !x.is_finite() {
        return Intent::ToggleOverlay;
    }

    let third = width / 3.0;
    if x < third {
        Intent::Retreat
    } else if x > third * 2.0 {
        Intent::Advance
    } else {
        Intent::ToggleOverlay
    }
}

/// Outcome of handling an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Moved to the page at this index.
    Moved(usize),
    /// A next-chapter load was started; the caller must fetch and apply it.
    ChapterRequested(ChapterRequest),
    /// Overlay visibility after the toggle.
    OverlayToggled(bool),
    /// At a boundary or nothing to navigate; state unchanged.
    Unchanged,
    /// A chapter load is in flight; input dropped.
    Ignored,
}

/// Identifies a page asset of a specific session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub index: usize,
}

/// Drives a reading session over a page source.
pub struct NavigationEngine<S: PageSource + ?Sized> {
    source: Arc<S>,
    options: LoadOptions,
    state: SessionState,
    tracker: LoadStatusTracker,
    overlay_visible: bool,
}

impl<S: PageSource + ?Sized + 'static> NavigationEngine<S> {
    /// Creates an engine with no chapter opened.
    pub fn new(source: Arc<S>, options: LoadOptions) -> Self {
        Self {
            source,
            options,
            state: SessionState::new(),
            tracker: LoadStatusTracker::new(),
            overlay_visible: true,
        }
    }

    /// The live session.
    pub fn session(&self) -> &ReaderSession {
        self.state.current()
    }

    pub fn is_overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Projection for the presentation layer.
    pub fn view(&self) -> ReaderView {
        ReaderView::project(self.state.current(), &self.tracker, self.overlay_visible)
    }

    /// Opens a chapter, replacing whatever session was live.
    pub fn open(&mut self, chapter_id: impl Into<String>) -> ChapterRequest {
        let request = self.state.begin(chapter_id);
        debug!(
            "Opening chapter {} (generation {})",
            request.chapter_id, request.generation
        );
        request
    }

    /// Re-requests the current chapter after a failed load.
    pub fn retry(&mut self) -> Option<ChapterRequest> {
        let session = self.state.current();
        if !matches!(session.status(), SessionStatus::Failed(_)) {
            return None;
        }

        let chapter_id = session.chapter_id().to_string();
        Some(self.open(chapter_id))
    }

    /// Starts fetching the chapter named by `request`.
    ///
    /// The returned future owns everything it needs, so it can be spawned
    /// while input keeps being handled.
    pub fn fetch(
        &self,
        request: &ChapterRequest,
    ) -> BoxFuture<'static, Result<LoadedChapter, SourceError>> {
        let source = Arc::clone(&self.source);
        let options = self.options.clone();
        let chapter_id = request.chapter_id.clone();

        Box::pin(async move { source.load_chapter(&chapter_id, &options).await })
    }

    /// Applies a finished load. Returns false when the result was stale.
    pub fn apply(
        &mut self,
        request: &ChapterRequest,
        result: Result<LoadedChapter, SourceError>,
    ) -> bool {
        if !self.state.apply(request, result) {
            return false;
        }

        if let Some(index) = self.state.current().current_index() {
            self.tracker.on_index_changed(index);
        }
        true
    }

    /// Fetches and applies a chapter load in one step.
    pub async fn load(&mut self, request: ChapterRequest) -> bool {
        let result = self.fetch(&request).await;
        self.apply(&request, result)
    }

    /// Moves to the next page, or into the next chapter from the last page.
    pub fn advance(&mut self) -> Navigation {
        let session = self.state.current();
        let index = match session.status() {
            SessionStatus::Loading => return Navigation::Ignored,
            SessionStatus::Ready => session.current_index().unwrap_or_default(),
            SessionStatus::Empty | SessionStatus::Failed(_) => return Navigation::Unchanged,
        };

        if let Some(moved) = session.at_index(index + 1) {
            return self.move_to(moved, index + 1);
        }

        match session.next_chapter() {
            Some(next) => {
                let chapter_id = next.id.clone();
                Navigation::ChapterRequested(self.open(chapter_id))
            }
            None => Navigation::Unchanged,
        }
    }

    /// Moves to the previous page. Never leaves the chapter.
    pub fn retreat(&mut self) -> Navigation {
        let session = self.state.current();
        let index = match session.status() {
            SessionStatus::Loading => return Navigation::Ignored,
            SessionStatus::Ready => session.current_index().unwrap_or_default(),
            SessionStatus::Empty | SessionStatus::Failed(_) => return Navigation::Unchanged,
        };

        match index.checked_sub(1).and_then(|prev| session.at_index(prev)) {
            Some(moved) => self.move_to(moved, index - 1),
            None => Navigation::Unchanged,
        }
    }

    /// Shows or hides the overlay. Pagination is untouched.
    pub fn toggle_overlay(&mut self) -> bool {
        self.overlay_visible = !self.overlay_visible;
        self.overlay_visible
    }

    /// Dispatches a classified intent.
    pub fn handle(&mut self, intent: Intent) -> Navigation {
        match intent {
            Intent::Retreat => self.retreat(),
            Intent::Advance => self.advance(),
            Intent::ToggleOverlay => Navigation::OverlayToggled(self.toggle_overlay()),
        }
    }

    /// Handles a tap at `x` on a surface `width` wide.
    pub fn tap(&mut self, x: f64, width: f64) -> Navigation {
        self.handle(classify_tap_zone(x, width))
    }

    /// Ticket for the page currently shown, to confirm its asset later.
    pub fn page_ticket(&self) -> Option<PageTicket> {
        self.state.current().current_index().map(|index| PageTicket {
            generation: self.state.generation(),
            index,
        })
    }

    /// Confirms that a page asset finished loading.
    ///
    /// Confirmations for another session or another page are discarded.
    pub fn confirm_asset(&mut self, ticket: PageTicket) -> bool {
        if ticket.generation != self.state.generation()
            || self.state.current().status() != SessionStatus::Ready
        {
            return false;
        }
        self.tracker.on_asset_loaded(ticket.index)
    }

    fn move_to(&mut self, session: ReaderSession, index: usize) -> Navigation {
        self.state.replace(session);
        self.tracker.on_index_changed(index);
        Navigation::Moved(index)
    }
}
