//! Read-only projection of the reader for the presentation layer.

use crate::load_status::LoadStatusTracker;
use crate::session::{ReaderSession, SessionStatus};
use crate::source::{ChapterReference, PageDescriptor};

/// Everything a front end needs to draw one frame of the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderView {
    pub chapter_id: String,
    pub status: SessionStatus,
    /// Page to display; `None` unless the session is ready.
    pub current_page: Option<PageDescriptor>,
    /// 1-based page number, 0 when there is no page to show.
    pub page_number: usize,
    pub total_pages: usize,
    pub is_busy: bool,
    pub is_overlay_visible: bool,
    /// Advancing would move to another page or chapter.
    pub can_advance: bool,
    /// On the last page and a next chapter is known.
    pub has_next_chapter_at_end: bool,
    pub next_chapter: Option<ChapterReference>,
}

impl ReaderView {
    pub(crate) fn project(
        session: &ReaderSession,
        tracker: &LoadStatusTracker,
        overlay_visible: bool,
    ) -> Self {
        let status = session.status();
        let current_page = session.current_page().cloned();
        let page_number = current_page.as_ref().map_or(0, |page| page.index + 1);
        let total_pages = session.pages().len();
        let has_next = session.next_chapter().is_some();
        let is_last = session.is_last_page();

        let is_busy = match status {
            SessionStatus::Loading => true,
            SessionStatus::Ready => tracker.is_busy(),
            SessionStatus::Empty | SessionStatus::Failed(_) => false,
        };

        Self {
            chapter_id: session.chapter_id().to_string(),
            status,
            current_page,
            page_number,
            total_pages,
            is_busy,
            is_overlay_visible: overlay_visible,
            can_advance: status == SessionStatus::Ready && (!is_last || has_next),
            has_next_chapter_at_end: is_last && has_next,
            next_chapter: session.next_chapter().cloned(),
        }
    }

    /// Reading progress through the chapter, 0 to 100.
    pub fn progress_percent(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        self.page_number as f64 / self.total_pages as f64 * 100.0
    }
}
