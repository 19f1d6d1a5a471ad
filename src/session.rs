//! Reader session state.
//!
//! Holds the single live session: the chapter being read, its pages,
//! the current page index, the resolved next chapter and the load status.
//! Every load is tagged with a generation so results that arrive after the
//! session moved on can be recognised and dropped.

use crate::error::{FailureKind, SourceError};
use crate::source::{ChapterReference, LoadedChapter, PageDescriptor};
use log::debug;
use std::sync::Arc;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Ready,
    /// The chapter loaded successfully but has no pages.
    Empty,
    Failed(FailureKind),
}

impl SessionStatus {
    /// Returns true once the load attempt has resolved.
    pub fn is_settled(self) -> bool {
        !matches!(self, SessionStatus::Loading)
    }
}

/// Ticket for an in-flight chapter load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRequest {
    pub chapter_id: String,
    pub generation: u64,
}

/// Snapshot of the chapter currently being read.
#[derive(Debug, Clone)]
pub struct ReaderSession {
    chapter_id: String,
    pages: Arc<[PageDescriptor]>,
    current_index: usize,
    next_chapter: Option<ChapterReference>,
    status: SessionStatus,
}

impl ReaderSession {
    /// A session waiting for its pages.
    pub fn loading(chapter_id: impl Into<String>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            pages: Arc::from(Vec::new()),
            current_index: 0,
            next_chapter: None,
            status: SessionStatus::Loading,
        }
    }

    /// A session built from a successful load, positioned on the first page.
    pub fn loaded(chapter_id: impl Into<String>, chapter: LoadedChapter) -> Self {
        let status = if chapter.pages.is_empty() {
            SessionStatus::Empty
        } else {
            SessionStatus::Ready
        };

        Self {
            chapter_id: chapter_id.into(),
            pages: Arc::from(chapter.pages),
            current_index: 0,
            next_chapter: chapter.next_chapter,
            status,
        }
    }

    /// A session whose load failed.
    pub fn failed(chapter_id: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            status: SessionStatus::Failed(kind),
            ..Self::loading(chapter_id)
        }
    }

    pub fn chapter_id(&self) -> &str {
        &self.chapter_id
    }

    pub fn pages(&self) -> &[PageDescriptor] {
        &self.pages
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn next_chapter(&self) -> Option<&ChapterReference> {
        self.next_chapter.as_ref()
    }

    /// Current page index; only meaningful while `Ready`.
    pub fn current_index(&self) -> Option<usize> {
        (self.status == SessionStatus::Ready).then_some(self.current_index)
    }

    /// The page at the current index, while `Ready`.
    pub fn current_page(&self) -> Option<&PageDescriptor> {
        self.current_index().and_then(|i| self.pages.get(i))
    }

    /// Returns true when positioned on the final page.
    pub fn is_last_page(&self) -> bool {
        self.current_index()
            .is_some_and(|i| i + 1 == self.pages.len())
    }

    /// The same session moved to another page, sharing its page list.
    ///
    /// Returns `None` unless the session is `Ready` and `index` is in bounds.
    pub fn at_index(&self, index: usize) -> Option<Self> {
        if self.status != SessionStatus::Ready || index >= self.pages.len() {
            return None;
        }

        Some(Self {
            current_index: index,
            ..self.clone()
        })
    }
}

/// Owner of the live reader session.
#[derive(Debug)]
pub struct SessionState {
    session: ReaderSession,
    generation: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Creates a state with no chapter opened yet.
    pub fn new() -> Self {
        Self {
            session: ReaderSession::loading(String::new()),
            generation: 0,
        }
    }

    /// Read-only view of the live session.
    pub fn current(&self) -> &ReaderSession {
        &self.session
    }

    /// Generation of the live session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true when `request` still targets the live session.
    pub fn is_live(&self, request: &ChapterRequest) -> bool {
        request.generation == self.generation && request.chapter_id == self.session.chapter_id
    }

    /// Swaps the whole session at once.
    pub fn replace(&mut self, session: ReaderSession) {
        self.session = session;
    }

    /// Starts loading a chapter, discarding everything from the prior session.
    pub fn begin(&mut self, chapter_id: impl Into<String>) -> ChapterRequest {
        self.generation += 1;
        self.session = ReaderSession::loading(chapter_id);

        ChapterRequest {
            chapter_id: self.session.chapter_id.clone(),
            generation: self.generation,
        }
    }

    /// Applies the result of a chapter load.
    ///
    /// Results for a request that is no longer live, or for a session that
    /// already settled, are dropped and `false` is returned.
    pub fn apply(
        &mut self,
        request: &ChapterRequest,
        result: Result<LoadedChapter, SourceError>,
    ) -> bool {
        if !self.is_live(request) || self.session.status.is_settled() {
            debug!(
                "Dropping stale load result for {} (generation {}, live {})",
                request.chapter_id, request.generation, self.generation
            );
            return false;
        }

        let session = match result {
            Ok(chapter) => ReaderSession::loaded(&request.chapter_id, chapter),
            Err(err) => {
                debug!("Load of {} failed: {}", request.chapter_id, err);
                ReaderSession::failed(&request.chapter_id, err.kind())
            }
        };

        self.replace(session);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(urls: &[&str]) -> LoadedChapter {
        LoadedChapter::from_urls(urls.iter().copied(), None)
    }

    #[test]
    fn test_begin_clears_prior_session() {
        let mut state = SessionState::new();
        let request = state.begin("one");
        assert!(state.apply(&request, Ok(chapter(&["a", "b"]))));
        assert_eq!(state.current().pages().len(), 2);

        state.begin("two");
        let session = state.current();
        assert_eq!(session.chapter_id(), "two");
        assert_eq!(session.status(), SessionStatus::Loading);
        assert!(session.pages().is_empty());
        assert!(session.next_chapter().is_none());
        assert_eq!(session.current_index(), None);
    }

    #[test]
    fn test_apply_success_starts_at_first_page() {
        let mut state = SessionState::new();
        let request = state.begin("one");
        state.apply(&request, Ok(chapter(&["a", "b", "c"])));

        let session = state.current();
        assert_eq!(session.status(), SessionStatus::Ready);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.current_page().unwrap().url, "a");
    }

    #[test]
    fn test_apply_empty_is_not_failure() {
        let mut state = SessionState::new();
        let request = state.begin("one");
        state.apply(&request, Ok(chapter(&[])));

        assert_eq!(state.current().status(), SessionStatus::Empty);
        assert!(state.current().current_page().is_none());
    }

    #[test]
    fn test_apply_failure_exposes_kind() {
        let mut state = SessionState::new();
        let request = state.begin("missing");
        state.apply(
            &request,
            Err(SourceError::ChapterNotFound("missing".to_string())),
        );

        assert_eq!(
            state.current().status(),
            SessionStatus::Failed(FailureKind::ChapterNotFound)
        );
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let mut state = SessionState::new();
        let old = state.begin("one");
        let new = state.begin("two");

        assert!(!state.apply(&old, Ok(chapter(&["a"]))));
        assert_eq!(state.current().status(), SessionStatus::Loading);

        assert!(state.apply(&new, Ok(chapter(&["b"]))));
        assert_eq!(state.current().chapter_id(), "two");
    }

    #[test]
    fn test_same_chapter_reopened_drops_old_generation() {
        let mut state = SessionState::new();
        let first = state.begin("one");
        let second = state.begin("one");

        assert!(!state.apply(&first, Err(SourceError::Unavailable("x".into()))));
        assert!(state.apply(&second, Ok(chapter(&["a"]))));
        assert_eq!(state.current().status(), SessionStatus::Ready);
    }

    #[test]
    fn test_settled_session_ignores_duplicate_apply() {
        let mut state = SessionState::new();
        let request = state.begin("one");
        assert!(state.apply(&request, Ok(chapter(&["a"]))));
        assert!(!state.apply(&request, Ok(chapter(&["x", "y"]))));
        assert_eq!(state.current().pages().len(), 1);
    }

    #[test]
    fn test_at_index_bounds() {
        let session = ReaderSession::loaded("one", chapter(&["a", "b"]));
        assert_eq!(session.at_index(1).unwrap().current_index(), Some(1));
        assert!(session.at_index(2).is_none());

        let loading = ReaderSession::loading("two");
        assert!(loading.at_index(0).is_none());
    }

    #[test]
    fn test_at_index_shares_pages() {
        let session = ReaderSession::loaded("one", chapter(&["a", "b"]));
        let moved = session.at_index(1).unwrap();
        assert!(Arc::ptr_eq(&session.pages, &moved.pages));
    }
}
