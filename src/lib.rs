//! Yomikomi - paginated manga chapter reader.
//!
//! This library provides:
//! - Page sources that resolve a chapter into ordered pages and its successor (MangaDex)
//! - A reader session with staleness-guarded chapter loads
//! - A navigation engine for page turns, overlay toggling and next-chapter transitions
//! - A read-only view projection for front ends

pub mod config;
pub mod console;
pub mod error;
pub mod load_status;
pub mod navigation;
pub mod session;
pub mod source;
pub mod view;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use error::{ConfigError, FailureKind, SourceError};
pub use load_status::{LoadStatus, LoadStatusTracker};
pub use navigation::{Intent, Navigation, NavigationEngine, PageTicket, classify_tap_zone};
pub use session::{ChapterRequest, ReaderSession, SessionState, SessionStatus};
pub use source::{
    ChapterReference, LoadOptions, LoadedChapter, MangaDexSource, PageDescriptor, PageSource,
};
pub use view::ReaderView;
