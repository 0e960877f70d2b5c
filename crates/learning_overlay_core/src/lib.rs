pub mod domain;
pub mod memory;
pub mod notifications;
pub mod overlay;
pub mod ports;
pub mod progress;
pub mod quiz;
pub mod saved;
pub mod search;
pub mod sequence;

pub use domain::{
    Article, Chapter, ChapterView, Course, CourseDetail, CourseView, Notification, NotificationKind, Quiz,
    QuizQuestion,
};
pub use memory::{MemoryOverlayDirectory, MemoryOverlayStore};
pub use overlay::OverlayKey;
pub use ports::{EntitySource, OverlayDirectory, OverlayStore, PortError, PortResult};
pub use progress::{compute_progress, in_progress, ProgressOrder};
pub use saved::{annotate_saved, toggle_saved, ToggleOutcome};
pub use search::{highlight, search, HighlightSegment, SearchHit};
pub use sequence::{RequestSequencer, RequestTicket};
