pub mod db;
pub mod overlay_db;
pub mod retry;

pub use db::DbAdapter;
pub use overlay_db::{SqliteOverlayDirectory, SqliteOverlayStore};
pub use retry::{RetryPolicy, RetryingEntitySource};
