//! Filesystem-facing services shared by the pipeline stages

pub mod io;
pub mod janitor;
pub mod storage;

pub use io::ImageIOService;
pub use janitor::{CleanupReport, Janitor};
pub use storage::{StorageLayout, StoredKind, ALLOWED_EXTENSIONS};
