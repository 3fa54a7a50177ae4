//! Content store for persisting admitted payloads.
//!
//! The worker pool writes each job's payload through a [`ContentStore`] under
//! a collision-avoiding name, and asks the store where the matching preview
//! should go. [`FsContentStore`] keeps both under configured directories.

mod error;
mod fs_store;
mod traits;

pub use error::StoreError;
pub use fs_store::{sanitize_filename, stored_file_name, FsContentStore};
pub use traits::{ContentStore, StoredContent};
