//! Sync error types.

use thiserror::Error;

use crate::repo::RepoError;

/// Errors surfaced by explicit save calls.
///
/// The background loop never returns these to a caller; persistence
/// failures there only show up as status transitions.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("save failed: {0}")]
    Save(#[from] RepoError),
}
