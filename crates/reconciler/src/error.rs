//! Reconcile error taxonomy.

use crate::sink::ResolveError;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The source has no destination configured at all.
    #[error("spec.sink missing")]
    SinkMissing,
    /// The configured destination could not be resolved to a URI.
    #[error("resolving sink: {0}")]
    Resolve(#[from] ResolveError),
    /// A child resource exists but is controlled by someone else. Never
    /// adopted or overwritten.
    #[error("deployment {name:?} is not owned by BeaconSource {owner:?}")]
    OwnershipConflict { name: String, owner: String },
    #[error("kube api: {0}")]
    Kube(#[from] kube::Error),
    #[error("serializing object: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReconcileError {
    /// Terminal errors will not clear up on their own; the scheduler should
    /// back off rather than hot-retry them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReconcileError::SinkMissing
                | ReconcileError::OwnershipConflict { .. }
                | ReconcileError::Resolve(ResolveError::NotFound(_))
        )
    }
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
