//! Beacon reconciliation engine.
//!
//! Drives a BeaconSource toward its desired state: one emitter deployment
//! converged against the computed spec, and a set of EventType descriptors
//! synchronized by a deterministic diff. Collaborators (stores, resolver,
//! notifier) are traits so the engine stays testable without a cluster.

#![forbid(unsafe_code)]

pub mod convergence;
pub mod diff;
mod error;
pub mod notify;
mod reconciler;
pub mod resources;
pub mod sink;
pub mod stores;

pub use error::{ReconcileError, Result};
pub use notify::{KubeNotifier, Note, Notifier};
pub use reconciler::Reconciler;
pub use sink::{ClusterSinkResolver, ResolveError, SinkResolver};
pub use stores::{
    DeploymentStore, EventTypeStore, KubeDeploymentStore, KubeEventTypeStore, KubeSourceStore,
    SourceStore,
};
