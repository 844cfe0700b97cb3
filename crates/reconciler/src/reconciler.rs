//! The reconciliation orchestrator.
//!
//! One invocation: initialize conditions, resolve the sink, converge the
//! emitter deployment, propagate its availability, converge event types, then
//! persist status. Failures stop the pipeline; conditions marked by earlier
//! steps stay in place. Everything here is safe to repeat: a second run with
//! no external change writes nothing.

use std::sync::Arc;

use chrono::Utc;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use beacon_core::{is_controlled_by, BeaconSource, BeaconSourceStatus, OwnerIdentity};

use crate::convergence::converge_deployment;
use crate::diff::compute_diff;
use crate::error::{ReconcileError, Result};
use crate::notify::{Note, Notifier};
use crate::resources::{self, EmitterArgs};
use crate::sink::SinkResolver;
use crate::stores::{DeploymentStore, EventTypeStore, SourceStore};

pub struct Reconciler {
    emitter_image: String,
    sources: Arc<dyn SourceStore>,
    deployments: Arc<dyn DeploymentStore>,
    event_types: Arc<dyn EventTypeStore>,
    resolver: Arc<dyn SinkResolver>,
    notifier: Arc<dyn Notifier>,
}

impl Reconciler {
    pub fn new(
        emitter_image: impl Into<String>,
        sources: Arc<dyn SourceStore>,
        deployments: Arc<dyn DeploymentStore>,
        event_types: Arc<dyn EventTypeStore>,
        resolver: Arc<dyn SinkResolver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            emitter_image: emitter_image.into(),
            sources,
            deployments,
            event_types,
            resolver,
            notifier,
        }
    }

    /// Reconcile the source with the given identity. Always re-reads current
    /// state; never trusts anything cached from a previous run.
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<()> {
        counter!("beacon_reconcile_total", 1u64);

        let Some(original) = self.sources.get(namespace, name).await? else {
            // Deleted while queued; nothing to do and nothing to write.
            debug!(namespace, name, "beacon source no longer exists");
            return Ok(());
        };

        let mut source = original.clone();
        let outcome = self.reconcile_source(&mut source).await;
        match &outcome {
            Ok(()) => {
                debug!(namespace, name, "beacon source reconciled");
                self.notifier.notify(
                    &source,
                    Note::Reconciled,
                    &format!("BeaconSource reconciled: \"{namespace}/{name}\""),
                );
            }
            Err(e) => warn!(namespace, name, error = %e, "error reconciling beacon source"),
        }

        // Status is persisted regardless of the reconcile outcome.
        if let Err(status_err) = self.update_status(&source).await {
            warn!(namespace, name, error = %status_err, "failed to update beacon source status");
            self.notifier.notify(
                &source,
                Note::UpdateStatusFailed,
                &format!("Failed to update BeaconSource's status: {status_err}"),
            );
            counter!("beacon_reconcile_errors_total", 1u64);
            return Err(status_err);
        }

        if outcome.is_err() {
            counter!("beacon_reconcile_errors_total", 1u64);
        }
        outcome
    }

    async fn reconcile_source(&self, source: &mut BeaconSource) -> Result<()> {
        status_mut(source).initialize_conditions();

        let Some(sink) = source.spec.sink.clone() else {
            status_mut(source).mark_no_sink("SinkMissing", "");
            return Err(ReconcileError::SinkMissing);
        };

        let namespace = source.namespace().unwrap_or_default();
        let destination = sink.with_default_namespace(&namespace);
        let sink_uri = match self.resolver.resolve(&destination, source).await {
            Ok(uri) => uri,
            Err(e) => {
                status_mut(source).mark_no_sink("NotFound", "");
                return Err(e.into());
            }
        };
        if sink.uses_deprecated_ref() {
            status_mut(source).mark_sink_warn_ref_deprecated(&sink_uri);
        } else {
            status_mut(source).mark_sink(&sink_uri);
        }

        let emitter = self.converge_emitter(source, &sink_uri).await?;
        status_mut(source).propagate_deployment_availability(&emitter);

        if let Err(e) = self.converge_event_types(source).await {
            status_mut(source).mark_no_event_types("EventTypesReconcileFailed", "");
            return Err(e);
        }
        status_mut(source).mark_event_types();

        Ok(())
    }

    async fn converge_emitter(
        &self,
        source: &BeaconSource,
        sink_uri: &str,
    ) -> Result<k8s_openapi::api::apps::v1::Deployment> {
        let name = source.name();
        let desired = resources::make_emitter(&EmitterArgs {
            source,
            event_source: resources::event_source(&source.namespace().unwrap_or_default(), &name),
            image: self.emitter_image.clone(),
            labels: resources::labels(&name),
            sink_uri: sink_uri.to_string(),
        });
        converge_deployment(self.deployments.as_ref(), self.notifier.as_ref(), source, desired)
            .await
    }

    /// Synchronize EventType descriptors: list what exists (ours only), diff
    /// against the declared set, apply deletes before creates. The first
    /// failing operation aborts the rest and propagates.
    async fn converge_event_types(&self, source: &BeaconSource) -> Result<()> {
        let namespace = source.namespace().unwrap_or_default();
        let selector = resources::label_selector(&source.name());
        let current: Vec<_> = self
            .event_types
            .list(&namespace, &selector)
            .await?
            .into_iter()
            .filter(|et| is_controlled_by(&et.metadata, source))
            .collect();
        let desired = resources::make_event_types(source);

        let (to_create, to_delete) = compute_diff(&current, &desired);
        for event_type in &to_delete {
            let name = event_type.metadata.name.as_deref().unwrap_or_default();
            self.event_types.delete(&namespace, name).await?;
        }
        for event_type in &to_create {
            self.event_types.create(&namespace, event_type).await?;
        }
        Ok(())
    }

    /// Persist the status if it changed. A not-ready→ready flip of the
    /// *persisted* status is reported exactly once, with the time elapsed
    /// since the resource was created.
    async fn update_status(&self, desired: &BeaconSource) -> Result<BeaconSource> {
        let namespace = desired.namespace().unwrap_or_default();
        let name = desired.name();
        let Some(existing) = self.sources.get(&namespace, &name).await? else {
            debug!(namespace = %namespace, name = %name, "beacon source vanished before status write");
            return Ok(desired.clone());
        };

        if existing.status == desired.status {
            return Ok(existing);
        }

        let was_ready = existing
            .status
            .as_ref()
            .map(BeaconSourceStatus::is_ready)
            .unwrap_or(false);
        let becomes_ready = !was_ready
            && desired
                .status
                .as_ref()
                .map(BeaconSourceStatus::is_ready)
                .unwrap_or(false);

        let mut updated = existing;
        updated.status = desired.status.clone();
        let written = self.sources.update_status(&updated).await?;

        if becomes_ready {
            let elapsed_seconds = written
                .metadata
                .creation_timestamp
                .as_ref()
                .map(|t| (Utc::now() - t.0).num_milliseconds() as f64 / 1000.0)
                .unwrap_or_default();
            info!(name = %name, elapsed_seconds, "beacon source became ready");
            self.notifier.notify(
                &written,
                Note::ReadinessChanged,
                &format!("BeaconSource \"{name}\" became ready"),
            );
            histogram!("beacon_source_ready_seconds", elapsed_seconds.max(0.0));
        }

        Ok(written)
    }
}

fn status_mut(source: &mut BeaconSource) -> &mut BeaconSourceStatus {
    source.status.get_or_insert_with(Default::default)
}
