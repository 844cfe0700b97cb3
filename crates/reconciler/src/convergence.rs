//! Emitter deployment convergence: no-op, create, or update.
//!
//! Drift detection deliberately composes two asymmetric checks. The desired
//! pod spec must be a structural subset of the existing one (the cluster may
//! add defaults we did not set), but environment variable lists must match
//! exactly per container, because a subset check cannot see a removed entry.
//! Do not fold these into one generic deep-equal.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::PodSpec;
use serde_json::Value as Json;
use tracing::debug;

use beacon_core::{is_controlled_by, BeaconSource, OwnerIdentity};

use crate::error::{ReconcileError, Result};
use crate::notify::{Note, Notifier};
use crate::resources::label_selector;
use crate::stores::DeploymentStore;

/// Converge the emitter toward `desired` and return the live deployment; the
/// return value is the sole input to availability propagation.
pub async fn converge_deployment(
    deployments: &dyn DeploymentStore,
    notifier: &dyn Notifier,
    source: &BeaconSource,
    desired: Deployment,
) -> Result<Deployment> {
    let namespace = desired.metadata.namespace.clone().unwrap_or_default();
    let name = desired.metadata.name.clone().unwrap_or_default();

    let existing = match deployments.get(&namespace, &name).await? {
        Some(found) => Some(found),
        None => discover_owned(deployments, &namespace, source).await?,
    };

    let Some(mut existing) = existing else {
        let created = deployments.create(&namespace, &desired).await?;
        notifier.notify(
            source,
            Note::DeploymentCreated,
            &format!("Deployment \"{name}\" created"),
        );
        return Ok(created);
    };

    if !is_controlled_by(&existing.metadata, source) {
        return Err(ReconcileError::OwnershipConflict {
            name: existing.metadata.name.clone().unwrap_or_default(),
            owner: source.name(),
        });
    }

    let desired_pod = desired.spec.as_ref().and_then(|s| s.template.spec.as_ref());
    let existing_pod = existing.spec.as_ref().and_then(|s| s.template.spec.as_ref());
    if pod_spec_changed(desired_pod, existing_pod)? {
        if existing.spec.is_none() {
            existing.spec = desired.spec.clone();
        } else if let (Some(existing_spec), Some(desired_spec)) =
            (existing.spec.as_mut(), desired.spec.as_ref())
        {
            existing_spec.template.spec = desired_spec.template.spec.clone();
        }
        let updated = deployments.update(&namespace, &existing).await?;
        notifier.notify(
            source,
            Note::DeploymentUpdated,
            &format!("Deployment \"{name}\" updated"),
        );
        return Ok(updated);
    }

    debug!(deployment = %name, "reusing existing emitter deployment");
    Ok(existing)
}

/// Fallback discovery: deployments carrying the source's labels, filtered to
/// the one this source actually controls.
async fn discover_owned(
    deployments: &dyn DeploymentStore,
    namespace: &str,
    source: &BeaconSource,
) -> Result<Option<Deployment>> {
    let selector = label_selector(&source.name());
    let owned = deployments.list_owned(namespace, &selector).await?;
    Ok(owned
        .into_iter()
        .find(|d| is_controlled_by(&d.metadata, source)))
}

/// Two-part drift test described in the module docs.
pub fn pod_spec_changed(desired: Option<&PodSpec>, existing: Option<&PodSpec>) -> Result<bool> {
    let (desired, existing) = match (desired, existing) {
        (None, _) => return Ok(false),
        (Some(_), None) => return Ok(true),
        (Some(d), Some(e)) => (d, e),
    };
    let desired_json = serde_json::to_value(desired)?;
    let existing_json = serde_json::to_value(existing)?;
    if !is_structural_subset(&desired_json, &existing_json) {
        return Ok(true);
    }
    Ok(!is_exact_env_match(desired, existing))
}

/// Whether every field present in `desired` matches `existing`. Fields only
/// the cluster set are ignored; empty desired collections are ignored too, so
/// this check alone cannot notice removals.
pub fn is_structural_subset(desired: &Json, existing: &Json) -> bool {
    match (desired, existing) {
        (Json::Null, _) => true,
        (Json::Object(desired), Json::Object(existing)) => desired.iter().all(|(key, value)| {
            value.is_null()
                || existing
                    .get(key)
                    .map(|e| is_structural_subset(value, e))
                    .unwrap_or(false)
        }),
        (Json::Array(desired), Json::Array(existing)) => {
            desired.is_empty()
                || (desired.len() == existing.len()
                    && desired
                        .iter()
                        .zip(existing)
                        .all(|(d, e)| is_structural_subset(d, e)))
        }
        (desired, existing) => desired == existing,
    }
}

/// Element-for-element equality of every container's env list.
pub fn is_exact_env_match(desired: &PodSpec, existing: &PodSpec) -> bool {
    desired.containers.len() == existing.containers.len()
        && desired
            .containers
            .iter()
            .zip(&existing.containers)
            .all(|(d, e)| d.env == e.env)
}
