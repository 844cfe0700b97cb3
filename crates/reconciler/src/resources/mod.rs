//! Desired-state builders for the resources a BeaconSource owns.

mod deployment;
mod eventtype;

pub use deployment::{make_emitter, EmitterArgs, EMITTER_CONTAINER};
pub use eventtype::{make_event_types, HEARTBEAT_EVENT_TYPE, SOURCE_EVENT_TYPES, TICK_EVENT_TYPE};

use std::collections::BTreeMap;

pub const SOURCE_LABEL_KEY: &str = "sources.beacon.dev/source";
pub const MANAGED_BY_LABEL_KEY: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY: &str = "beacon-operator";

/// Kubernetes object names cap out at 63 characters for workloads.
const MAX_NAME_LEN: usize = 63;

/// Deterministic emitter deployment name for an owner: at most one per owner.
pub fn emitter_name(source_name: &str) -> String {
    clamp_name(format!("beaconsource-{source_name}"))
}

/// Labels stamped on every child of the named source.
pub fn labels(source_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (SOURCE_LABEL_KEY.to_string(), source_name.to_string()),
        (MANAGED_BY_LABEL_KEY.to_string(), MANAGED_BY.to_string()),
    ])
}

/// Selector matching the labels above, for list-based child discovery.
pub fn label_selector(source_name: &str) -> String {
    format!("{SOURCE_LABEL_KEY}={source_name}")
}

/// CloudEvents source attribute for a BeaconSource.
pub fn event_source(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

fn clamp_name(mut name: String) -> String {
    if name.len() > MAX_NAME_LEN {
        name.truncate(MAX_NAME_LEN);
        while name.ends_with('-') {
            name.pop();
        }
    }
    name
}
