//! Set diff for EventType descriptors.
//!
//! Pure and deterministic: output order follows input slice order, never map
//! iteration order, so repeated runs over the same inputs are reproducible.

use std::collections::{HashMap, HashSet};

use beacon_core::EventType;

/// Identity of a descriptor. Two descriptors with the same key describe the
/// same announcement even if their object names differ.
pub fn descriptor_key(event_type: &EventType) -> String {
    format!(
        "{}_{}_{}_{}",
        event_type.spec.type_,
        event_type.spec.source,
        event_type.spec.schema.as_deref().unwrap_or_default(),
        event_type.spec.broker
    )
}

/// Compute `(to_create, to_delete)` between the current and desired sets.
///
/// A desired descriptor whose key exists but whose payload differs is a
/// replacement: the existing object is deleted and the new one created.
/// Descriptors are never patched in place. Callers must apply deletions
/// before creations so a replaced key cannot collide with itself.
pub fn compute_diff(
    current: &[EventType],
    desired: &[EventType],
) -> (Vec<EventType>, Vec<EventType>) {
    let current_by_key: HashMap<String, &EventType> = current
        .iter()
        .map(|et| (descriptor_key(et), et))
        .collect();
    let desired_keys: HashSet<String> = desired.iter().map(descriptor_key).collect();

    let mut to_create = Vec::new();
    let mut to_delete = Vec::new();

    for wanted in desired {
        match current_by_key.get(&descriptor_key(wanted)) {
            None => to_create.push(wanted.clone()),
            Some(existing) if existing.spec != wanted.spec => {
                to_delete.push((*existing).clone());
                to_create.push(wanted.clone());
            }
            Some(_) => {}
        }
    }
    for existing in current {
        if !desired_keys.contains(&descriptor_key(existing)) {
            to_delete.push(existing.clone());
        }
    }
    (to_create, to_delete)
}
