//! Builder for the EventType descriptors a BeaconSource announces.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use beacon_core::{controller_reference, BeaconSource, EventType, EventTypeSpec, OwnerIdentity};

use super::{event_source, labels};

pub const TICK_EVENT_TYPE: &str = "dev.beacon.tick";
pub const HEARTBEAT_EVENT_TYPE: &str = "dev.beacon.heartbeat";

/// Event types every BeaconSource announces. Fixed at build time.
pub const SOURCE_EVENT_TYPES: &[&str] = &[TICK_EVENT_TYPE, HEARTBEAT_EVENT_TYPE];

/// Desired descriptor set for a source. Non-empty only for Broker sinks: when
/// the sink moved away from a Broker, the empty result makes the diff delete
/// whatever descriptors still exist.
pub fn make_event_types(source: &BeaconSource) -> Vec<EventType> {
    let broker = match source
        .spec
        .sink
        .as_ref()
        .and_then(|sink| sink.resolved_ref())
    {
        Some(reference) if reference.kind == "Broker" => reference.name,
        _ => return Vec::new(),
    };
    let origin = event_source(
        &source.namespace().unwrap_or_default(),
        &source.name(),
    );
    SOURCE_EVENT_TYPES
        .iter()
        .map(|type_| make_event_type(source, type_, &origin, &broker))
        .collect()
}

fn make_event_type(source: &BeaconSource, type_: &str, origin: &str, broker: &str) -> EventType {
    let source_name = source.name();
    EventType {
        metadata: ObjectMeta {
            generate_name: Some(format!("{source_name}-")),
            namespace: source.namespace(),
            labels: Some(labels(&source_name)),
            owner_references: Some(vec![controller_reference(source)]),
            ..Default::default()
        },
        spec: EventTypeSpec {
            type_: type_.to_string(),
            source: origin.to_string(),
            schema: None,
            broker: broker.to_string(),
            description: None,
        },
    }
}
