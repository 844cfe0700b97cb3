//! The EventType custom resource: a descriptor announcing one category of
//! event a source may emit into a broker.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// EventType descriptors are identified by (type, source, schema, broker).
/// They are replaced, never patched: a payload change deletes the old
/// descriptor and creates a new one.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "eventing.beacon.dev",
    version = "v1alpha1",
    kind = "EventType",
    plural = "eventtypes",
    namespaced,
    printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.type"}"#,
    printcolumn = r#"{"name":"Source", "type":"string", "jsonPath":".spec.source"}"#,
    printcolumn = r#"{"name":"Broker", "type":"string", "jsonPath":".spec.broker"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeSpec {
    /// CloudEvents type attribute, e.g. "dev.beacon.tick".
    #[serde(rename = "type")]
    pub type_: String,
    /// CloudEvents source attribute, "namespace/name" of the owning source.
    pub source: String,
    /// URI of the schema the event payload conforms to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Broker the events are delivered to.
    pub broker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
