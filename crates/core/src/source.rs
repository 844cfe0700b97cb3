//! The BeaconSource custom resource: a declarative source of periodic events.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::owner::OwnerIdentity;
use crate::status::BeaconSourceStatus;

/// BeaconSource runs an emitter deployment that sends periodic events to a
/// resolved sink, and announces the event types it produces.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "sources.beacon.dev",
    version = "v1alpha1",
    kind = "BeaconSource",
    plural = "beaconsources",
    namespaced,
    status = "BeaconSourceStatus",
    printcolumn = r#"{"name":"Sink", "type":"string", "jsonPath":".status.sinkUri"}"#,
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BeaconSourceSpec {
    /// Destination that receives the emitted events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<Destination>,
    /// Textual interval between emitted events, e.g. "10s". Passed to the
    /// emitter verbatim; the controller does not interpret it.
    pub interval: String,
    /// Service account the emitter deployment runs under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

/// Reference to the object (or legacy inline fields) events are delivered to.
///
/// The inline `apiVersion`/`kind`/`name`/`namespace` fields are the deprecated
/// way of addressing a destination; `ref` is the current shape. Exactly one of
/// the two shapes is expected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    /// Deprecated: use `ref` instead.
    #[serde(default, rename = "apiVersion", skip_serializing_if = "Option::is_none")]
    pub deprecated_api_version: Option<String>,
    /// Deprecated: use `ref` instead.
    #[serde(default, rename = "kind", skip_serializing_if = "Option::is_none")]
    pub deprecated_kind: Option<String>,
    /// Deprecated: use `ref` instead.
    #[serde(default, rename = "name", skip_serializing_if = "Option::is_none")]
    pub deprecated_name: Option<String>,
    /// Deprecated: use `ref` instead.
    #[serde(default, rename = "namespace", skip_serializing_if = "Option::is_none")]
    pub deprecated_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Destination {
    /// Whether the destination is addressed through the deprecated inline
    /// fields rather than `ref`.
    pub fn uses_deprecated_ref(&self) -> bool {
        self.reference.is_none()
            && self.deprecated_api_version.is_some()
            && self.deprecated_kind.is_some()
            && self.deprecated_name.is_some()
    }

    /// The effective object reference, regardless of which shape was used.
    pub fn resolved_ref(&self) -> Option<Reference> {
        if let Some(r) = &self.reference {
            return Some(r.clone());
        }
        self.deprecated_name.as_ref().map(|name| Reference {
            api_version: self.deprecated_api_version.clone(),
            kind: self.deprecated_kind.clone().unwrap_or_default(),
            name: name.clone(),
            namespace: self.deprecated_namespace.clone(),
        })
    }

    /// Copy of the destination with the owner's namespace filled in wherever
    /// the reference left it out. Applies to both shapes.
    pub fn with_default_namespace(&self, namespace: &str) -> Destination {
        let mut dest = self.clone();
        if let Some(r) = dest.reference.as_mut() {
            if r.namespace.is_none() {
                r.namespace = Some(namespace.to_string());
            }
        } else if dest.deprecated_name.is_some() && dest.deprecated_namespace.is_none() {
            dest.deprecated_namespace = Some(namespace.to_string());
        }
        dest
    }
}

impl OwnerIdentity for BeaconSource {
    fn api_version(&self) -> String {
        "sources.beacon.dev/v1alpha1".to_string()
    }

    fn kind(&self) -> String {
        "BeaconSource".to_string()
    }

    fn name(&self) -> String {
        self.metadata.name.clone().unwrap_or_default()
    }

    fn namespace(&self) -> Option<String> {
        self.metadata.namespace.clone()
    }

    fn uid(&self) -> Option<String> {
        self.metadata.uid.clone()
    }
}
