//! Builder for the emitter deployment owned by a BeaconSource.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, EnvVarSource, ObjectFieldSelector, PodSpec, PodTemplateSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use beacon_core::{controller_reference, BeaconSource, BeaconSourceSpec, OwnerIdentity};

use super::emitter_name;

pub const EMITTER_CONTAINER: &str = "emitter";
const METRICS_DOMAIN: &str = "beacon.dev/sources";

/// Arguments for [`make_emitter`]. Every field is required.
pub struct EmitterArgs<'a> {
    pub source: &'a BeaconSource,
    /// CloudEvents source attribute baked into the emitter environment.
    pub event_source: String,
    pub image: String,
    pub labels: BTreeMap<String, String>,
    pub sink_uri: String,
}

/// Generate (but do not persist) the emitter deployment for a source: a
/// single replica whose pod embeds the sink URI, event source, and interval.
pub fn make_emitter(args: &EmitterArgs<'_>) -> Deployment {
    let source_name = args.source.name();
    Deployment {
        metadata: ObjectMeta {
            namespace: args.source.namespace(),
            name: Some(emitter_name(&source_name)),
            labels: Some(args.labels.clone()),
            owner_references: Some(vec![controller_reference(args.source)]),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(args.labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(args.labels.clone()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: args.source.spec.service_account_name.clone(),
                    containers: vec![Container {
                        name: EMITTER_CONTAINER.to_string(),
                        image: Some(args.image.clone()),
                        env: Some(make_env(&args.event_source, &args.sink_uri, &args.source.spec)),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

fn make_env(event_source: &str, sink_uri: &str, spec: &BeaconSourceSpec) -> Vec<EnvVar> {
    vec![
        env_value("SINK_URI", sink_uri),
        env_value("EVENT_SOURCE", event_source),
        env_value("INTERVAL", &spec.interval),
        // The emitter learns its namespace from its own pod metadata rather
        // than a value baked in at build time.
        EnvVar {
            name: "NAMESPACE".to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: "metadata.namespace".to_string(),
                    api_version: None,
                }),
                ..Default::default()
            }),
        },
        env_value("METRICS_DOMAIN", METRICS_DOMAIN),
        env_value("METRICS_CONFIG", ""),
        env_value("LOGGING_CONFIG", ""),
    ]
}

fn env_value(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        value_from: None,
    }
}
