//! Sink resolution: turning a destination reference into a delivery URI.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::{api::Api, Client};

use beacon_core::{BeaconSource, Destination, OwnerIdentity};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("destination not found: {0}")]
    NotFound(String),
    #[error("resolving destination: {0}")]
    Failed(String),
}

/// Resolves a destination to a URI on behalf of an owner resource.
#[async_trait]
pub trait SinkResolver: Send + Sync {
    async fn resolve(
        &self,
        destination: &Destination,
        owner: &BeaconSource,
    ) -> Result<String, ResolveError>;
}

/// Resolver backed by cluster DNS conventions: Services resolve to their
/// cluster-local URI (existence-checked), Brokers to the broker ingress path.
pub struct ClusterSinkResolver {
    client: Client,
}

impl ClusterSinkResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SinkResolver for ClusterSinkResolver {
    async fn resolve(
        &self,
        destination: &Destination,
        owner: &BeaconSource,
    ) -> Result<String, ResolveError> {
        let Some(reference) = destination.resolved_ref() else {
            return Err(ResolveError::NotFound(
                "destination has no object reference".to_string(),
            ));
        };
        let namespace = reference
            .namespace
            .or_else(|| owner.namespace())
            .ok_or_else(|| ResolveError::Failed("destination namespace unknown".to_string()))?;
        let name = reference.name;
        match reference.kind.as_str() {
            "Service" => {
                let api: Api<Service> = Api::namespaced(self.client.clone(), &namespace);
                match api.get_opt(&name).await {
                    Ok(Some(_)) => Ok(format!("http://{name}.{namespace}.svc.cluster.local/")),
                    Ok(None) => Err(ResolveError::NotFound(format!(
                        "service {namespace}/{name} does not exist"
                    ))),
                    Err(e) => Err(ResolveError::Failed(e.to_string())),
                }
            }
            // Brokers are addressable by convention; existence is the broker
            // controller's problem.
            "Broker" => Ok(format!(
                "http://broker-ingress.{namespace}.svc.cluster.local/{namespace}/{name}"
            )),
            other => Err(ResolveError::NotFound(format!(
                "unsupported destination kind {other:?}"
            ))),
        }
    }
}
