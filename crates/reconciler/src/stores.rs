//! Resource store traits and their kube-backed implementations.
//!
//! Lookups return `Result<Option<T>>` so "absent" is a value, never an error
//! to be sniffed. Each kube store is a thin wrapper over a namespaced `Api`.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams},
    Client,
};

use beacon_core::{BeaconSource, EventType};

use crate::error::Result;

/// Store for the owner resource. List is not needed; the scheduler always
/// hands the reconciler one identity.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<BeaconSource>>;
    /// Write the status subresource; the rest of the object is never touched.
    async fn update_status(&self, source: &BeaconSource) -> Result<BeaconSource>;
}

#[async_trait]
pub trait DeploymentStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Deployment>>;
    async fn create(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment>;
    async fn update(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment>;
    /// Fallback discovery path: deployments matching a label selector, for
    /// the caller to filter by ownership.
    async fn list_owned(&self, namespace: &str, selector: &str) -> Result<Vec<Deployment>>;
}

#[async_trait]
pub trait EventTypeStore: Send + Sync {
    async fn list(&self, namespace: &str, selector: &str) -> Result<Vec<EventType>>;
    async fn create(&self, namespace: &str, event_type: &EventType) -> Result<EventType>;
    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct KubeSourceStore {
    client: Client,
}

impl KubeSourceStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<BeaconSource> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SourceStore for KubeSourceStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<BeaconSource>> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn update_status(&self, source: &BeaconSource) -> Result<BeaconSource> {
        let namespace = source.metadata.namespace.as_deref().unwrap_or_default();
        let name = source.metadata.name.as_deref().unwrap_or_default();
        let patch = serde_json::json!({ "status": source.status });
        Ok(self
            .api(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?)
    }
}

#[derive(Clone)]
pub struct KubeDeploymentStore {
    client: Client,
}

impl KubeDeploymentStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl DeploymentStore for KubeDeploymentStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Deployment>> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn create(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment> {
        Ok(self
            .api(namespace)
            .create(&PostParams::default(), deployment)
            .await?)
    }

    async fn update(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment> {
        let name = deployment.metadata.name.as_deref().unwrap_or_default();
        Ok(self
            .api(namespace)
            .replace(name, &PostParams::default(), deployment)
            .await?)
    }

    async fn list_owned(&self, namespace: &str, selector: &str) -> Result<Vec<Deployment>> {
        let params = ListParams::default().labels(selector);
        Ok(self.api(namespace).list(&params).await?.items)
    }
}

#[derive(Clone)]
pub struct KubeEventTypeStore {
    client: Client,
}

impl KubeEventTypeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<EventType> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl EventTypeStore for KubeEventTypeStore {
    async fn list(&self, namespace: &str, selector: &str) -> Result<Vec<EventType>> {
        let params = ListParams::default().labels(selector);
        Ok(self.api(namespace).list(&params).await?.items)
    }

    async fn create(&self, namespace: &str, event_type: &EventType) -> Result<EventType> {
        Ok(self
            .api(namespace)
            .create(&PostParams::default(), event_type)
            .await?)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.api(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}
