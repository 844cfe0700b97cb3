//! In-memory fakes for every collaborator the reconciler needs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition, DeploymentStatus};

use beacon_core::{BeaconSource, BeaconSourceSpec, Destination, EventType, Reference};
use beacon_reconciler::{
    DeploymentStore, EventTypeStore, Note, Notifier, Reconciler, ResolveError, Result,
    SinkResolver, SourceStore,
};

pub const IMAGE: &str = "registry.local/beacon-emitter:v1";

#[derive(Default)]
pub struct FakeSources {
    pub items: Mutex<HashMap<(String, String), BeaconSource>>,
    pub status_writes: Mutex<usize>,
}

#[async_trait]
impl SourceStore for FakeSources {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<BeaconSource>> {
        let items = self.items.lock().unwrap();
        Ok(items.get(&(namespace.into(), name.into())).cloned())
    }

    async fn update_status(&self, source: &BeaconSource) -> Result<BeaconSource> {
        let key = (
            source.metadata.namespace.clone().unwrap_or_default(),
            source.metadata.name.clone().unwrap_or_default(),
        );
        let mut items = self.items.lock().unwrap();
        if let Some(stored) = items.get_mut(&key) {
            stored.status = source.status.clone();
        }
        *self.status_writes.lock().unwrap() += 1;
        Ok(items.get(&key).cloned().unwrap_or_else(|| source.clone()))
    }
}

#[derive(Default)]
pub struct FakeDeployments {
    pub items: Mutex<HashMap<(String, String), Deployment>>,
    pub creates: Mutex<usize>,
    pub updates: Mutex<usize>,
}

impl FakeDeployments {
    /// Stamp every stored deployment with an Available=True condition, as the
    /// deployment controller eventually would.
    pub fn make_available(&self) {
        let mut items = self.items.lock().unwrap();
        for deployment in items.values_mut() {
            deployment.status = Some(DeploymentStatus {
                conditions: Some(vec![DeploymentCondition {
                    type_: "Available".into(),
                    status: "True".into(),
                    ..Default::default()
                }]),
                ..Default::default()
            });
        }
    }
}

#[async_trait]
impl DeploymentStore for FakeDeployments {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Deployment>> {
        let items = self.items.lock().unwrap();
        Ok(items.get(&(namespace.into(), name.into())).cloned())
    }

    async fn create(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let mut items = self.items.lock().unwrap();
        items.insert((namespace.into(), name), deployment.clone());
        *self.creates.lock().unwrap() += 1;
        Ok(deployment.clone())
    }

    async fn update(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let mut items = self.items.lock().unwrap();
        items.insert((namespace.into(), name), deployment.clone());
        *self.updates.lock().unwrap() += 1;
        Ok(deployment.clone())
    }

    async fn list_owned(&self, namespace: &str, selector: &str) -> Result<Vec<Deployment>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|((ns, _), d)| ns == namespace && matches_selector(&d.metadata, selector))
            .map(|(_, d)| d.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct FakeEventTypes {
    pub items: Mutex<HashMap<String, EventType>>,
    pub creates: Mutex<usize>,
    pub deletes: Mutex<usize>,
    sequence: Mutex<usize>,
}

#[async_trait]
impl EventTypeStore for FakeEventTypes {
    async fn list(&self, _namespace: &str, selector: &str) -> Result<Vec<EventType>> {
        let items = self.items.lock().unwrap();
        let mut listed: Vec<EventType> = items
            .values()
            .filter(|et| matches_selector(&et.metadata, selector))
            .cloned()
            .collect();
        listed.sort_by_key(|et| et.metadata.name.clone());
        Ok(listed)
    }

    async fn create(&self, _namespace: &str, event_type: &EventType) -> Result<EventType> {
        let mut created = event_type.clone();
        // Mimic apiserver generateName behavior.
        if created.metadata.name.is_none() {
            let mut sequence = self.sequence.lock().unwrap();
            *sequence += 1;
            let prefix = created.metadata.generate_name.clone().unwrap_or_default();
            created.metadata.name = Some(format!("{prefix}{:05}", *sequence));
        }
        let name = created.metadata.name.clone().unwrap_or_default();
        self.items.lock().unwrap().insert(name, created.clone());
        *self.creates.lock().unwrap() += 1;
        Ok(created)
    }

    async fn delete(&self, _namespace: &str, name: &str) -> Result<()> {
        self.items.lock().unwrap().remove(name);
        *self.deletes.lock().unwrap() += 1;
        Ok(())
    }
}

pub struct FakeResolver {
    pub uri: Option<String>,
}

#[async_trait]
impl SinkResolver for FakeResolver {
    async fn resolve(
        &self,
        destination: &Destination,
        _owner: &BeaconSource,
    ) -> std::result::Result<String, ResolveError> {
        match &self.uri {
            Some(uri) => Ok(uri.clone()),
            None => Err(ResolveError::NotFound(format!(
                "no addressable for {destination:?}"
            ))),
        }
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub notes: Mutex<Vec<(Note, String)>>,
}

impl FakeNotifier {
    pub fn count(&self, note: Note) -> usize {
        self.notes
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| *n == note)
            .count()
    }
}

impl Notifier for FakeNotifier {
    fn notify(&self, _source: &BeaconSource, note: Note, message: &str) {
        self.notes.lock().unwrap().push((note, message.to_string()));
    }
}

fn matches_selector(
    meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta,
    selector: &str,
) -> bool {
    let Some((key, value)) = selector.split_once('=') else {
        return false;
    };
    meta.labels
        .as_ref()
        .and_then(|labels| labels.get(key))
        .map(|v| v == value)
        .unwrap_or(false)
}

/// Everything a scenario needs: the reconciler plus handles on its fakes.
pub struct Harness {
    pub sources: Arc<FakeSources>,
    pub deployments: Arc<FakeDeployments>,
    pub event_types: Arc<FakeEventTypes>,
    pub notifier: Arc<FakeNotifier>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new(source: BeaconSource, resolved_uri: Option<&str>) -> Self {
        let sources = Arc::new(FakeSources::default());
        let key = (
            source.metadata.namespace.clone().unwrap_or_default(),
            source.metadata.name.clone().unwrap_or_default(),
        );
        sources.items.lock().unwrap().insert(key, source);

        let deployments = Arc::new(FakeDeployments::default());
        let event_types = Arc::new(FakeEventTypes::default());
        let notifier = Arc::new(FakeNotifier::default());
        let resolver = Arc::new(FakeResolver {
            uri: resolved_uri.map(String::from),
        });
        let reconciler = Reconciler::new(
            IMAGE,
            sources.clone(),
            deployments.clone(),
            event_types.clone(),
            resolver,
            notifier.clone(),
        );
        Self {
            sources,
            deployments,
            event_types,
            notifier,
            reconciler,
        }
    }

    pub async fn reconcile(&self) -> Result<()> {
        self.reconciler.reconcile("apps", "ticker").await
    }

    pub fn stored_source(&self) -> BeaconSource {
        self.sources
            .items
            .lock()
            .unwrap()
            .get(&("apps".into(), "ticker".into()))
            .cloned()
            .expect("source present")
    }

    pub fn set_sink(&self, sink: Option<Destination>) {
        let mut items = self.sources.items.lock().unwrap();
        if let Some(stored) = items.get_mut(&("apps".into(), "ticker".into())) {
            stored.spec.sink = sink;
        }
    }
}

pub fn source(sink: Option<Destination>) -> BeaconSource {
    let mut s = BeaconSource::new(
        "ticker",
        BeaconSourceSpec {
            sink,
            interval: "10s".into(),
            service_account_name: None,
        },
    );
    s.metadata.namespace = Some("apps".into());
    s.metadata.uid = Some("2f9c7b52-9a91-4cd5-b2f1-3d2a8f3f6f10".into());
    s.metadata.creation_timestamp = Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(
        chrono::Utc::now(),
    ));
    s
}

pub fn service_sink() -> Destination {
    Destination {
        reference: Some(Reference {
            api_version: Some("v1".into()),
            kind: "Service".into(),
            name: "collector".into(),
            namespace: Some("apps".into()),
        }),
        ..Destination::default()
    }
}

pub fn broker_sink() -> Destination {
    Destination {
        reference: Some(Reference {
            api_version: Some("eventing.beacon.dev/v1alpha1".into()),
            kind: "Broker".into(),
            name: "default".into(),
            namespace: Some("apps".into()),
        }),
        ..Destination::default()
    }
}
