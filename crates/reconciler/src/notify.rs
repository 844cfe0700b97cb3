//! Fire-and-forget notifications about reconcile outcomes.

use k8s_openapi::api::core::v1::ObjectReference;
use kube::{
    runtime::events::{Event, EventType, Recorder, Reporter},
    Client, Resource,
};
use tracing::warn;

use beacon_core::BeaconSource;

/// Notable reconcile outcomes, surfaced as Kubernetes Events by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    Reconciled,
    ReadinessChanged,
    UpdateStatusFailed,
    DeploymentCreated,
    DeploymentUpdated,
}

impl Note {
    pub fn reason(self) -> &'static str {
        match self {
            Note::Reconciled => "BeaconSourceReconciled",
            Note::ReadinessChanged => "BeaconSourceReadinessChanged",
            Note::UpdateStatusFailed => "BeaconSourceUpdateStatusFailed",
            Note::DeploymentCreated => "BeaconSourceDeploymentCreated",
            Note::DeploymentUpdated => "BeaconSourceDeploymentUpdated",
        }
    }

    pub fn is_warning(self) -> bool {
        matches!(self, Note::UpdateStatusFailed)
    }
}

/// Notification sink. Implementations must not block the reconcile; delivery
/// is best-effort.
pub trait Notifier: Send + Sync {
    fn notify(&self, source: &BeaconSource, note: Note, message: &str);
}

/// Publishes notes as Kubernetes Events on the source object.
pub struct KubeNotifier {
    client: Client,
    reporter: Reporter,
}

impl KubeNotifier {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            reporter: Reporter {
                controller: "beacon-operator".into(),
                instance: None,
            },
        }
    }
}

impl Notifier for KubeNotifier {
    fn notify(&self, source: &BeaconSource, note: Note, message: &str) {
        let object_ref = ObjectReference {
            api_version: Some(BeaconSource::api_version(&()).to_string()),
            kind: Some(BeaconSource::kind(&()).to_string()),
            name: source.metadata.name.clone(),
            namespace: source.metadata.namespace.clone(),
            uid: source.metadata.uid.clone(),
            ..Default::default()
        };
        let recorder = Recorder::new(self.client.clone(), self.reporter.clone(), object_ref);
        let event = Event {
            type_: if note.is_warning() {
                EventType::Warning
            } else {
                EventType::Normal
            },
            reason: note.reason().to_string(),
            note: Some(message.to_string()),
            action: "Reconcile".to_string(),
            secondary: None,
        };
        tokio::spawn(async move {
            if let Err(e) = recorder.publish(event).await {
                warn!(error = %e, "failed to publish event");
            }
        });
    }
}
