//! BeaconSource status: the condition list plus the resolved sink URI.
//!
//! All mutation goes through the mark methods below, which drive the
//! [`ConditionManager`] over the fixed [`SOURCE_CONDITIONS`] set.

use k8s_openapi::api::apps::v1::Deployment;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conditions::{
    Condition, ConditionManager, ConditionSeverity, ConditionStatus, CONDITION_DEPLOYED,
    CONDITION_EVENT_TYPES_PROVIDED, CONDITION_SINK_PROVIDED, SOURCE_CONDITIONS,
};

const DEPRECATED_REF_MESSAGE: &str = "Using deprecated object ref fields when specifying \
     spec.sink. These will be removed in a future release. Update to spec.sink.ref.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BeaconSourceStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// URI the sink resolved to; absent until resolution succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_uri: Option<String>,
}

impl BeaconSourceStatus {
    fn manager(&mut self) -> ConditionManager<'_> {
        ConditionManager::new(&SOURCE_CONDITIONS, &mut self.conditions)
    }

    /// Set every tracked-but-unset condition to Unknown. Safe to call on
    /// every reconcile.
    pub fn initialize_conditions(&mut self) {
        self.manager().initialize();
    }

    pub fn get_condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Record a successfully resolved sink. An empty URI is not a failure:
    /// the condition goes to Unknown, never False.
    pub fn mark_sink(&mut self, uri: &str) {
        self.sink_uri = Some(uri.to_string());
        if uri.is_empty() {
            self.manager()
                .mark_unknown(CONDITION_SINK_PROVIDED, "SinkEmpty", "Sink has resolved to empty.");
        } else {
            self.manager().mark_true(CONDITION_SINK_PROVIDED);
        }
    }

    /// Record a resolved sink that was addressed through the deprecated
    /// inline fields: still True, but with an Error-severity warning.
    pub fn mark_sink_warn_ref_deprecated(&mut self, uri: &str) {
        self.sink_uri = Some(uri.to_string());
        if uri.is_empty() {
            self.manager()
                .mark_unknown(CONDITION_SINK_PROVIDED, "SinkEmpty", "Sink has resolved to empty.");
        } else {
            self.manager().set_condition(Condition {
                type_: CONDITION_SINK_PROVIDED.to_string(),
                status: ConditionStatus::True,
                severity: Some(ConditionSeverity::Error),
                reason: None,
                message: Some(DEPRECATED_REF_MESSAGE.to_string()),
                last_transition_time: None,
            });
        }
    }

    pub fn mark_no_sink(&mut self, reason: &str, message: &str) {
        self.manager().mark_false(CONDITION_SINK_PROVIDED, reason, message);
    }

    /// Derive the Deployed condition from the emitter deployment. No attempt
    /// is made to propagate deeper failure reasons; an unavailable deployment
    /// is reported by name only.
    pub fn propagate_deployment_availability(&mut self, deployment: &Deployment) {
        if deployment_is_available(deployment) {
            self.manager().mark_true(CONDITION_DEPLOYED);
        } else {
            let name = deployment.metadata.name.as_deref().unwrap_or_default();
            self.manager().mark_false(
                CONDITION_DEPLOYED,
                "DeploymentUnavailable",
                &format!("The Deployment '{name}' is unavailable."),
            );
        }
    }

    pub fn mark_event_types(&mut self) {
        self.manager().mark_true(CONDITION_EVENT_TYPES_PROVIDED);
    }

    pub fn mark_no_event_types(&mut self, reason: &str, message: &str) {
        self.manager()
            .mark_false(CONDITION_EVENT_TYPES_PROVIDED, reason, message);
    }

    /// True iff every tracked condition is True.
    pub fn is_ready(&self) -> bool {
        SOURCE_CONDITIONS
            .dependents
            .iter()
            .all(|t| self.get_condition(t).map(Condition::is_true).unwrap_or(false))
    }
}

/// Whether a deployment reports an Available=True condition.
pub fn deployment_is_available(deployment: &Deployment) -> bool {
    deployment
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Available" && c.status == "True")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{DeploymentCondition, DeploymentStatus};

    fn deployment(name: &str, available: Option<bool>) -> Deployment {
        let mut d = Deployment::default();
        d.metadata.name = Some(name.to_string());
        if let Some(available) = available {
            d.status = Some(DeploymentStatus {
                conditions: Some(vec![DeploymentCondition {
                    type_: "Available".into(),
                    status: if available { "True" } else { "False" }.into(),
                    ..Default::default()
                }]),
                ..Default::default()
            });
        }
        d
    }

    #[test]
    fn mark_sink_with_uri_is_true_and_stores_uri() {
        let mut status = BeaconSourceStatus::default();
        status.initialize_conditions();
        status.mark_sink("http://svc.default.svc.cluster.local/");
        assert_eq!(
            status.sink_uri.as_deref(),
            Some("http://svc.default.svc.cluster.local/")
        );
        let c = status.get_condition(CONDITION_SINK_PROVIDED).unwrap();
        assert_eq!(c.status, ConditionStatus::True);
        assert!(c.severity.is_none());
    }

    #[test]
    fn mark_sink_with_empty_uri_is_unknown_not_false() {
        let mut status = BeaconSourceStatus::default();
        status.initialize_conditions();
        status.mark_sink("");
        let c = status.get_condition(CONDITION_SINK_PROVIDED).unwrap();
        assert_eq!(c.status, ConditionStatus::Unknown);
        assert_eq!(c.reason.as_deref(), Some("SinkEmpty"));
    }

    #[test]
    fn deprecated_sink_is_true_with_error_severity_warning() {
        let mut status = BeaconSourceStatus::default();
        status.initialize_conditions();
        status.mark_sink_warn_ref_deprecated("http://broker/");
        assert_eq!(status.sink_uri.as_deref(), Some("http://broker/"));
        let c = status.get_condition(CONDITION_SINK_PROVIDED).unwrap();
        assert_eq!(c.status, ConditionStatus::True);
        assert_eq!(c.severity, Some(ConditionSeverity::Error));
        assert!(c.message.as_deref().unwrap_or_default().contains("deprecated"));
    }

    #[test]
    fn availability_propagation_reports_deployment_name() {
        let mut status = BeaconSourceStatus::default();
        status.initialize_conditions();
        status.propagate_deployment_availability(&deployment("beaconsource-x", None));
        let c = status.get_condition(CONDITION_DEPLOYED).unwrap();
        assert_eq!(c.status, ConditionStatus::False);
        assert!(c.message.as_deref().unwrap_or_default().contains("beaconsource-x"));

        status.propagate_deployment_availability(&deployment("beaconsource-x", Some(true)));
        let c = status.get_condition(CONDITION_DEPLOYED).unwrap();
        assert_eq!(c.status, ConditionStatus::True);
    }

    #[test]
    fn full_mark_sequence_reaches_ready() {
        let mut status = BeaconSourceStatus::default();
        status.initialize_conditions();
        assert!(!status.is_ready());
        status.mark_sink("http://sink/");
        status.propagate_deployment_availability(&deployment("d", Some(true)));
        status.mark_event_types();
        assert!(status.is_ready());
    }
}
