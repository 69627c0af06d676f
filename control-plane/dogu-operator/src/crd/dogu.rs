use std::fmt;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_HEALTHY: &str = "Healthy";
pub const CONDITION_SUPPORT_MODE: &str = "SupportMode";
pub const CONDITION_MEETS_MIN_VOLUME_SIZE: &str = "MeetsMinVolumeSize";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "k8s.cloudogu.com",
    version = "v2",
    kind = "Dogu",
    plural = "dogus",
    namespaced,
    status = "DoguStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct DoguSpec {
    /// Namespaced dogu name, e.g. "official/redmine"
    pub name: String,
    /// Desired dogu version
    pub version: String,
    /// Scale the dogu down to zero while keeping its data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped: Option<bool>,
    /// Keep the pod alive without starting the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_mode: Option<bool>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct DoguStatus {
    /// Installation phase (installing, installed, upgrading, ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// Cached health of the dogu's own workload. Other dogus read this
    /// field for their dependency checks instead of probing live state.
    #[serde(default)]
    pub health: HealthStatus,
    /// K8s-style conditions, unique by type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
}

#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Available,
    Unavailable,
    #[default]
    Unknown,
}

impl HealthStatus {
    pub fn from_available(available: bool) -> Self {
        if available {
            HealthStatus::Available
        } else {
            HealthStatus::Unavailable
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Available => write!(f, "available"),
            HealthStatus::Unavailable => write!(f, "unavailable"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Condition {
    /// Free-form so condition types written by other actors survive a
    /// read-modify-write untouched.
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        rename = "lastTransitionTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_transition_time: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl Condition {
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: Some(reason.into()),
            message: Some(message.into()),
            last_transition_time: None,
        }
    }
}

impl DoguStatus {
    /// Replace the condition with the same type in place, or append it.
    ///
    /// The transition time is stamped with `now` when the condition is new or
    /// its status flips; otherwise the previous timestamp is kept.
    pub fn set_condition(&mut self, mut condition: Condition, now: &str) {
        match self
            .conditions
            .iter_mut()
            .find(|c| c.type_ == condition.type_)
        {
            Some(existing) => {
                if existing.status == condition.status {
                    condition.last_transition_time =
                        existing.last_transition_time.clone();
                } else {
                    condition.last_transition_time = Some(now.to_string());
                }
                *existing = condition;
            }
            None => {
                condition.last_transition_time = Some(now.to_string());
                self.conditions.push(condition);
            }
        }
    }

    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }
}

impl Dogu {
    /// Health as cached in status; a dogu without status has unknown health.
    pub fn health(&self) -> HealthStatus {
        self.status
            .as_ref()
            .map(|s| s.health)
            .unwrap_or_default()
    }
}
