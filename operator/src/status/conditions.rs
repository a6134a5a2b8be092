//! Ready/NotReady condition state machine.
use std::fmt;

use k8s_openapi::{
    apimachinery::pkg::apis::meta::v1::Time,
    chrono::{DateTime, Utc},
};

use crate::{
    crd::{Condition, ConditionStatus, ConditionType},
    status::health::HealthVerdict,
};

/// State summarised from a list of conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionState {
    /// No condition was reported yet.
    Unknown,
    /// A `Ready` condition is reported.
    Ready,
    /// A `NotReady` condition is reported.
    NotReady,
}

impl fmt::Display for ConditionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionState::Unknown => write!(f, "Unknown"),
            ConditionState::Ready => write!(f, "Ready"),
            ConditionState::NotReady => write!(f, "NotReady"),
        }
    }
}

/// Summarise conditions into a single state.
pub fn state(conditions: &[Condition]) -> ConditionState {
    conditions
        .iter()
        .find(|condition| condition.status == ConditionStatus::True)
        .map(|condition| match condition.type_ {
            ConditionType::Ready => ConditionState::Ready,
            ConditionType::NotReady => ConditionState::NotReady,
        })
        .unwrap_or(ConditionState::Unknown)
}

/// Whether the conditions report the resource as ready.
pub fn is_ready(conditions: &[Condition]) -> bool {
    state(conditions) == ConditionState::Ready
}

/// Compute the conditions following a verdict.
///
/// The result always holds exactly one condition. A condition equal in type, reason and
/// message to a previous one is carried over unchanged so its `lastTransitionTime` is kept.
pub fn transition(
    previous: &[Condition],
    verdict: &HealthVerdict,
    now: DateTime<Utc>,
) -> Vec<Condition> {
    let next = match verdict {
        HealthVerdict::Healthy => Condition {
            type_: ConditionType::Ready,
            status: ConditionStatus::True,
            reason: None,
            message: None,
            last_transition_time: Time(now),
        },
        HealthVerdict::Unhealthy(failure) => Condition {
            type_: ConditionType::NotReady,
            status: ConditionStatus::True,
            reason: Some(failure.reason.clone()),
            message: Some(failure.message.clone()),
            last_transition_time: Time(now),
        },
    };
    let kept = previous.iter().find(|condition| {
        condition.type_ == next.type_
            && condition.status == next.status
            && condition.reason == next.reason
            && condition.message == next.message
    });
    vec![kept.cloned().unwrap_or(next)]
}
