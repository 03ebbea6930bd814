//! Governance violations.

use super::{ParseGovernanceValueError, ViolationId};
use crate::registry::domain::FilePath;
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which rule family a violation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The task targets the wrong repository for a named component.
    ComponentPlacement,
    /// The solution is heavier than the user count warrants.
    OverEngineering,
    /// A task file has no architecture mapping.
    UnmappedFile,
    /// A task file sits outside its component's boundaries.
    ScopeViolation,
}

impl ViolationKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ComponentPlacement => "component_placement",
            Self::OverEngineering => "over_engineering",
            Self::UnmappedFile => "unmapped_file",
            Self::ScopeViolation => "scope_violation",
        }
    }

    /// Returns `true` for breaches found by the creation gates, as opposed
    /// to the file checks run at completion.
    #[must_use]
    pub const fn is_planning_breach(self) -> bool {
        matches!(self, Self::ComponentPlacement | Self::OverEngineering)
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ViolationKind {
    type Error = ParseGovernanceValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "component_placement" => Ok(Self::ComponentPlacement),
            "over_engineering" => Ok(Self::OverEngineering),
            "unmapped_file" => Ok(Self::UnmappedFile),
            "scope_violation" => Ok(Self::ScopeViolation),
            _ => Err(ParseGovernanceValueError::new("violation kind", value)),
        }
    }
}

/// Violation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Low,
    /// Should be addressed.
    Medium,
    /// Must be addressed before merge.
    High,
    /// Blocks the task outright.
    Critical,
}

impl Severity {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Severity {
    type Error = ParseGovernanceValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseGovernanceValueError::new("severity", value)),
        }
    }
}

/// Resolution status of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationStatus {
    /// Newly recorded.
    Open,
    /// Seen by a human, not yet fixed.
    Acknowledged,
    /// Resolved.
    Fixed,
}

impl ViolationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Acknowledged => "acknowledged",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for ViolationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ViolationStatus {
    type Error = ParseGovernanceValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "acknowledged" => Ok(Self::Acknowledged),
            "fixed" => Ok(Self::Fixed),
            _ => Err(ParseGovernanceValueError::new("violation status", value)),
        }
    }
}

/// Human-readable content of a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationDetails {
    /// What went wrong.
    pub message: String,
    /// Which rule was broken.
    pub rule_violated: String,
    /// What to do about it.
    pub fix_required: String,
    /// The offending file, for file-level violations.
    pub file_path: Option<FilePath>,
}

/// A recorded rule breach tied to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    id: ViolationId,
    task_id: TaskId,
    kind: ViolationKind,
    severity: Severity,
    message: String,
    rule_violated: String,
    fix_required: String,
    file_path: Option<FilePath>,
    status: ViolationStatus,
    detected_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedViolationData {
    /// Persisted identifier.
    pub id: ViolationId,
    /// Owning task.
    pub task_id: TaskId,
    /// Rule family.
    pub kind: ViolationKind,
    /// Severity.
    pub severity: Severity,
    /// Message.
    pub message: String,
    /// Broken rule.
    pub rule_violated: String,
    /// Required fix.
    pub fix_required: String,
    /// Offending file.
    pub file_path: Option<FilePath>,
    /// Resolution status.
    pub status: ViolationStatus,
    /// Detection time.
    pub detected_at: DateTime<Utc>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Violation {
    /// Records a new open violation.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        kind: ViolationKind,
        severity: Severity,
        details: ViolationDetails,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ViolationId::new(),
            task_id,
            kind,
            severity,
            message: details.message,
            rule_violated: details.rule_violated,
            fix_required: details.fix_required,
            file_path: details.file_path,
            status: ViolationStatus::Open,
            detected_at: clock.utc(),
            resolved_at: None,
        }
    }

    /// Reconstructs a violation from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedViolationData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            kind: data.kind,
            severity: data.severity,
            message: data.message,
            rule_violated: data.rule_violated,
            fix_required: data.fix_required,
            file_path: data.file_path,
            status: data.status,
            detected_at: data.detected_at,
            resolved_at: data.resolved_at,
        }
    }

    /// Returns the violation identifier.
    #[must_use]
    pub const fn id(&self) -> ViolationId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the rule family.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the broken rule.
    #[must_use]
    pub fn rule_violated(&self) -> &str {
        &self.rule_violated
    }

    /// Returns the required fix.
    #[must_use]
    pub fn fix_required(&self) -> &str {
        &self.fix_required
    }

    /// Returns the offending file.
    #[must_use]
    pub const fn file_path(&self) -> Option<&FilePath> {
        self.file_path.as_ref()
    }

    /// Returns the resolution status.
    #[must_use]
    pub const fn status(&self) -> ViolationStatus {
        self.status
    }

    /// Returns the detection time.
    #[must_use]
    pub const fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Returns the resolution time.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns `true` until the violation is fixed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.status, ViolationStatus::Fixed)
    }

    /// Returns `true` when `other` reports the same breach.
    #[must_use]
    pub fn same_breach(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }

    /// Marks the violation as seen.
    pub const fn acknowledge(&mut self) {
        if matches!(self.status, ViolationStatus::Open) {
            self.status = ViolationStatus::Acknowledged;
        }
    }

    /// Marks the violation as fixed.
    pub fn close(&mut self, clock: &impl Clock) {
        if self.is_open() {
            self.status = ViolationStatus::Fixed;
            self.resolved_at = Some(clock.utc());
        }
    }
}
