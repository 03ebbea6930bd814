//! Diesel row models for governance persistence.

use super::schema::{component_placement_rules, violations};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query and insert row for placement rules.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = component_placement_rules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlacementRuleRow {
    /// Rule identifier.
    pub id: uuid::Uuid,
    /// Component name pattern.
    pub component_pattern: String,
    /// Target repository.
    pub correct_repo: String,
    /// Location inside the repository.
    pub correct_location: Option<String>,
    /// Rationale.
    pub rationale: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query and insert row for violations.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = violations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ViolationRow {
    /// Violation identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Rule family.
    pub kind: String,
    /// Severity.
    pub severity: String,
    /// Message.
    pub message: String,
    /// Broken rule.
    pub rule_violated: String,
    /// Required fix.
    pub fix_required: String,
    /// Offending file.
    pub file_path: Option<String>,
    /// Resolution status.
    pub status: String,
    /// Detection time.
    pub detected_at: DateTime<Utc>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
}
