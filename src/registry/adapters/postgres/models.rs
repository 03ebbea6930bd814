//! Diesel row models for registry persistence.

use super::schema::{architecture_components, code_component_mappings, unregistered_files};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for architecture components.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = architecture_components)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ComponentRow {
    /// Component identifier.
    pub id: uuid::Uuid,
    /// Component name.
    pub name: String,
    /// Structural kind.
    pub kind: String,
    /// Owning repository.
    pub repo: String,
    /// Expected code location.
    pub expected_path: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Scope rules JSON.
    pub scope: Value,
    /// Lifecycle status.
    pub status: String,
    /// Registering actor.
    pub registered_by: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for architecture components.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = architecture_components)]
pub struct NewComponentRow {
    /// Component identifier.
    pub id: uuid::Uuid,
    /// Component name.
    pub name: String,
    /// Structural kind.
    pub kind: String,
    /// Owning repository.
    pub repo: String,
    /// Expected code location.
    pub expected_path: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Scope rules JSON.
    pub scope: Value,
    /// Lifecycle status.
    pub status: String,
    /// Registering actor.
    pub registered_by: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for file mappings.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = code_component_mappings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MappingRow {
    /// Mapping identifier.
    pub id: uuid::Uuid,
    /// Mapped file path.
    pub file_path: String,
    /// Target component.
    pub component_id: uuid::Uuid,
    /// Mapping kind.
    pub kind: String,
    /// Human-authored reason.
    pub reason: String,
    /// Reviewer validation flag.
    pub validated: bool,
    /// Creating actor.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for file mappings.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = code_component_mappings)]
pub struct NewMappingRow {
    /// Mapping identifier.
    pub id: uuid::Uuid,
    /// Mapped file path.
    pub file_path: String,
    /// Target component.
    pub component_id: uuid::Uuid,
    /// Mapping kind.
    pub kind: String,
    /// Human-authored reason.
    pub reason: String,
    /// Reviewer validation flag.
    pub validated: bool,
    /// Creating actor.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for the unregistered-file ledger.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = unregistered_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UnregisteredRow {
    /// Row identifier.
    pub id: uuid::Uuid,
    /// Detected file path.
    pub file_path: String,
    /// Repository the file was seen in.
    pub repo: String,
    /// First detection time.
    pub first_seen: DateTime<Utc>,
    /// Latest detection time.
    pub last_seen: DateTime<Utc>,
    /// Detection counter.
    pub detection_count: i32,
    /// Review status.
    pub status: String,
    /// Component that resolved the row.
    pub resolved_component_id: Option<uuid::Uuid>,
    /// Reviewer notes.
    pub review_notes: Option<String>,
    /// Reviewer or resolving actor.
    pub reviewed_by: Option<String>,
    /// Review time.
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Insert model for a first detection.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = unregistered_files)]
pub struct NewUnregisteredRow {
    /// Row identifier.
    pub id: uuid::Uuid,
    /// Detected file path.
    pub file_path: String,
    /// Repository the file was seen in.
    pub repo: String,
    /// First detection time.
    pub first_seen: DateTime<Utc>,
    /// Latest detection time.
    pub last_seen: DateTime<Utc>,
    /// Detection counter.
    pub detection_count: i32,
    /// Review status.
    pub status: String,
}
