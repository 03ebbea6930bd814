//! `PostgreSQL` repository implementation for governance storage.

use super::{
    models::{PlacementRuleRow, ViolationRow},
    schema::{component_placement_rules, violations},
};
use crate::governance::{
    domain::{
        ComponentPlacementRule, PersistedPlacementRuleData, PersistedViolationData,
        PlacementRuleId, Severity, Violation, ViolationId, ViolationKind, ViolationStatus,
    },
    ports::{
        GovernanceRepositoryError, GovernanceRepositoryResult, PlacementRuleRepository,
        ViolationRepository,
    },
};
use crate::registry::domain::{FilePath, RepoName};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by governance adapters.
pub type GovernancePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed governance repository.
#[derive(Debug, Clone)]
pub struct PostgresGovernanceRepository {
    pool: GovernancePgPool,
}

impl PostgresGovernanceRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: GovernancePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> GovernanceRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> GovernanceRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(GovernanceRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(GovernanceRepositoryError::persistence)?
    }
}

impl From<DieselError> for GovernanceRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl PlacementRuleRepository for PostgresGovernanceRepository {
    async fn store_rule(&self, rule: &ComponentPlacementRule) -> GovernanceRepositoryResult<()> {
        let pattern = rule.component_pattern().to_owned();
        let row = PlacementRuleRow {
            id: rule.id().into_inner(),
            component_pattern: pattern.clone(),
            correct_repo: rule.correct_repo().to_string(),
            correct_location: rule.correct_location().map(str::to_owned),
            rationale: rule.rationale().map(str::to_owned),
            created_at: rule.created_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(component_placement_rules::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        GovernanceRepositoryError::DuplicatePlacementRule(pattern)
                    }
                    _ => GovernanceRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn list_rules(&self) -> GovernanceRepositoryResult<Vec<ComponentPlacementRule>> {
        self.run_blocking(|connection| {
            let rows = component_placement_rules::table
                .order(component_placement_rules::created_at.asc())
                .select(PlacementRuleRow::as_select())
                .load::<PlacementRuleRow>(connection)?;
            rows.into_iter().map(row_to_rule).collect()
        })
        .await
    }
}

#[async_trait]
impl ViolationRepository for PostgresGovernanceRepository {
    async fn store_violations(&self, batch: &[Violation]) -> GovernanceRepositoryResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let rows: Vec<ViolationRow> = batch.iter().map(to_violation_row).collect();
        self.run_blocking(move |connection| {
            diesel::insert_into(violations::table)
                .values(&rows)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn list_for_task(&self, task_id: TaskId) -> GovernanceRepositoryResult<Vec<Violation>> {
        self.run_blocking(move |connection| {
            let rows = violations::table
                .filter(violations::task_id.eq(task_id.into_inner()))
                .order(violations::detected_at.asc())
                .select(ViolationRow::as_select())
                .load::<ViolationRow>(connection)?;
            rows.into_iter().map(row_to_violation).collect()
        })
        .await
    }

    async fn update_violation(&self, violation: &Violation) -> GovernanceRepositoryResult<()> {
        let id = violation.id();
        let status = violation.status().as_str();
        let resolved_at = violation.resolved_at();
        self.run_blocking(move |connection| {
            let affected = diesel::update(violations::table.find(id.into_inner()))
                .set((
                    violations::status.eq(status),
                    violations::resolved_at.eq(resolved_at),
                ))
                .execute(connection)?;
            if affected == 0 {
                return Err(GovernanceRepositoryError::ViolationNotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn to_violation_row(violation: &Violation) -> ViolationRow {
    ViolationRow {
        id: violation.id().into_inner(),
        task_id: violation.task_id().into_inner(),
        kind: violation.kind().as_str().to_owned(),
        severity: violation.severity().as_str().to_owned(),
        message: violation.message().to_owned(),
        rule_violated: violation.rule_violated().to_owned(),
        fix_required: violation.fix_required().to_owned(),
        file_path: violation.file_path().map(ToString::to_string),
        status: violation.status().as_str().to_owned(),
        detected_at: violation.detected_at(),
        resolved_at: violation.resolved_at(),
    }
}

fn row_to_rule(row: PlacementRuleRow) -> GovernanceRepositoryResult<ComponentPlacementRule> {
    let correct_repo = RepoName::new(row.correct_repo)
        .map_err(GovernanceRepositoryError::invalid_persisted_data)?;
    Ok(ComponentPlacementRule::from_persisted(
        PersistedPlacementRuleData {
            id: PlacementRuleId::from_uuid(row.id),
            component_pattern: row.component_pattern,
            correct_repo,
            correct_location: row.correct_location,
            rationale: row.rationale,
            created_at: row.created_at,
        },
    ))
}

fn row_to_violation(row: ViolationRow) -> GovernanceRepositoryResult<Violation> {
    let file_path = row
        .file_path
        .map(FilePath::new)
        .transpose()
        .map_err(GovernanceRepositoryError::invalid_persisted_data)?;
    Ok(Violation::from_persisted(PersistedViolationData {
        id: ViolationId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        kind: ViolationKind::try_from(row.kind.as_str())
            .map_err(GovernanceRepositoryError::invalid_persisted_data)?,
        severity: Severity::try_from(row.severity.as_str())
            .map_err(GovernanceRepositoryError::invalid_persisted_data)?,
        message: row.message,
        rule_violated: row.rule_violated,
        fix_required: row.fix_required,
        file_path,
        status: ViolationStatus::try_from(row.status.as_str())
            .map_err(GovernanceRepositoryError::invalid_persisted_data)?,
        detected_at: row.detected_at,
        resolved_at: row.resolved_at,
    }))
}
