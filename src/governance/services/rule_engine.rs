//! Placement, scale and file-alignment rules.

use crate::config::DEFAULT_SMALL_SCALE_USER_LIMIT;
use crate::governance::{
    domain::{Severity, Violation, ViolationDetails, ViolationKind},
    ports::{Classifier, FileAlignment, GovernanceResult, GovernanceRules, PlacementRuleRepository},
};
use crate::registry::domain::{FilePath, RepoName};
use crate::task::domain::Task;
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Threshold for the scale rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalePolicy {
    /// User count at or below which heavy infrastructure is flagged.
    pub small_user_limit: u32,
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self {
            small_user_limit: DEFAULT_SMALL_SCALE_USER_LIMIT,
        }
    }
}

/// Rule engine producing violations for a task.
///
/// The engine is read-only: it reads placement rules and the registry and
/// returns violations, leaving persistence to its caller.
#[derive(Clone)]
pub struct RuleEngine<A, P, K, C>
where
    A: FileAlignment,
    P: PlacementRuleRepository,
    K: Classifier,
    C: Clock + Send + Sync,
{
    alignment: Arc<A>,
    rules: Arc<P>,
    classifier: Arc<K>,
    clock: Arc<C>,
    scale: ScalePolicy,
}

impl<A, P, K, C> RuleEngine<A, P, K, C>
where
    A: FileAlignment,
    P: PlacementRuleRepository,
    K: Classifier,
    C: Clock + Send + Sync,
{
    /// Creates a rule engine.
    #[must_use]
    pub const fn new(
        alignment: Arc<A>,
        rules: Arc<P>,
        classifier: Arc<K>,
        clock: Arc<C>,
        scale: ScalePolicy,
    ) -> Self {
        Self {
            alignment,
            rules,
            classifier,
            clock,
            scale,
        }
    }

    async fn check_file(&self, task: &Task, file_path: &FilePath) -> GovernanceResult<Vec<Violation>> {
        let mapping = self.alignment.is_mapped(file_path).await?;
        let Some(component_id) = mapping.component_id.filter(|_| mapping.mapped) else {
            return Ok(vec![Violation::new(
                task.id(),
                ViolationKind::UnmappedFile,
                Severity::High,
                ViolationDetails {
                    message: format!(
                        "File '{file_path}' is not mapped to any architecture component"
                    ),
                    rule_violated: "Code-to-architecture mapping requirement".to_owned(),
                    fix_required: format!(
                        "Map file to component: archwarden file map {file_path} <component_id>"
                    ),
                    file_path: Some(file_path.clone()),
                },
                &*self.clock,
            )]);
        };

        let Some(component) = self.alignment.find_component(component_id).await? else {
            warn!(
                task_id = %task.id(),
                file_path = %file_path,
                component_id = %component_id,
                "mapping points at a missing component; scope not checked"
            );
            return Ok(Vec::new());
        };
        Ok(component
            .scope_violations(file_path)
            .into_iter()
            .map(|scope| {
                Violation::new(
                    task.id(),
                    ViolationKind::ScopeViolation,
                    Severity::Medium,
                    ViolationDetails {
                        message: scope.message,
                        rule_violated: "Component scope boundaries".to_owned(),
                        fix_required: "Review component boundaries and move file if needed"
                            .to_owned(),
                        file_path: Some(file_path.clone()),
                    },
                    &*self.clock,
                )
            })
            .collect())
    }
}

#[async_trait]
impl<A, P, K, C> GovernanceRules for RuleEngine<A, P, K, C>
where
    A: FileAlignment,
    P: PlacementRuleRepository,
    K: Classifier,
    C: Clock + Send + Sync,
{
    async fn validate_placement(
        &self,
        task: &Task,
        proposed_repo: &RepoName,
    ) -> GovernanceResult<Vec<Violation>> {
        let text = task.subject_text();
        let rules = self.rules.list_rules().await?;
        let violations: Vec<Violation> = rules
            .iter()
            .filter(|rule| self.classifier.mentions(&text, rule.component_pattern()))
            .filter(|rule| rule.correct_repo() != proposed_repo)
            .map(|rule| {
                Violation::new(
                    task.id(),
                    ViolationKind::ComponentPlacement,
                    Severity::Critical,
                    ViolationDetails {
                        message: format!(
                            "Component belongs in {}, not {proposed_repo}",
                            rule.correct_repo()
                        ),
                        rule_violated: format!(
                            "Component placement: {}",
                            rule.component_pattern()
                        ),
                        fix_required: format!("Move to {}", rule.destination()),
                        file_path: None,
                    },
                    &*self.clock,
                )
            })
            .collect();
        debug!(
            task_id = %task.id(),
            repo = %proposed_repo,
            rules = rules.len(),
            violations = violations.len(),
            "placement checked"
        );
        Ok(violations)
    }

    async fn validate_scale(
        &self,
        task: &Task,
        proposed_solution: &str,
        actual_users: u32,
    ) -> GovernanceResult<Vec<Violation>> {
        if actual_users > self.scale.small_user_limit {
            return Ok(Vec::new());
        }
        let violations: Vec<Violation> = self
            .classifier
            .heavy_infrastructure_terms(proposed_solution)
            .into_iter()
            .map(|term| {
                Violation::new(
                    task.id(),
                    ViolationKind::OverEngineering,
                    Severity::High,
                    ViolationDetails {
                        message: format!("Over-engineering: {term} for {actual_users} user(s)"),
                        rule_violated: "Start Small, Scale Smart principle".to_owned(),
                        fix_required: format!("Use Tier 1 solution for {actual_users} users"),
                        file_path: None,
                    },
                    &*self.clock,
                )
            })
            .collect();
        debug!(
            task_id = %task.id(),
            actual_users,
            violations = violations.len(),
            "scale checked"
        );
        Ok(violations)
    }

    async fn validate_task_files(&self, task: &Task) -> GovernanceResult<Vec<Violation>> {
        let mut violations = Vec::new();
        for file_path in task.related_files() {
            violations.extend(self.check_file(task, file_path).await?);
        }
        Ok(violations)
    }

    fn determine_repo(&self, description: &str) -> Option<RepoName> {
        self.classifier.classify_repo(description)
    }
}
