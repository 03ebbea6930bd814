//! Text classification port.

use crate::registry::domain::RepoName;

/// Matching strategy behind the placement and scale rules.
///
/// The rule engine only asks these three questions, so a keyword list, a
/// regex set or a model-backed classifier can be swapped in without
/// touching the engine or the workflow.
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    /// Returns `true` when `text` mentions `term`.
    fn mentions(&self, text: &str, term: &str) -> bool;

    /// Returns the heavy-infrastructure terms found in `solution`, in
    /// vocabulary order.
    fn heavy_infrastructure_terms(&self, solution: &str) -> Vec<String>;

    /// Suggests a repository for a task description.
    fn classify_repo(&self, description: &str) -> Option<RepoName>;
}
