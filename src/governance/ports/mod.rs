//! Port contracts for the governance context.

mod alignment;
mod classifier;
mod repository;
mod rules;

#[cfg(test)]
pub use alignment::MockFileAlignment;
pub use alignment::FileAlignment;
#[cfg(test)]
pub use classifier::MockClassifier;
pub use classifier::Classifier;
pub use repository::{
    GovernanceRepositoryError, GovernanceRepositoryResult, PlacementRuleRepository,
    ViolationRepository,
};
#[cfg(test)]
pub use rules::MockGovernanceRules;
pub use rules::{GovernanceError, GovernanceResult, GovernanceRules};
