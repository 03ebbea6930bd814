//! Domain model for governance rules and violations.

mod error;
mod ids;
mod rule;
mod violation;

pub use error::{GovernanceDomainError, ParseGovernanceValueError};
pub use ids::{PlacementRuleId, ViolationId};
pub use rule::{ComponentPlacementRule, PersistedPlacementRuleData};
pub use violation::{
    PersistedViolationData, Severity, Violation, ViolationDetails, ViolationKind, ViolationStatus,
};
