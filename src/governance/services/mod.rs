//! Rule evaluation and rule administration services.

mod governance;
mod rule_engine;

pub use governance::{
    GovernanceService, GovernanceServiceError, GovernanceServiceResult, RegisterPlacementRuleRequest,
};
pub use rule_engine::{RuleEngine, ScalePolicy};
