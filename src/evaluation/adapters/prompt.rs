//! Prompt rendering for evaluator requests.

use crate::evaluation::domain::{EvaluationKind, EvaluationRequest};
use minijinja::{Environment, context};
use thiserror::Error;

const PLAN_TEMPLATE_NAME: &str = "plan";
const COMPLETION_TEMPLATE_NAME: &str = "completion";

const PLAN_TEMPLATE: &str = "\
Evaluate this task plan:

TASK: {{ title }}
DESCRIPTION: {{ description }}

SCALE REALITY:
- Actual users TODAY: {{ actual_users }}
- Proposed solution: {{ proposed_solution }}
{% if repo %}- Target repository: {{ repo }}
{% endif %}
EVALUATE:
1. Scale appropriateness (is the solution over-engineered?)
2. Component placement (correct repository?)
3. Implementation approach (reasonable?)

Provide:
- Overall grade (F/D/C/B/A or OVER_ENGINEERED)
- Scale appropriateness grade
- Critical blockers (if any)
- Required fixes before proceeding
";

const COMPLETION_TEMPLATE: &str = "\
Evaluate completed task:

TASK: {{ title }}
DESCRIPTION: {{ description }}
REPO: {% if repo %}{{ repo }}{% else %}unassigned{% endif %}

VALIDATE:
1. Was it implemented in the correct repository?
2. Does it match architecture decisions?
3. Is it portable and deployable?
4. Any over-engineering detected?

Provide:
- Overall grade (F/D/C/B/A)
- Category grades
- Critical issues (if any)
- Required fixes before merge
";

/// Error raised while rendering an evaluator prompt.
#[derive(Debug, Error)]
#[error("failed to render evaluator prompt: {0}")]
pub struct PromptError(#[from] minijinja::Error);

/// Renders the natural-language prompt sent alongside each request.
#[derive(Debug)]
pub struct PromptRenderer {
    environment: Environment<'static>,
}

impl PromptRenderer {
    /// Creates a renderer with the built-in plan and completion templates.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError`] when a built-in template fails to compile.
    pub fn new() -> Result<Self, PromptError> {
        let mut environment = Environment::new();
        environment.add_template(PLAN_TEMPLATE_NAME, PLAN_TEMPLATE)?;
        environment.add_template(COMPLETION_TEMPLATE_NAME, COMPLETION_TEMPLATE)?;
        Ok(Self { environment })
    }

    /// Renders the prompt for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError`] when rendering fails.
    pub fn render(&self, request: &EvaluationRequest) -> Result<String, PromptError> {
        let name = match request.kind() {
            EvaluationKind::Plan => PLAN_TEMPLATE_NAME,
            EvaluationKind::Completion => COMPLETION_TEMPLATE_NAME,
        };
        let template = self.environment.get_template(name)?;
        let rendered = template.render(context! {
            title => request.task_title(),
            description => request.task_description(),
            repo => request.repo().map(ToString::to_string),
            actual_users => request.actual_users(),
            proposed_solution => request.proposed_solution(),
        })?;
        Ok(rendered)
    }
}
