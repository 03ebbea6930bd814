//! Diesel schema for task persistence.

diesel::table! {
    /// Governed tasks.
    tasks (id) {
        /// Task identifier (UUIDv7).
        id -> Uuid,
        /// Short title.
        #[max_length = 500]
        title -> Varchar,
        /// Free-text description.
        description -> Text,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Priority.
        #[max_length = 20]
        priority -> Varchar,
        /// Assigned repository.
        #[max_length = 100]
        assigned_repo -> Nullable<Varchar>,
        /// User count the plan was sized for.
        actual_users -> Int4,
        /// Proposed solution.
        proposed_solution -> Nullable<Text>,
        /// Attached file paths.
        related_files -> Jsonb,
        /// Latest plan grade.
        #[max_length = 20]
        plan_grade -> Nullable<Varchar>,
        /// Latest completion grade.
        #[max_length = 20]
        completion_grade -> Nullable<Varchar>,
        /// First start time.
        started_at -> Nullable<Timestamptz>,
        /// Completion time.
        completed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Optimistic-concurrency version.
        version -> Int8,
    }
}

diesel::table! {
    /// Evaluator verdicts recorded against tasks.
    evaluation_reports (id) {
        /// Report identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Plan or completion.
        #[max_length = 20]
        kind -> Varchar,
        /// Overall grade.
        #[max_length = 20]
        grade -> Varchar,
        /// Category grades.
        subscores -> Jsonb,
        /// Blockers named by the evaluator.
        blockers -> Jsonb,
        /// Fixes the evaluator asked for.
        required_fixes -> Jsonb,
        /// Verbatim evaluator text.
        raw_text -> Text,
        /// User count the evaluation was made against.
        actual_users -> Nullable<Int4>,
        /// Evaluation time.
        evaluated_at -> Timestamptz,
    }
}

diesel::joinable!(evaluation_reports -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(tasks, evaluation_reports);
