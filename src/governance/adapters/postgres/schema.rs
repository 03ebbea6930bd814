//! Diesel schema for governance persistence.

diesel::table! {
    /// Component-to-repository placement rules.
    component_placement_rules (id) {
        /// Rule identifier.
        id -> Uuid,
        /// Component name pattern, unique case-insensitively.
        #[max_length = 200]
        component_pattern -> Varchar,
        /// Repository the component belongs in.
        #[max_length = 100]
        correct_repo -> Varchar,
        /// Location inside the repository.
        #[max_length = 500]
        correct_location -> Nullable<Varchar>,
        /// Why the rule exists.
        rationale -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Rule breaches recorded against tasks.
    violations (id) {
        /// Violation identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Rule family.
        #[max_length = 30]
        kind -> Varchar,
        /// Severity.
        #[max_length = 20]
        severity -> Varchar,
        /// What went wrong.
        message -> Text,
        /// Which rule was broken.
        rule_violated -> Text,
        /// What to do about it.
        fix_required -> Text,
        /// Offending file.
        #[max_length = 500]
        file_path -> Nullable<Varchar>,
        /// Resolution status.
        #[max_length = 20]
        status -> Varchar,
        /// Detection time.
        detected_at -> Timestamptz,
        /// Resolution time.
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(component_placement_rules, violations);
