//! Diesel schema for registry persistence.

diesel::table! {
    /// Declared architecture components.
    architecture_components (id) {
        /// Component identifier.
        id -> Uuid,
        /// Component name, unique together with `repo`.
        #[max_length = 200]
        name -> Varchar,
        /// Structural kind.
        #[max_length = 20]
        kind -> Varchar,
        /// Owning repository.
        #[max_length = 100]
        repo -> Varchar,
        /// Expected code location.
        #[max_length = 500]
        expected_path -> Nullable<Varchar>,
        /// Free-text description.
        description -> Nullable<Text>,
        /// Allow and forbid path fragments.
        scope -> Jsonb,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Registering actor.
        #[max_length = 100]
        registered_by -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// File-to-component mappings keyed by unique file path.
    code_component_mappings (id) {
        /// Mapping identifier.
        id -> Uuid,
        /// Mapped file path.
        #[max_length = 500]
        file_path -> Varchar,
        /// Target component.
        component_id -> Uuid,
        /// Mapping kind.
        #[max_length = 20]
        kind -> Varchar,
        /// Human-authored reason.
        reason -> Text,
        /// Reviewer validation flag.
        validated -> Bool,
        /// Creating actor.
        #[max_length = 100]
        created_by -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ledger of files detected without a mapping.
    unregistered_files (id) {
        /// Row identifier.
        id -> Uuid,
        /// Detected file path.
        #[max_length = 500]
        file_path -> Varchar,
        /// Repository the file was seen in.
        #[max_length = 100]
        repo -> Varchar,
        /// First detection time.
        first_seen -> Timestamptz,
        /// Latest detection time.
        last_seen -> Timestamptz,
        /// Detection counter.
        detection_count -> Int4,
        /// Review status.
        #[max_length = 20]
        status -> Varchar,
        /// Component that resolved the row.
        resolved_component_id -> Nullable<Uuid>,
        /// Reviewer notes.
        review_notes -> Nullable<Text>,
        /// Reviewer or resolving actor.
        #[max_length = 100]
        reviewed_by -> Nullable<Varchar>,
        /// Review time.
        reviewed_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(code_component_mappings -> architecture_components (component_id));

diesel::allow_tables_to_appear_in_same_query!(
    architecture_components,
    code_component_mappings,
    unregistered_files,
);
