//! Serving environments and inference services.

use crate::filter::{DeclaredField, FieldRegistry};
use crate::types::{ContextAttributes, Entity, ValueKind};

use super::{EntityKind, KindInfo, mapping};

/// A serving environment, such as a namespace models are deployed into.
pub type ServingEnvironment = Entity<ContextAttributes>;

/// A deployed model inside a serving environment.
pub type InferenceService = Entity<ContextAttributes>;

static SERVING_ENVIRONMENT_FIELDS: &[DeclaredField] =
    &[DeclaredField::new("description", ValueKind::String)];

static INFERENCE_SERVICE_FIELDS: &[DeclaredField] = &[
    DeclaredField::new("description", ValueKind::String),
    DeclaredField::new("desired_state", ValueKind::String),
    DeclaredField::new("runtime", ValueKind::String),
    DeclaredField::new("serving_environment_id", ValueKind::Int),
    DeclaredField::new("registered_model_id", ValueKind::Int),
    DeclaredField::new("model_version_id", ValueKind::Int),
];

/// Kind descriptor for serving environments.
pub static SERVING_ENVIRONMENT: EntityKind<ContextAttributes> = EntityKind {
    info: KindInfo {
        entity_name: "serving environment",
        type_name: "kf.ServingEnvironment",
        fields: FieldRegistry::new(SERVING_ENVIRONMENT_FIELDS, false),
        parent_property: None,
    },
    to_node: mapping::to_node::<ContextAttributes>,
    to_properties: mapping::context_properties::<ContextAttributes>,
    from_rows: mapping::context_from_rows,
    is_new: mapping::is_new::<ContextAttributes>,
    list_filter: mapping::list_filter,
};

/// Kind descriptor for inference services, scoped under a serving environment.
pub static INFERENCE_SERVICE: EntityKind<ContextAttributes> = EntityKind {
    info: KindInfo {
        entity_name: "inference service",
        type_name: "kf.InferenceService",
        fields: FieldRegistry::new(INFERENCE_SERVICE_FIELDS, true),
        parent_property: Some("serving_environment_id"),
    },
    to_node: mapping::to_node::<ContextAttributes>,
    to_properties: mapping::context_properties::<ContextAttributes>,
    from_rows: mapping::context_from_rows,
    is_new: mapping::is_new::<ContextAttributes>,
    list_filter: mapping::list_filter,
};
