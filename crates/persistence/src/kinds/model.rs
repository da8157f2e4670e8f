//! Registered models and their versions.

use crate::filter::{DeclaredField, FieldRegistry};
use crate::types::{ContextAttributes, Entity, ValueKind};

use super::{EntityKind, KindInfo, mapping};

/// A registered model.
pub type RegisteredModel = Entity<ContextAttributes>;

/// A version of a registered model.
pub type ModelVersion = Entity<ContextAttributes>;

static REGISTERED_MODEL_FIELDS: &[DeclaredField] = &[
    DeclaredField::new("description", ValueKind::String),
    DeclaredField::new("owner", ValueKind::String),
    DeclaredField::new("state", ValueKind::String),
    DeclaredField::new("language", ValueKind::Struct),
    DeclaredField::new("library_name", ValueKind::String),
    DeclaredField::new("license", ValueKind::String),
    DeclaredField::new("license_link", ValueKind::String),
    DeclaredField::new("logo", ValueKind::String),
    DeclaredField::new("maturity", ValueKind::String),
    DeclaredField::new("provider", ValueKind::String),
    DeclaredField::new("readme", ValueKind::String),
];

static MODEL_VERSION_FIELDS: &[DeclaredField] = &[
    DeclaredField::new("description", ValueKind::String),
    DeclaredField::new("author", ValueKind::String),
    DeclaredField::new("state", ValueKind::String),
    DeclaredField::new("registered_model_id", ValueKind::Int),
];

/// Kind descriptor for registered models.
pub static REGISTERED_MODEL: EntityKind<ContextAttributes> = EntityKind {
    info: KindInfo {
        entity_name: "registered model",
        type_name: "kf.RegisteredModel",
        fields: FieldRegistry::new(REGISTERED_MODEL_FIELDS, false),
        parent_property: None,
    },
    to_node: mapping::to_node::<ContextAttributes>,
    to_properties: mapping::context_properties::<ContextAttributes>,
    from_rows: mapping::context_from_rows,
    is_new: mapping::is_new::<ContextAttributes>,
    list_filter: mapping::list_filter,
};

/// Kind descriptor for model versions, scoped under a registered model.
pub static MODEL_VERSION: EntityKind<ContextAttributes> = EntityKind {
    info: KindInfo {
        entity_name: "model version",
        type_name: "kf.ModelVersion",
        fields: FieldRegistry::new(MODEL_VERSION_FIELDS, true),
        parent_property: Some("registered_model_id"),
    },
    to_node: mapping::to_node::<ContextAttributes>,
    to_properties: mapping::context_properties::<ContextAttributes>,
    from_rows: mapping::context_from_rows,
    is_new: mapping::is_new::<ContextAttributes>,
    list_filter: mapping::list_filter,
};
