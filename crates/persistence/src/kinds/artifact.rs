//! Artifact kinds.

use crate::filter::{DeclaredField, FieldRegistry};
use crate::types::{ArtifactAttributes, Entity, ValueKind};

use super::{EntityKind, KindInfo, mapping};

/// A model artifact: weights or another binary produced for a model version.
pub type ModelArtifact = Entity<ArtifactAttributes>;

/// A documentation artifact.
pub type DocArtifact = Entity<ArtifactAttributes>;

static MODEL_ARTIFACT_FIELDS: &[DeclaredField] = &[
    DeclaredField::new("description", ValueKind::String),
    DeclaredField::new("uri", ValueKind::String),
    DeclaredField::new("state", ValueKind::String),
    DeclaredField::new("model_format_name", ValueKind::String),
    DeclaredField::new("model_format_version", ValueKind::String),
    DeclaredField::new("storage_key", ValueKind::String),
    DeclaredField::new("storage_path", ValueKind::String),
    DeclaredField::new("service_account_name", ValueKind::String),
    DeclaredField::new("model_source_kind", ValueKind::String),
    DeclaredField::new("model_source_class", ValueKind::String),
    DeclaredField::new("model_source_group", ValueKind::String),
    DeclaredField::new("model_source_id", ValueKind::String),
    DeclaredField::new("model_source_name", ValueKind::String),
];

static DOC_ARTIFACT_FIELDS: &[DeclaredField] = &[
    DeclaredField::new("description", ValueKind::String),
    DeclaredField::new("uri", ValueKind::String),
    DeclaredField::new("state", ValueKind::String),
];

/// Kind descriptor for model artifacts.
pub static MODEL_ARTIFACT: EntityKind<ArtifactAttributes> = EntityKind {
    info: KindInfo {
        entity_name: "model artifact",
        type_name: "kf.ModelArtifact",
        fields: FieldRegistry::new(MODEL_ARTIFACT_FIELDS, false),
        parent_property: None,
    },
    to_node: mapping::to_node::<ArtifactAttributes>,
    to_properties: mapping::artifact_properties,
    from_rows: mapping::artifact_from_rows,
    is_new: mapping::is_new::<ArtifactAttributes>,
    list_filter: mapping::list_filter,
};

/// Kind descriptor for documentation artifacts.
pub static DOC_ARTIFACT: EntityKind<ArtifactAttributes> = EntityKind {
    info: KindInfo {
        entity_name: "doc artifact",
        type_name: "kf.DocArtifact",
        fields: FieldRegistry::new(DOC_ARTIFACT_FIELDS, false),
        parent_property: None,
    },
    to_node: mapping::to_node::<ArtifactAttributes>,
    to_properties: mapping::artifact_properties,
    from_rows: mapping::artifact_from_rows,
    is_new: mapping::is_new::<ArtifactAttributes>,
    list_filter: mapping::list_filter,
};
