//! Experiments and experiment runs.

use crate::filter::{DeclaredField, FieldRegistry};
use crate::types::{ContextAttributes, Entity, ValueKind};

use super::{EntityKind, KindInfo, mapping};

/// An experiment.
pub type Experiment = Entity<ContextAttributes>;

/// One run of an experiment.
pub type ExperimentRun = Entity<ContextAttributes>;

static EXPERIMENT_FIELDS: &[DeclaredField] = &[
    DeclaredField::new("description", ValueKind::String),
    DeclaredField::new("owner", ValueKind::String),
    DeclaredField::new("state", ValueKind::String),
];

static EXPERIMENT_RUN_FIELDS: &[DeclaredField] = &[
    DeclaredField::new("description", ValueKind::String),
    DeclaredField::new("owner", ValueKind::String),
    DeclaredField::new("state", ValueKind::String),
    DeclaredField::new("status", ValueKind::String),
    DeclaredField::new("start_time_since_epoch", ValueKind::Int),
    DeclaredField::new("end_time_since_epoch", ValueKind::Int),
    DeclaredField::new("experiment_id", ValueKind::Int),
];

/// Kind descriptor for experiments.
pub static EXPERIMENT: EntityKind<ContextAttributes> = EntityKind {
    info: KindInfo {
        entity_name: "experiment",
        type_name: "kf.Experiment",
        fields: FieldRegistry::new(EXPERIMENT_FIELDS, false),
        parent_property: None,
    },
    to_node: mapping::to_node::<ContextAttributes>,
    to_properties: mapping::context_properties::<ContextAttributes>,
    from_rows: mapping::context_from_rows,
    is_new: mapping::is_new::<ContextAttributes>,
    list_filter: mapping::list_filter,
};

/// Kind descriptor for experiment runs, scoped under an experiment.
pub static EXPERIMENT_RUN: EntityKind<ContextAttributes> = EntityKind {
    info: KindInfo {
        entity_name: "experiment run",
        type_name: "kf.ExperimentRun",
        fields: FieldRegistry::new(EXPERIMENT_RUN_FIELDS, true),
        parent_property: Some("experiment_id"),
    },
    to_node: mapping::to_node::<ContextAttributes>,
    to_properties: mapping::context_properties::<ContextAttributes>,
    from_rows: mapping::context_from_rows,
    is_new: mapping::is_new::<ContextAttributes>,
    list_filter: mapping::list_filter,
};
