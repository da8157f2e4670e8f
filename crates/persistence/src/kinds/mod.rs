//! Entity kinds.
//!
//! An entity kind is plain data: a [`KindInfo`] naming the kind and its
//! filterable fields, plus the mapping functions the generic repository calls
//! to move between typed entities and generic node rows. Adding a kind means
//! declaring another [`EntityKind`] static; no query text is written per kind.
//!
//! | Kind | Type name | Attributes | Parent property |
//! |------|-----------|------------|-----------------|
//! | RegisteredModel | `kf.RegisteredModel` | context | |
//! | ModelVersion | `kf.ModelVersion` | context | `registered_model_id` |
//! | Experiment | `kf.Experiment` | context | |
//! | ExperimentRun | `kf.ExperimentRun` | context | `experiment_id` |
//! | ModelArtifact | `kf.ModelArtifact` | artifact | |
//! | DocArtifact | `kf.DocArtifact` | artifact | |
//! | ServingEnvironment | `kf.ServingEnvironment` | context | |
//! | InferenceService | `kf.InferenceService` | context | `serving_environment_id` |

mod artifact;
mod experiment;
pub mod mapping;
mod model;
mod serving;

pub use artifact::{DOC_ARTIFACT, DocArtifact, MODEL_ARTIFACT, ModelArtifact};
pub use experiment::{EXPERIMENT, EXPERIMENT_RUN, Experiment, ExperimentRun};
pub use model::{MODEL_VERSION, ModelVersion, REGISTERED_MODEL, RegisteredModel};
pub use serving::{INFERENCE_SERVICE, InferenceService, SERVING_ENVIRONMENT, ServingEnvironment};

use crate::error::StorageResult;
use crate::filter::{FieldRegistry, Predicate};
use crate::types::{Entity, ListOptions, Node, PropertyRow};

/// Static description of one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct KindInfo {
    /// Human-readable name used in errors and logs.
    pub entity_name: &'static str,
    /// Name registered in the type table.
    pub type_name: &'static str,
    /// Declared properties, which are also the kind's filter registry.
    pub fields: FieldRegistry,
    /// Declared integer property holding the parent id, for child kinds.
    ///
    /// Child kinds store their name as `"{parentId}:{name}"`.
    pub parent_property: Option<&'static str>,
}

/// Builds the node row for an entity.
pub type ToNodeFn<A> = fn(&KindInfo, &Entity<A>, i64, i64) -> StorageResult<Node>;

/// Flattens an entity's properties into rows.
pub type ToPropertiesFn<A> = fn(&KindInfo, &Entity<A>) -> StorageResult<Vec<PropertyRow>>;

/// Rebuilds an entity from its rows.
pub type FromRowsFn<A> = fn(&KindInfo, Node, Vec<PropertyRow>) -> StorageResult<Entity<A>>;

/// Turns list options into a selection predicate.
pub type ListFilterFn = fn(&KindInfo, &ListOptions) -> StorageResult<Option<Predicate>>;

/// Everything the generic repository needs to serve one kind.
pub struct EntityKind<A> {
    /// Kind description.
    pub info: KindInfo,
    /// Entity to node row. Arguments are the entity, its type id and the
    /// current time in milliseconds.
    pub to_node: ToNodeFn<A>,
    /// Entity to property rows, declared first then custom.
    pub to_properties: ToPropertiesFn<A>,
    /// Node and property rows to entity.
    pub from_rows: FromRowsFn<A>,
    /// Whether saving the entity inserts a new node.
    pub is_new: fn(&Entity<A>) -> bool,
    /// Selection predicate for a list request.
    pub list_filter: ListFilterFn,
}

impl<A> std::fmt::Debug for EntityKind<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityKind")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl<A> EntityKind<A> {
    /// Returns the entity name.
    pub fn entity_name(&self) -> &'static str {
        self.info.entity_name
    }

    /// Returns true for kinds scoped under a parent entity.
    pub fn is_child(&self) -> bool {
        self.info.parent_property.is_some()
    }
}
