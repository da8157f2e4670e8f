//! Mapping functions shared by the entity kinds.
//!
//! Context kinds keep everything but the node columns in property rows.
//! Artifact kinds additionally carry `uri` and `state` attributes, which are
//! stored as declared properties of the same names and lifted back into the
//! attributes on read.

use crate::error::{BackendError, StorageResult, ValidationError};
use crate::filter::{FilterCompiler, Literal, NodeColumn, Predicate};
use crate::types::{
    ArtifactAttributes, ArtifactState, ContextAttributes, Entity, HasContextAttributes,
    ListOptions, Node, Property, PropertyRow, PropertyValue,
};

use super::KindInfo;

const URI: &str = "uri";
const STATE: &str = "state";

/// Returns true if the entity has never been saved.
pub fn is_new<A>(entity: &Entity<A>) -> bool {
    entity.id.is_none()
}

/// Stored name of a child entity.
pub fn scoped_name(parent_id: i64, name: &str) -> String {
    format!("{}:{}", parent_id, name)
}

/// Strips the parent prefix from a stored child name.
pub fn unscoped_name(stored: &str) -> &str {
    stored.split_once(':').map_or(stored, |(_, name)| name)
}

/// Reads the parent id of a child entity from its declared properties.
pub fn parent_id<A>(info: &KindInfo, entity: &Entity<A>) -> StorageResult<Option<i64>> {
    let Some(property) = info.parent_property else {
        return Ok(None);
    };
    match entity.property(property) {
        Some(PropertyValue::Int(id)) => Ok(Some(*id)),
        Some(other) => Err(ValidationError::InvalidValue {
            entity: info.entity_name.to_string(),
            field: property.to_string(),
            message: format!("expected int, got {}", other.kind()),
        }
        .into()),
        None => Err(ValidationError::MissingRequiredField {
            entity: info.entity_name.to_string(),
            field: property.to_string(),
        }
        .into()),
    }
}

/// Builds the node row for any kind with context attributes.
///
/// Both timestamps are set to `now`; on update the store keeps the stored
/// creation time.
pub fn to_node<A: HasContextAttributes>(
    info: &KindInfo,
    entity: &Entity<A>,
    type_id: i64,
    now: i64,
) -> StorageResult<Node> {
    let name = entity
        .name()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ValidationError::MissingRequiredField {
            entity: info.entity_name.to_string(),
            field: "name".to_string(),
        })?;

    let name = match parent_id(info, entity)? {
        Some(parent) => scoped_name(parent, name),
        None => name.to_string(),
    };

    Ok(Node {
        id: entity.id,
        type_id,
        name,
        external_id: entity
            .external_id()
            .filter(|e| !e.is_empty())
            .map(str::to_string),
        create_time_since_epoch: now,
        last_update_time_since_epoch: now,
    })
}

fn check_declared(info: &KindInfo, property: &Property) -> StorageResult<()> {
    let invalid = |message: String| ValidationError::InvalidValue {
        entity: info.entity_name.to_string(),
        field: property.name.clone(),
        message,
    };
    match info.fields.declared(&property.name) {
        None => Err(invalid("not a declared property".to_string()).into()),
        Some(kind) if kind != property.value.kind() => Err(invalid(format!(
            "expected {}, got {}",
            kind,
            property.value.kind()
        ))
        .into()),
        Some(_) => Ok(()),
    }
}

fn rows<'a>(
    info: &KindInfo,
    declared: impl Iterator<Item = &'a Property>,
    custom: &[Property],
) -> StorageResult<Vec<PropertyRow>> {
    let mut out = Vec::new();
    for property in declared {
        check_declared(info, property)?;
        out.push(PropertyRow::declared(
            property.name.clone(),
            property.value.clone(),
        ));
    }
    out.extend(
        custom
            .iter()
            .map(|p| PropertyRow::custom(p.name.clone(), p.value.clone())),
    );
    Ok(out)
}

/// Flattens declared then custom properties of a context kind.
pub fn context_properties<A>(info: &KindInfo, entity: &Entity<A>) -> StorageResult<Vec<PropertyRow>> {
    rows(info, entity.properties.iter(), &entity.custom_properties)
}

/// Flattens an artifact's properties, storing `uri` and `state` from its
/// attributes.
///
/// Declared properties named `uri` or `state` are ignored in favour of the
/// attributes.
pub fn artifact_properties(
    info: &KindInfo,
    entity: &Entity<ArtifactAttributes>,
) -> StorageResult<Vec<PropertyRow>> {
    let declared = entity
        .properties
        .iter()
        .filter(|p| p.name != URI && p.name != STATE);
    let mut out = rows(info, declared, &entity.custom_properties)?;

    let mut lifted = Vec::new();
    if let Some(uri) = &entity.attributes.uri {
        lifted.push(PropertyRow::declared(URI, PropertyValue::String(uri.clone())));
    }
    if let Some(state) = entity.attributes.state {
        lifted.push(PropertyRow::declared(
            STATE,
            PropertyValue::String(state.as_str().to_string()),
        ));
    }
    // Keep declared rows ahead of custom ones.
    let at = out.iter().take_while(|r| !r.is_custom).count();
    out.splice(at..at, lifted);
    Ok(out)
}

fn context_attributes(info: &KindInfo, node: &Node) -> ContextAttributes {
    let name = if info.parent_property.is_some() {
        unscoped_name(&node.name)
    } else {
        &node.name
    };
    ContextAttributes {
        name: Some(name.to_string()),
        external_id: node.external_id.clone(),
        create_time_since_epoch: Some(node.create_time_since_epoch),
        last_update_time_since_epoch: Some(node.last_update_time_since_epoch),
    }
}

fn split(rows: Vec<PropertyRow>) -> (Vec<Property>, Vec<Property>) {
    let mut declared = Vec::new();
    let mut custom = Vec::new();
    for row in rows {
        let property = Property {
            name: row.name,
            value: row.value,
        };
        if row.is_custom {
            custom.push(property);
        } else {
            declared.push(property);
        }
    }
    (declared, custom)
}

/// Rebuilds a context-kind entity.
pub fn context_from_rows(
    info: &KindInfo,
    node: Node,
    rows: Vec<PropertyRow>,
) -> StorageResult<Entity<ContextAttributes>> {
    let attributes = context_attributes(info, &node);
    let (properties, custom_properties) = split(rows);
    Ok(Entity {
        id: node.id,
        type_id: Some(node.type_id),
        attributes,
        properties,
        custom_properties,
    })
}

/// Rebuilds an artifact, lifting `uri` and `state` out of the declared
/// properties.
pub fn artifact_from_rows(
    info: &KindInfo,
    node: Node,
    rows: Vec<PropertyRow>,
) -> StorageResult<Entity<ArtifactAttributes>> {
    let base = context_attributes(info, &node);
    let node_id = node.stored_id();
    let (declared, custom_properties) = split(rows);

    let corrupt = |name: &str, message: String| BackendError::CorruptProperty {
        node_id,
        name: name.to_string(),
        message,
    };

    let mut attributes = ArtifactAttributes {
        base,
        uri: None,
        state: None,
    };
    let mut properties = Vec::with_capacity(declared.len());
    for property in declared {
        if property.name != URI && property.name != STATE {
            properties.push(property);
            continue;
        }
        let text = match property.value {
            PropertyValue::String(text) => text,
            other => {
                return Err(corrupt(
                    &property.name,
                    format!("expected string, got {}", other.kind()),
                )
                .into());
            }
        };
        if property.name == URI {
            attributes.uri = Some(text);
        } else {
            attributes.state = Some(
                text.parse::<ArtifactState>()
                    .map_err(|e| corrupt(STATE, e))?,
            );
        }
    }

    Ok(Entity {
        id: node.id,
        type_id: Some(node.type_id),
        attributes,
        properties,
        custom_properties,
    })
}

/// Selection for a list request.
///
/// An exact name wins over an external id, which wins over the filter query.
/// Child kinds match names without their parent prefix and are restricted to
/// `parent_resource_id` when it is set; other kinds ignore it.
pub fn list_filter(info: &KindInfo, options: &ListOptions) -> StorageResult<Option<Predicate>> {
    let parent = info.parent_property.zip(options.parent_resource_id);
    let name = options.name.as_deref().filter(|n| !n.is_empty());
    let external_id = options.external_id.as_deref().filter(|e| !e.is_empty());

    let selection = if let Some(name) = name {
        Some(match parent {
            Some((_, parent_id)) => Predicate::column_eq(
                NodeColumn::Name,
                Literal::String(scoped_name(parent_id, name)),
            ),
            None if info.parent_property.is_some() => {
                Predicate::column_eq(NodeColumn::ScopedName, Literal::String(name.to_string()))
            }
            None => Predicate::column_eq(NodeColumn::Name, Literal::String(name.to_string())),
        })
    } else if let Some(external_id) = external_id {
        Some(Predicate::column_eq(
            NodeColumn::ExternalId,
            Literal::String(external_id.to_string()),
        ))
    } else if let Some(filter) = options.filter_query.as_deref() {
        FilterCompiler::new(&info.fields).compile_str(filter)?
    } else {
        None
    };

    let parent = parent.map(|(property, id)| Predicate::declared_int_eq(property, id));
    Ok(Predicate::all([selection, parent]))
}
