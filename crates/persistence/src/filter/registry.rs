//! Per-kind filter field registry.
//!
//! Each entity kind declares which property names it knows about and what
//! value kind each holds. The registry resolves a field as written in a
//! filter query to either a node column or a property.

use super::parser::FieldPath;
use super::predicate::{NodeColumn, ValueColumn};
use crate::error::QueryError;
use crate::types::ValueKind;

/// A property declared by an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredField {
    /// Property name.
    pub name: &'static str,
    /// Value kind stored under this name.
    pub kind: ValueKind,
}

impl DeclaredField {
    /// Declares a property.
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self { name, kind }
    }
}

/// The filterable fields of one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldRegistry {
    fields: &'static [DeclaredField],
    scoped_names: bool,
}

/// How a filter field resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedField {
    /// A fixed node column.
    Column(NodeColumn),
    /// A property row.
    Property {
        /// Property name.
        name: String,
        /// Whether the property is free-form.
        is_custom: bool,
        /// Declared value kind, when the kind declares the property.
        declared: Option<ValueKind>,
        /// Explicit value column selected by a suffix.
        suffix: Option<ValueColumn>,
    },
}

const PROPERTIES_PREFIX: &str = "properties";
const CUSTOM_PROPERTIES_PREFIX: &str = "customProperties";

impl FieldRegistry {
    /// Creates a registry over the declared fields.
    ///
    /// `scoped_names` is set for child kinds whose stored name carries a
    /// parent prefix.
    pub const fn new(fields: &'static [DeclaredField], scoped_names: bool) -> Self {
        Self {
            fields,
            scoped_names,
        }
    }

    /// Returns the declared fields.
    pub fn fields(&self) -> &'static [DeclaredField] {
        self.fields
    }

    /// Looks up a declared property.
    pub fn declared(&self, name: &str) -> Option<ValueKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    /// Resolves a reserved column name or alias.
    pub fn column(&self, name: &str) -> Option<NodeColumn> {
        let column = match name {
            "id" => NodeColumn::Id,
            "name" if self.scoped_names => NodeColumn::ScopedName,
            "name" => NodeColumn::Name,
            "external_id" | "externalId" => NodeColumn::ExternalId,
            "create_time" | "createTimeSinceEpoch" => NodeColumn::CreateTime,
            "last_update_time" | "lastUpdateTimeSinceEpoch" => NodeColumn::LastUpdateTime,
            _ => return None,
        };
        Some(column)
    }

    /// Resolves a field path.
    ///
    /// Resolution order: reserved column; `properties.` / `customProperties.`
    /// namespace; declared property; otherwise a custom property. A trailing
    /// `.string_value`, `.int_value`, `.double_value` or `.bool_value`
    /// segment selects the value column explicitly.
    ///
    /// Custom property keys are free-form, so any bare name that is neither a
    /// reserved column nor declared belongs to the custom registry and never
    /// fails; it simply matches no node that lacks that key. Only
    /// `properties.<name>` with an undeclared name is rejected.
    pub fn resolve(&self, path: &FieldPath) -> Result<ResolvedField, QueryError> {
        let mut segments: &[String] = &path.segments;

        if let [single] = segments {
            if let Some(column) = self.column(single) {
                return Ok(ResolvedField::Column(column));
            }
        }

        let mut suffix = None;
        if segments.len() > 1 {
            if let Some(column) = segments.last().and_then(|s| value_suffix(s)) {
                suffix = Some(column);
                segments = &segments[..segments.len() - 1];
            }
        }

        let namespace = match segments {
            [first, rest @ ..] if !rest.is_empty() && first == PROPERTIES_PREFIX => {
                segments = rest;
                Some(false)
            }
            [first, rest @ ..] if !rest.is_empty() && first == CUSTOM_PROPERTIES_PREFIX => {
                segments = rest;
                Some(true)
            }
            _ => None,
        };

        let name = segments.join(".");
        let declared = self.declared(&name);

        let is_custom = match (namespace, declared) {
            (Some(false), None) => {
                return Err(QueryError::invalid_filter(
                    format!("unknown property '{}'", name),
                    path.position,
                ));
            }
            (Some(is_custom), _) => is_custom,
            (None, Some(_)) => false,
            (None, None) => true,
        };

        Ok(ResolvedField::Property {
            declared: if is_custom { None } else { declared },
            name,
            is_custom,
            suffix,
        })
    }
}

fn value_suffix(segment: &str) -> Option<ValueColumn> {
    match segment {
        "string_value" => Some(ValueColumn::String),
        "int_value" => Some(ValueColumn::Int),
        "double_value" => Some(ValueColumn::Double),
        "bool_value" => Some(ValueColumn::Bool),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[DeclaredField] = &[
        DeclaredField::new("description", ValueKind::String),
        DeclaredField::new("registered_model_id", ValueKind::Int),
    ];

    fn path(segments: &[&str]) -> FieldPath {
        FieldPath {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            position: 0,
        }
    }

    #[test]
    fn test_columns_and_aliases() {
        let registry = FieldRegistry::new(FIELDS, false);
        for (name, column) in [
            ("id", NodeColumn::Id),
            ("name", NodeColumn::Name),
            ("externalId", NodeColumn::ExternalId),
            ("create_time", NodeColumn::CreateTime),
            ("lastUpdateTimeSinceEpoch", NodeColumn::LastUpdateTime),
        ] {
            assert_eq!(
                registry.resolve(&path(&[name])).unwrap(),
                ResolvedField::Column(column)
            );
        }

        let scoped = FieldRegistry::new(FIELDS, true);
        assert_eq!(
            scoped.resolve(&path(&["name"])).unwrap(),
            ResolvedField::Column(NodeColumn::ScopedName)
        );
    }

    #[test]
    fn test_declared_and_custom_properties() {
        let registry = FieldRegistry::new(FIELDS, false);

        assert_eq!(
            registry.resolve(&path(&["description"])).unwrap(),
            ResolvedField::Property {
                name: "description".into(),
                is_custom: false,
                declared: Some(ValueKind::String),
                suffix: None,
            }
        );

        assert_eq!(
            registry.resolve(&path(&["catalog", "source"])).unwrap(),
            ResolvedField::Property {
                name: "catalog.source".into(),
                is_custom: true,
                declared: None,
                suffix: None,
            }
        );

        assert_eq!(
            registry
                .resolve(&path(&["customProperties", "description", "string_value"]))
                .unwrap(),
            ResolvedField::Property {
                name: "description".into(),
                is_custom: true,
                declared: None,
                suffix: Some(ValueColumn::String),
            }
        );
    }

    #[test]
    fn test_unknown_declared_property() {
        let registry = FieldRegistry::new(FIELDS, false);
        let err = registry
            .resolve(&path(&["properties", "nonexistent"]))
            .unwrap_err();
        assert!(err.to_string().contains("unknown property 'nonexistent'"));
    }

    #[test]
    fn test_namespaced_column_name_is_property() {
        let registry = FieldRegistry::new(FIELDS, false);
        assert!(matches!(
            registry.resolve(&path(&["customProperties", "name"])).unwrap(),
            ResolvedField::Property { is_custom: true, .. }
        ));
    }
}
