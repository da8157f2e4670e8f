//! Compiles parsed filter expressions into predicates for one entity kind.

use super::parser::{CompareOp, FieldPath, FilterExpr, FilterParser, Literal, LogicalOp};
use super::predicate::{NodeColumn, Predicate, ValueColumn};
use super::registry::{FieldRegistry, ResolvedField};
use crate::error::QueryError;
use crate::types::ValueKind;

/// Compiles filter query text against a kind's field registry.
pub struct FilterCompiler<'a> {
    registry: &'a FieldRegistry,
}

impl<'a> FilterCompiler<'a> {
    /// Creates a compiler for one kind.
    pub fn new(registry: &'a FieldRegistry) -> Self {
        Self { registry }
    }

    /// Parses and compiles filter text.
    ///
    /// Blank text compiles to `None` (no restriction).
    pub fn compile_str(&self, input: &str) -> Result<Option<Predicate>, QueryError> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        let expr = FilterParser::parse(input)?;
        self.compile(&expr).map(Some)
    }

    /// Compiles a parsed expression.
    pub fn compile(&self, expr: &FilterExpr) -> Result<Predicate, QueryError> {
        match expr {
            FilterExpr::Comparison { field, op, value } => {
                self.compile_comparison(field, *op, value)
            }
            FilterExpr::Logical { left, op, right } => {
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                Ok(match op {
                    LogicalOp::And => merge(left, right, Predicate::And, |p| match p {
                        Predicate::And(inner) => Ok(inner),
                        other => Err(other),
                    }),
                    LogicalOp::Or => merge(left, right, Predicate::Or, |p| match p {
                        Predicate::Or(inner) => Ok(inner),
                        other => Err(other),
                    }),
                })
            }
        }
    }

    fn compile_comparison(
        &self,
        field: &FieldPath,
        op: CompareOp,
        value: &Literal,
    ) -> Result<Predicate, QueryError> {
        match self.registry.resolve(field)? {
            ResolvedField::Column(column) => compile_column(field, column, op, value),
            ResolvedField::Property {
                name,
                is_custom,
                declared,
                suffix,
            } => {
                let (columns, value) = property_columns(field, declared, suffix, op, value)?;
                Ok(Predicate::Property {
                    name,
                    is_custom,
                    columns,
                    op,
                    value,
                })
            }
        }
    }
}

/// Combines two predicates under one logical operator, keeping the tree flat.
fn merge(
    left: Predicate,
    right: Predicate,
    wrap: fn(Vec<Predicate>) -> Predicate,
    unwrap: fn(Predicate) -> Result<Vec<Predicate>, Predicate>,
) -> Predicate {
    let mut parts = Vec::new();
    for side in [left, right] {
        match unwrap(side) {
            Ok(inner) => parts.extend(inner),
            Err(single) => parts.push(single),
        }
    }
    wrap(parts)
}

fn mismatch(field: &FieldPath, expected: &str, value: &Literal) -> QueryError {
    QueryError::invalid_filter(
        format!(
            "field '{}' expects a {} value, got {}",
            field.joined(),
            expected,
            value.type_name()
        ),
        field.position,
    )
}

fn pattern_not_allowed(field: &FieldPath, op: CompareOp) -> QueryError {
    QueryError::invalid_filter(
        format!("{} is only supported on string fields, not '{}'", op, field.joined()),
        field.position,
    )
}

fn compile_column(
    field: &FieldPath,
    column: NodeColumn,
    op: CompareOp,
    value: &Literal,
) -> Result<Predicate, QueryError> {
    if column.is_text() {
        if !matches!(value, Literal::String(_)) {
            return Err(mismatch(field, "string", value));
        }
    } else {
        if op.is_pattern() {
            return Err(pattern_not_allowed(field, op));
        }
        if !matches!(value, Literal::Int(_)) {
            return Err(mismatch(field, "integer", value));
        }
    }
    Ok(Predicate::Column {
        column,
        op,
        value: value.clone(),
    })
}

/// Picks the value column(s) for a property comparison and checks the literal.
fn property_columns(
    field: &FieldPath,
    declared: Option<ValueKind>,
    suffix: Option<ValueColumn>,
    op: CompareOp,
    value: &Literal,
) -> Result<(Vec<ValueColumn>, Literal), QueryError> {
    let declared_column = match declared {
        Some(ValueKind::String) => Some(ValueColumn::String),
        Some(ValueKind::Int) => Some(ValueColumn::Int),
        Some(ValueKind::Double) => Some(ValueColumn::Double),
        Some(ValueKind::Bool) => Some(ValueColumn::Bool),
        Some(kind @ (ValueKind::Bytes | ValueKind::Struct)) => {
            return Err(QueryError::invalid_filter(
                format!("field '{}' holds {} values and cannot be filtered", field.joined(), kind),
                field.position,
            ));
        }
        None => None,
    };

    let column = match (declared_column, suffix) {
        (Some(declared), Some(explicit)) if declared != explicit => {
            return Err(QueryError::invalid_filter(
                format!(
                    "field '{}' is declared as {}, not {}",
                    field.joined(),
                    declared_kind_name(declared),
                    declared_kind_name(explicit)
                ),
                field.position,
            ));
        }
        (Some(column), _) | (None, Some(column)) => Some(column),
        (None, None) => None,
    };

    if op.is_pattern() && !matches!(column, None | Some(ValueColumn::String)) {
        return Err(pattern_not_allowed(field, op));
    }

    match (column, value) {
        (Some(ValueColumn::String), Literal::String(_)) => {
            Ok((vec![ValueColumn::String], value.clone()))
        }
        (Some(ValueColumn::String), _) => Err(mismatch(field, "string", value)),

        (Some(ValueColumn::Int), Literal::Int(_)) => Ok((vec![ValueColumn::Int], value.clone())),
        (Some(ValueColumn::Int), _) => Err(mismatch(field, "integer", value)),

        (Some(ValueColumn::Double), Literal::Double(_)) => {
            Ok((vec![ValueColumn::Double], value.clone()))
        }
        (Some(ValueColumn::Double), Literal::Int(i)) => {
            Ok((vec![ValueColumn::Double], Literal::Double(*i as f64)))
        }
        (Some(ValueColumn::Double), _) => Err(mismatch(field, "double", value)),

        (Some(ValueColumn::Bool), Literal::Bool(_)) if !op.is_ordering() => {
            Ok((vec![ValueColumn::Bool], value.clone()))
        }
        (Some(ValueColumn::Bool), Literal::Bool(_)) => Err(QueryError::invalid_filter(
            format!("{} is not supported on boolean field '{}'", op, field.joined()),
            field.position,
        )),
        (Some(ValueColumn::Bool), _) => Err(mismatch(field, "boolean", value)),

        (None, Literal::String(_)) => Ok((vec![ValueColumn::String], value.clone())),
        (None, Literal::Bool(_)) if !op.is_pattern() && !op.is_ordering() => {
            Ok((vec![ValueColumn::Bool], value.clone()))
        }
        (None, Literal::Int(_) | Literal::Double(_)) if !op.is_pattern() => {
            Ok((vec![ValueColumn::Int, ValueColumn::Double], value.clone()))
        }
        (None, _) => Err(QueryError::invalid_filter(
            format!(
                "{} cannot compare field '{}' with a {} value",
                op,
                field.joined(),
                value.type_name()
            ),
            field.position,
        )),
    }
}

fn declared_kind_name(column: ValueColumn) -> &'static str {
    match column {
        ValueColumn::String => "string",
        ValueColumn::Int => "int",
        ValueColumn::Double => "double",
        ValueColumn::Bool => "bool",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DeclaredField;

    const FIELDS: &[DeclaredField] = &[
        DeclaredField::new("description", ValueKind::String),
        DeclaredField::new("registered_model_id", ValueKind::Int),
        DeclaredField::new("accuracy", ValueKind::Double),
        DeclaredField::new("archived", ValueKind::Bool),
        DeclaredField::new("payload", ValueKind::Struct),
    ];

    const REGISTRY: FieldRegistry = FieldRegistry::new(FIELDS, false);

    fn compile(input: &str) -> Result<Predicate, QueryError> {
        FilterCompiler::new(&REGISTRY)
            .compile_str(input)
            .map(|p| p.expect("non-empty filter"))
    }

    #[test]
    fn test_blank_filter_is_none() {
        let compiler = FilterCompiler::new(&REGISTRY);
        assert_eq!(compiler.compile_str("").unwrap(), None);
        assert_eq!(compiler.compile_str("  \t").unwrap(), None);
    }

    #[test]
    fn test_name_column() {
        assert_eq!(
            compile("name = 'foo'").unwrap(),
            Predicate::Column {
                column: NodeColumn::Name,
                op: CompareOp::Eq,
                value: Literal::String("foo".into()),
            }
        );
    }

    #[test]
    fn test_custom_property_semi_join() {
        assert_eq!(
            compile("catalog.source = 'kf-model-catalog'").unwrap(),
            Predicate::Property {
                name: "catalog.source".into(),
                is_custom: true,
                columns: vec![ValueColumn::String],
                op: CompareOp::Eq,
                value: Literal::String("kf-model-catalog".into()),
            }
        );
    }

    #[test]
    fn test_untyped_number_checks_both_numeric_columns() {
        match compile("customProperties.epochs >= 10").unwrap() {
            Predicate::Property { columns, .. } => {
                assert_eq!(columns, vec![ValueColumn::Int, ValueColumn::Double]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_declared_double_coerces_int_literal() {
        match compile("accuracy > 1").unwrap() {
            Predicate::Property { columns, value, .. } => {
                assert_eq!(columns, vec![ValueColumn::Double]);
                assert_eq!(value, Literal::Double(1.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_and_or_flatten() {
        let predicate = compile("a = 'x' AND b = 'y' AND (c = 'z' OR d = 'w' OR e = 'v')").unwrap();
        match predicate {
            Predicate::And(parts) => {
                assert_eq!(parts.len(), 3);
                assert!(matches!(&parts[2], Predicate::Or(inner) if inner.len() == 3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_type_mismatches_rejected() {
        for input in [
            "create_time = 'yesterday'",
            "id = 1.5",
            "name = 3",
            "id LIKE 'x%'",
            "description = 4",
            "registered_model_id = 'seven'",
            "registered_model_id LIKE '1%'",
            "archived = 'yes'",
            "archived > true",
            "payload = 'x'",
            "description.int_value = 1",
            "custom_flag LIKE true",
            "custom_num ILIKE 3",
        ] {
            let err = compile(input).unwrap_err();
            assert!(
                matches!(err, QueryError::InvalidFilter { .. }),
                "expected InvalidFilter for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_unknown_declared_field() {
        let err = compile("properties.nonexistent = 'x'").unwrap_err();
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn test_suffix_selects_column() {
        match compile("customProperties.version.int_value = 2").unwrap() {
            Predicate::Property {
                name,
                is_custom,
                columns,
                ..
            } => {
                assert_eq!(name, "version");
                assert!(is_custom);
                assert_eq!(columns, vec![ValueColumn::Int]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_like_on_strings() {
        assert!(compile("name LIKE 'fraud%'").is_ok());
        assert!(compile("description ILIKE '%TREES%'").is_ok());
        assert!(compile("owner LIKE 'a_'").is_ok());
    }
}
