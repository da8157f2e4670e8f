//! Backend-neutral predicates.
//!
//! The filter compiler and the pagination scope both produce [`Predicate`]
//! trees; storage backends render them into their own query language. Literal
//! values stay inside the tree so that backends always bind them as
//! parameters.

use super::parser::{CompareOp, Literal};
use crate::types::{OrderBy, SortOrder};

/// A fixed column of the node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeColumn {
    /// Node identity.
    Id,
    /// Stored node name.
    Name,
    /// Node name with the `"{parentId}:"` prefix of child kinds removed.
    ScopedName,
    /// External identifier.
    ExternalId,
    /// Creation time.
    CreateTime,
    /// Last update time.
    LastUpdateTime,
}

impl NodeColumn {
    /// Returns true if the column holds text.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            NodeColumn::Name | NodeColumn::ScopedName | NodeColumn::ExternalId
        )
    }

    /// Returns the column an ordering sorts on.
    pub fn for_order(order_by: OrderBy) -> Self {
        match order_by {
            OrderBy::Id => NodeColumn::Id,
            OrderBy::CreateTime => NodeColumn::CreateTime,
            OrderBy::LastUpdateTime => NodeColumn::LastUpdateTime,
        }
    }
}

/// A typed value column of the property table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueColumn {
    /// `string_value`
    String,
    /// `int_value`
    Int,
    /// `double_value`
    Double,
    /// `bool_value`
    Bool,
}

/// A predicate over nodes of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Direct comparison on a node column.
    Column {
        /// Column compared.
        column: NodeColumn,
        /// Comparison operator.
        op: CompareOp,
        /// Bound value.
        value: Literal,
    },

    /// Existence of a matching property row on the node.
    ///
    /// When more than one value column is listed, a match in any of them
    /// satisfies the predicate.
    Property {
        /// Property name.
        name: String,
        /// Whether the row must be a custom property.
        is_custom: bool,
        /// Value columns searched.
        columns: Vec<ValueColumn>,
        /// Comparison operator.
        op: CompareOp,
        /// Bound value.
        value: Literal,
    },

    /// All of the inner predicates.
    And(Vec<Predicate>),

    /// Any of the inner predicates.
    Or(Vec<Predicate>),

    /// Rows strictly after a keyset position under the given ordering.
    After {
        /// Primary sort column.
        column: NodeColumn,
        /// Direction of the ordering.
        direction: SortOrder,
        /// Sort column value of the last row returned.
        sort_value: i64,
        /// Identity of the last row returned.
        id: i64,
    },
}

impl Predicate {
    /// Equality on a node column.
    pub fn column_eq(column: NodeColumn, value: Literal) -> Self {
        Predicate::Column {
            column,
            op: CompareOp::Eq,
            value,
        }
    }

    /// Equality on a declared integer property.
    pub fn declared_int_eq(name: impl Into<String>, value: i64) -> Self {
        Predicate::Property {
            name: name.into(),
            is_custom: false,
            columns: vec![ValueColumn::Int],
            op: CompareOp::Eq,
            value: Literal::Int(value),
        }
    }

    /// Conjunction of optional predicates, flattening nested conjunctions.
    ///
    /// Returns `None` when no predicate remains.
    pub fn all(parts: impl IntoIterator<Item = Option<Predicate>>) -> Option<Predicate> {
        let mut flat = Vec::new();
        for part in parts.into_iter().flatten() {
            match part {
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Predicate::And(flat)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_flattens() {
        let a = Predicate::column_eq(NodeColumn::Name, Literal::String("a".into()));
        let b = Predicate::declared_int_eq("registered_model_id", 3);
        let c = Predicate::column_eq(NodeColumn::Id, Literal::Int(1));

        let combined = Predicate::all([
            Some(Predicate::And(vec![a.clone(), b.clone()])),
            None,
            Some(c.clone()),
        ]);
        assert_eq!(combined, Some(Predicate::And(vec![a.clone(), b, c])));

        assert_eq!(Predicate::all([None, Some(a.clone())]), Some(a));
        assert_eq!(Predicate::all(Vec::<Option<Predicate>>::new()), None);
    }
}
