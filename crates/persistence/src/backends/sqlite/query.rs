//! SQL rendering for node scans.
//!
//! Translates backend-neutral [`Predicate`] trees and [`NodeQuery`] scans
//! into SQL against the `nodes` / `node_properties` tables. Every literal is
//! emitted as a `?` placeholder; parameters are collected in the order their
//! placeholders appear in the text.

use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;

use crate::core::NodeQuery;
use crate::filter::{CompareOp, Literal, NodeColumn, Predicate, ValueColumn};
use crate::types::SortOrder;

/// Columns selected for every node read, in [`super::store`] row order.
pub(crate) const NODE_COLUMNS: &str = "n.id, n.type_id, n.name, n.external_id, \
     n.create_time_since_epoch, n.last_update_time_since_epoch";

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }

    fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::String(s) => SqlParam::String(s.clone()),
            Literal::Int(i) => SqlParam::Integer(*i),
            Literal::Double(d) => SqlParam::Float(*d),
            Literal::Bool(b) => SqlParam::Integer(i64::from(*b)),
        }
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlParam::String(s) => s.to_sql(),
            SqlParam::Integer(i) => i.to_sql(),
            SqlParam::Float(f) => f.to_sql(),
        }
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Appends a placeholder and its value.
    fn push_param(&mut self, param: SqlParam) {
        self.sql.push('?');
        self.params.push(param);
    }

    /// Appends another fragment verbatim.
    fn push_fragment(&mut self, other: SqlFragment) {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }

    /// Joins fragments with a logical keyword, parenthesising each part.
    fn join(parts: Vec<SqlFragment>, keyword: &str, empty: &str) -> SqlFragment {
        if parts.is_empty() {
            return SqlFragment::new(empty);
        }
        let mut out = SqlFragment::default();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.sql.push_str(keyword);
            }
            out.sql.push('(');
            out.push_fragment(part);
            out.sql.push(')');
        }
        out
    }

    /// Returns the parameters as trait objects for `rusqlite`.
    pub fn bind(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p as &dyn ToSql).collect()
    }
}

/// Returns the SQL expression for a node column.
pub(crate) fn column_sql(column: NodeColumn) -> &'static str {
    match column {
        NodeColumn::Id => "n.id",
        NodeColumn::Name => "n.name",
        NodeColumn::ScopedName => "substr(n.name, instr(n.name, ':') + 1)",
        NodeColumn::ExternalId => "n.external_id",
        NodeColumn::CreateTime => "n.create_time_since_epoch",
        NodeColumn::LastUpdateTime => "n.last_update_time_since_epoch",
    }
}

fn value_column_sql(column: ValueColumn) -> &'static str {
    match column {
        ValueColumn::String => "p.string_value",
        ValueColumn::Int => "p.int_value",
        ValueColumn::Double => "p.double_value",
        ValueColumn::Bool => "p.bool_value",
    }
}

/// Renders `expr op ?`, lower-casing both sides for `ILIKE`.
fn comparison(expr: &str, op: CompareOp, value: &Literal) -> SqlFragment {
    let mut out = SqlFragment::default();
    match op {
        CompareOp::ILike => {
            out.sql.push_str(&format!("lower({}) LIKE lower(", expr));
            out.push_param(SqlParam::from_literal(value));
            out.sql.push(')');
        }
        _ => {
            out.sql.push_str(&format!("{} {} ", expr, op.to_sql_op()));
            out.push_param(SqlParam::from_literal(value));
        }
    }
    out
}

/// Renders a predicate as a WHERE-clause fragment over the alias `n`.
pub fn render_predicate(predicate: &Predicate) -> SqlFragment {
    match predicate {
        Predicate::Column { column, op, value } => comparison(column_sql(*column), *op, value),

        Predicate::Property {
            name,
            is_custom,
            columns,
            op,
            value,
        } => {
            let mut out = SqlFragment::new(
                "EXISTS (SELECT 1 FROM node_properties p WHERE p.node_id = n.id AND p.name = ",
            );
            out.push_param(SqlParam::string(name.as_str()));
            out.sql.push_str(" AND p.is_custom = ");
            out.push_param(SqlParam::integer(i64::from(*is_custom)));
            out.sql.push_str(" AND (");
            let tests = columns
                .iter()
                .map(|c| comparison(value_column_sql(*c), *op, value))
                .collect();
            out.push_fragment(SqlFragment::join(tests, " OR ", "0 = 1"));
            out.sql.push_str("))");
            out
        }

        Predicate::And(parts) => {
            SqlFragment::join(parts.iter().map(render_predicate).collect(), " AND ", "1 = 1")
        }

        Predicate::Or(parts) => {
            SqlFragment::join(parts.iter().map(render_predicate).collect(), " OR ", "0 = 1")
        }

        Predicate::After {
            column,
            direction,
            sort_value,
            id,
        } => {
            let cmp = match direction {
                SortOrder::Asc => ">",
                SortOrder::Desc => "<",
            };
            let mut out = SqlFragment::default();
            if *column == NodeColumn::Id {
                out.sql.push_str(&format!("n.id {} ", cmp));
                out.push_param(SqlParam::integer(*id));
            } else {
                let col = column_sql(*column);
                out.sql.push_str(&format!("({} {} ", col, cmp));
                out.push_param(SqlParam::integer(*sort_value));
                out.sql.push_str(&format!(" OR ({} = ", col));
                out.push_param(SqlParam::integer(*sort_value));
                out.sql.push_str(&format!(" AND n.id {} ", cmp));
                out.push_param(SqlParam::integer(*id));
                out.sql.push_str("))");
            }
            out
        }
    }
}

/// Builds the full SELECT for a node scan.
pub fn build_scan(query: &NodeQuery) -> SqlFragment {
    let mut out = SqlFragment::new(format!("SELECT {} FROM nodes n WHERE n.type_id = ", NODE_COLUMNS));
    out.push_param(SqlParam::integer(query.type_id));

    if let Some(predicate) = &query.predicate {
        out.sql.push_str(" AND (");
        out.push_fragment(render_predicate(predicate));
        out.sql.push(')');
    }

    let direction = query.sort_order.as_str();
    match NodeColumn::for_order(query.order_by) {
        NodeColumn::Id => {
            out.sql.push_str(&format!(" ORDER BY n.id {}", direction));
        }
        column => {
            out.sql.push_str(&format!(
                " ORDER BY {} {}, n.id {}",
                column_sql(column),
                direction,
                direction
            ));
        }
    }

    out.sql.push_str(" LIMIT ");
    out.push_param(SqlParam::integer(query.limit as i64));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderBy;

    #[test]
    fn test_render_column() {
        let sql = render_predicate(&Predicate::column_eq(
            NodeColumn::Name,
            Literal::String("foo".into()),
        ));
        assert_eq!(sql.sql, "n.name = ?");
        assert_eq!(sql.params, vec![SqlParam::string("foo")]);
    }

    #[test]
    fn test_render_ilike() {
        let sql = render_predicate(&Predicate::Column {
            column: NodeColumn::ExternalId,
            op: CompareOp::ILike,
            value: Literal::String("ABC%".into()),
        });
        assert_eq!(sql.sql, "lower(n.external_id) LIKE lower(?)");
    }

    #[test]
    fn test_render_property_semi_join() {
        let sql = render_predicate(&Predicate::Property {
            name: "epochs".into(),
            is_custom: true,
            columns: vec![ValueColumn::Int, ValueColumn::Double],
            op: CompareOp::Ge,
            value: Literal::Int(10),
        });
        assert_eq!(
            sql.sql,
            "EXISTS (SELECT 1 FROM node_properties p WHERE p.node_id = n.id AND p.name = ? \
             AND p.is_custom = ? AND ((p.int_value >= ?) OR (p.double_value >= ?)))"
        );
        assert_eq!(
            sql.params,
            vec![
                SqlParam::string("epochs"),
                SqlParam::integer(1),
                SqlParam::Integer(10),
                SqlParam::Integer(10),
            ]
        );
    }

    #[test]
    fn test_render_keyset() {
        let sql = render_predicate(&Predicate::After {
            column: NodeColumn::CreateTime,
            direction: SortOrder::Desc,
            sort_value: 500,
            id: 7,
        });
        assert_eq!(
            sql.sql,
            "(n.create_time_since_epoch < ? OR (n.create_time_since_epoch = ? AND n.id < ?))"
        );
        assert_eq!(sql.params.len(), 3);

        let sql = render_predicate(&Predicate::After {
            column: NodeColumn::Id,
            direction: SortOrder::Asc,
            sort_value: 7,
            id: 7,
        });
        assert_eq!(sql.sql, "n.id > ?");
    }

    #[test]
    fn test_build_scan_param_order() {
        let query = NodeQuery {
            type_id: 3,
            predicate: Some(Predicate::column_eq(NodeColumn::Name, Literal::String("a".into()))),
            order_by: OrderBy::LastUpdateTime,
            sort_order: SortOrder::Desc,
            limit: 11,
        };
        let sql = build_scan(&query);
        assert!(sql.sql.ends_with(
            "ORDER BY n.last_update_time_since_epoch DESC, n.id DESC LIMIT ?"
        ));
        assert_eq!(
            sql.params,
            vec![
                SqlParam::Integer(3),
                SqlParam::string("a"),
                SqlParam::Integer(11),
            ]
        );
    }
}
