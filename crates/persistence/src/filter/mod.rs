//! Filter query engine.
//!
//! Filter text is parsed into a [`FilterExpr`] and compiled, against the
//! [`FieldRegistry`] of one entity kind, into a backend-neutral
//! [`Predicate`]. Reserved names compile to node-column comparisons; every
//! other field compiles to an existence check against the property rows.
//!
//! ```
//! use model_registry_persistence::filter::{
//!     DeclaredField, FieldRegistry, FilterCompiler, Predicate,
//! };
//! use model_registry_persistence::types::ValueKind;
//!
//! const FIELDS: &[DeclaredField] = &[DeclaredField::new("description", ValueKind::String)];
//! let registry = FieldRegistry::new(FIELDS, false);
//!
//! let predicate = FilterCompiler::new(&registry)
//!     .compile_str("name = 'fraud' AND catalog.source = 'kf-model-catalog'")
//!     .unwrap()
//!     .unwrap();
//! assert!(matches!(predicate, Predicate::And(ref parts) if parts.len() == 2));
//! ```

mod compiler;
mod parser;
mod predicate;
mod registry;

pub use compiler::FilterCompiler;
pub use parser::{CompareOp, FieldPath, FilterExpr, FilterParser, Literal, LogicalOp};
pub use predicate::{NodeColumn, Predicate, ValueColumn};
pub use registry::{DeclaredField, FieldRegistry, ResolvedField};
