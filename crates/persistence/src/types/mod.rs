//! Core types for the persistence layer.
//!
//! This module provides the fundamental types used throughout the persistence layer:
//!
//! - [`Node`], [`PropertyRow`] - The generic rows every entity kind is stored as
//! - [`Entity`], [`Property`], [`PropertyValue`] - The typed view callers work with
//! - [`ListOptions`] - List request options
//! - [`PageToken`], [`ListWrapper`] - Pagination types
//!
//! # Examples
//!
//! ## Building an Entity
//!
//! ```
//! use model_registry_persistence::types::{ContextAttributes, Entity, PropertyValue};
//!
//! let model = Entity::new(ContextAttributes::named("fraud-detector"))
//!     .with_property("description", "gradient boosted trees")
//!     .with_custom_property("team", "risk");
//!
//! assert_eq!(model.name(), Some("fraud-detector"));
//! assert_eq!(model.custom_property("team"), Some(&PropertyValue::from("risk")));
//! ```
//!
//! ## Pagination
//!
//! ```
//! use model_registry_persistence::types::{OrderBy, PageToken, SortOrder};
//!
//! let token = PageToken::new(OrderBy::Id, SortOrder::Asc, 42, 42);
//! let encoded = token.encode();
//!
//! let decoded = PageToken::decode_for(&encoded, OrderBy::Id, SortOrder::Asc).unwrap();
//! assert_eq!(decoded.id(), 42);
//! ```

mod entity;
mod list;
mod node;
mod pagination;

pub use entity::{
    ArtifactAttributes, ArtifactState, ContextAttributes, Entity, HasContextAttributes, Property,
    PropertyValue, ValueKind,
};

pub use list::{ListOptions, OrderBy, SortOrder};

pub use node::{Node, PropertyRow};

pub use pagination::{ListWrapper, PageToken};
