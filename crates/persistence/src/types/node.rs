//! Generic storage rows shared by every entity kind.
//!
//! A [`Node`] is one entity instance regardless of its kind; a
//! [`PropertyRow`] is one named, typed value attached to a node. These are
//! the only shapes the storage backend ever sees.

use serde::{Deserialize, Serialize};

use super::entity::PropertyValue;

/// A generic node row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Store-assigned identity; `None` until the first insert.
    pub id: Option<i64>,
    /// Entity kind discriminator.
    pub type_id: i64,
    /// Name, unique within `type_id`.
    pub name: String,
    /// Optional external identifier, unique within `type_id` when set.
    pub external_id: Option<String>,
    /// Milliseconds since the epoch; written once at insert.
    pub create_time_since_epoch: i64,
    /// Milliseconds since the epoch; bumped on every write.
    pub last_update_time_since_epoch: i64,
}

impl Node {
    /// Returns the identity of a persisted node.
    ///
    /// Nodes read back from the store always carry an id.
    pub fn stored_id(&self) -> i64 {
        self.id.unwrap_or_default()
    }
}

/// A property row in its generic (name, is-custom, value) form.
///
/// The owning node id is implied by the write or read call that carries the
/// row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRow {
    /// Property name.
    pub name: String,
    /// `true` for free-form custom properties, `false` for declared ones.
    pub is_custom: bool,
    /// The tagged value.
    pub value: PropertyValue,
}

impl PropertyRow {
    /// Creates a declared property row.
    pub fn declared(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            is_custom: false,
            value,
        }
    }

    /// Creates a custom property row.
    pub fn custom(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            is_custom: true,
            value,
        }
    }
}
