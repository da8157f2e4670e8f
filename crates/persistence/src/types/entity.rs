//! Typed entity views.
//!
//! An [`Entity`] is the caller-facing shape of one stored node: identity,
//! kind-specific attributes, and two ordered property sequences. Property
//! values are a closed tagged union ([`PropertyValue`]) so that every stored
//! value has exactly one kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind tag of a property value, as persisted next to the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// UTF-8 string.
    String,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Double,
    /// Boolean.
    Bool,
    /// Raw bytes.
    Bytes,
    /// Arbitrary JSON document.
    Struct,
}

impl ValueKind {
    /// Returns the persisted tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Double => "double",
            ValueKind::Bool => "bool",
            ValueKind::Bytes => "bytes",
            ValueKind::Struct => "struct",
        }
    }

    /// Returns true for kinds that compare numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Double)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueKind::String),
            "int" => Ok(ValueKind::Int),
            "double" => Ok(ValueKind::Double),
            "bool" => Ok(ValueKind::Bool),
            "bytes" => Ok(ValueKind::Bytes),
            "struct" => Ok(ValueKind::Struct),
            other => Err(format!("unknown value kind '{}'", other)),
        }
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    /// String value.
    String(String),
    /// Integer value.
    Int(i64),
    /// Double value.
    Double(f64),
    /// Boolean value.
    Bool(bool),
    /// Bytes value.
    Bytes(Vec<u8>),
    /// JSON document value.
    Struct(Value),
}

impl PropertyValue {
    /// Returns the kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::String(_) => ValueKind::String,
            PropertyValue::Int(_) => ValueKind::Int,
            PropertyValue::Double(_) => ValueKind::Double,
            PropertyValue::Bool(_) => ValueKind::Bool,
            PropertyValue::Bytes(_) => ValueKind::Bytes,
            PropertyValue::Struct(_) => ValueKind::Struct,
        }
    }

    /// Returns the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Int(n)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Double(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(bytes: Vec<u8>) -> Self {
        PropertyValue::Bytes(bytes)
    }
}

impl From<Value> for PropertyValue {
    fn from(v: Value) -> Self {
        PropertyValue::Struct(v)
    }
}

/// A named property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Property value.
    pub value: PropertyValue,
}

impl Property {
    /// Creates a new property.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Attributes shared by every entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextAttributes {
    /// Entity name.
    pub name: Option<String>,
    /// External identifier.
    pub external_id: Option<String>,
    /// Creation time in milliseconds since the epoch.
    pub create_time_since_epoch: Option<i64>,
    /// Last update time in milliseconds since the epoch.
    pub last_update_time_since_epoch: Option<i64>,
}

impl ContextAttributes {
    /// Creates attributes with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the external id.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// Lifecycle state of an artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactState {
    /// State not known.
    #[default]
    Unknown,
    /// Being produced.
    Pending,
    /// Available for use.
    Live,
    /// Scheduled for deletion.
    MarkedForDeletion,
    /// Deleted.
    Deleted,
    /// Production was abandoned.
    Abandoned,
    /// Refers to an artifact stored elsewhere.
    Reference,
}

impl ArtifactState {
    /// Returns the persisted spelling of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactState::Unknown => "UNKNOWN",
            ArtifactState::Pending => "PENDING",
            ArtifactState::Live => "LIVE",
            ArtifactState::MarkedForDeletion => "MARKED_FOR_DELETION",
            ArtifactState::Deleted => "DELETED",
            ArtifactState::Abandoned => "ABANDONED",
            ArtifactState::Reference => "REFERENCE",
        }
    }
}

impl FromStr for ArtifactState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(ArtifactState::Unknown),
            "PENDING" => Ok(ArtifactState::Pending),
            "LIVE" => Ok(ArtifactState::Live),
            "MARKED_FOR_DELETION" => Ok(ArtifactState::MarkedForDeletion),
            "DELETED" => Ok(ArtifactState::Deleted),
            "ABANDONED" => Ok(ArtifactState::Abandoned),
            "REFERENCE" => Ok(ArtifactState::Reference),
            other => Err(format!("unknown artifact state '{}'", other)),
        }
    }
}

/// Attributes of artifact kinds: the shared attributes plus location and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactAttributes {
    /// Shared attributes.
    #[serde(flatten)]
    pub base: ContextAttributes,
    /// Location of the artifact payload.
    pub uri: Option<String>,
    /// Lifecycle state.
    pub state: Option<ArtifactState>,
}

impl ArtifactAttributes {
    /// Creates artifact attributes with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            base: ContextAttributes::named(name),
            ..Self::default()
        }
    }

    /// Sets the uri.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets the state.
    pub fn with_state(mut self, state: ArtifactState) -> Self {
        self.state = Some(state);
        self
    }
}

/// Access to the shared attributes of any attribute shape.
pub trait HasContextAttributes {
    /// Returns the shared attributes.
    fn context(&self) -> &ContextAttributes;

    /// Returns the shared attributes mutably.
    fn context_mut(&mut self) -> &mut ContextAttributes;
}

impl HasContextAttributes for ContextAttributes {
    fn context(&self) -> &ContextAttributes {
        self
    }

    fn context_mut(&mut self) -> &mut ContextAttributes {
        self
    }
}

impl HasContextAttributes for ArtifactAttributes {
    fn context(&self) -> &ContextAttributes {
        &self.base
    }

    fn context_mut(&mut self) -> &mut ContextAttributes {
        &mut self.base
    }
}

/// A typed entity of one kind.
///
/// `properties` and `custom_properties` are always present; an entity with
/// no properties has empty vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity<A> {
    /// Store-assigned identity; `None` before the first save.
    pub id: Option<i64>,
    /// Entity kind discriminator; filled in by the repository on save.
    pub type_id: Option<i64>,
    /// Kind-specific attributes.
    pub attributes: A,
    /// Declared properties, in order.
    pub properties: Vec<Property>,
    /// Free-form custom properties, in order.
    pub custom_properties: Vec<Property>,
}

impl<A> Entity<A> {
    /// Creates an unsaved entity with the given attributes.
    pub fn new(attributes: A) -> Self {
        Self {
            id: None,
            type_id: None,
            attributes,
            properties: Vec::new(),
            custom_properties: Vec::new(),
        }
    }

    /// Adds or replaces a declared property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        set_property(&mut self.properties, name.into(), value.into());
        self
    }

    /// Adds or replaces a custom property.
    pub fn with_custom_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        set_property(&mut self.custom_properties, name.into(), value.into());
        self
    }

    /// Adds or replaces a declared property in place.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        set_property(&mut self.properties, name.into(), value.into());
    }

    /// Adds or replaces a custom property in place.
    pub fn set_custom_property(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        set_property(&mut self.custom_properties, name.into(), value.into());
    }

    /// Looks up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Looks up a custom property by name.
    pub fn custom_property(&self, name: &str) -> Option<&PropertyValue> {
        self.custom_properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

impl<A: HasContextAttributes> Entity<A> {
    /// Returns the entity name.
    pub fn name(&self) -> Option<&str> {
        self.attributes.context().name.as_deref()
    }

    /// Returns the external id.
    pub fn external_id(&self) -> Option<&str> {
        self.attributes.context().external_id.as_deref()
    }

    /// Returns the creation time in milliseconds since the epoch.
    pub fn create_time(&self) -> Option<i64> {
        self.attributes.context().create_time_since_epoch
    }

    /// Returns the last update time in milliseconds since the epoch.
    pub fn last_update_time(&self) -> Option<i64> {
        self.attributes.context().last_update_time_since_epoch
    }
}

fn set_property(list: &mut Vec<Property>, name: String, value: PropertyValue) {
    match list.iter_mut().find(|p| p.name == name) {
        Some(existing) => existing.value = value,
        None => list.push(Property { name, value }),
    }
}
