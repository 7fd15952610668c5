//! Wire-level document records and identifiers

use {
    crate::err::{ClientError, ClientResult},
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    serde_json::{Map, Value},
    std::{fmt, str::FromStr},
};

/// System attribute carrying the composite id.
pub const ID_FIELD: &str = "_id";
/// System attribute carrying the key within a collection.
pub const KEY_FIELD: &str = "_key";
/// System attribute carrying the revision token.
pub const REV_FIELD: &str = "_rev";
/// Edge attribute pointing at the source vertex.
pub const FROM_FIELD: &str = "_from";
/// Edge attribute pointing at the target vertex.
pub const TO_FIELD: &str = "_to";

/// Returns true for attributes managed by the store rather than the caller.
pub fn is_system_field(name: &str) -> bool {
    matches!(name, ID_FIELD | KEY_FIELD | REV_FIELD | FROM_FIELD | TO_FIELD)
}

/// Composite document identity: `collection/key`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId {
    collection: String,
    key: String,
}

impl DocumentId {
    pub fn new(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
        }
    }

    /// Parse an id in `collection/key` form.
    pub fn parse(id: &str) -> ClientResult<Self> {
        match id.split_once('/') {
            Some((collection, key)) if !collection.is_empty() && !key.is_empty() => {
                Ok(Self::new(collection, key))
            }
            _ => Err(ClientError::InvalidId(id.to_string())),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.key)
    }
}

impl FromStr for DocumentId {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Collection type as understood by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CollectionKind {
    #[default]
    Document,
    Edge,
}

impl CollectionKind {
    /// Numeric collection type used on the wire (2 = document, 3 = edge).
    pub fn wire_type(self) -> u8 {
        match self {
            CollectionKind::Document => 2,
            CollectionKind::Edge => 3,
        }
    }

    pub fn from_wire_type(value: u64) -> Option<Self> {
        match value {
            2 => Some(CollectionKind::Document),
            3 => Some(CollectionKind::Edge),
            _ => None,
        }
    }
}

impl Serialize for CollectionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.wire_type())
    }
}

impl<'de> Deserialize<'de> for CollectionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u64::deserialize(deserializer)?;
        Self::from_wire_type(raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown collection type {}", raw)))
    }
}

/// Collection metadata returned by create/load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CollectionKind,
}

/// One stored record in its wire shape.
///
/// User attributes are flattened next to the system attributes, so a record
/// serializes exactly as the store returns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_rev")]
    pub rev: String,
    #[serde(rename = "_from", default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DocumentId>,
    #[serde(rename = "_to", default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DocumentId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DocumentRecord {
    /// Parse a raw row returned by a query, traversal or transaction.
    pub fn from_value(value: Value) -> ClientResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn into_value(self) -> Value {
        // serializing a record with string keys cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn is_edge(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Read a user attribute or system attribute by name.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            ID_FIELD => Some(Value::String(self.id.to_string())),
            KEY_FIELD => Some(Value::String(self.key.clone())),
            REV_FIELD => Some(Value::String(self.rev.clone())),
            FROM_FIELD => self.from.as_ref().map(|id| Value::String(id.to_string())),
            TO_FIELD => self.to.as_ref().map(|id| Value::String(id.to_string())),
            _ => self.fields.get(name).cloned(),
        }
    }
}

/// Strip system attributes from caller-supplied data.
pub fn user_fields(data: &Map<String, Value>) -> Map<String, Value> {
    data.iter()
        .filter(|(name, _)| !is_system_field(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
