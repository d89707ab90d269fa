//! Object/field metadata and the fetch-once cache that serves it.
//!
//! Field lists come from an external gateway (an HTTP client in the host
//! application); the core only ever reads them through `MetadataCache`,
//! which fetches each object at most once and resolves every later lookup
//! synchronously.

use crate::error::GatewayError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The underlying type of an object field, used to gate formatter
/// operations to compatible inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Currency,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Boolean,
    Picklist,
    Email,
    Phone,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Boolean => "boolean",
            FieldType::Picklist => "picklist",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
        };
        write!(f, "{}", name)
    }
}

/// A single field of an external object, as reported by the metadata
/// gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Picklist values, when the field has any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
            values: Vec::new(),
        }
    }
}

/// Gateway returning the field list for an object name.
pub trait MetadataGateway {
    fn object_fields(&self, object: &str) -> Result<Vec<FieldDescriptor>, GatewayError>;
}

/// Side cache of object metadata, keyed by object name.
///
/// Each object is fetched at most once; a failed fetch is not cached, so
/// the next edit that needs the object retries it.
#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
    objects: AHashMap<String, Vec<FieldDescriptor>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous read; `None` when the object has never been fetched.
    pub fn fields(&self, object: &str) -> Option<&[FieldDescriptor]> {
        self.objects.get(object).map(Vec::as_slice)
    }

    /// Returns the cached fields, fetching them through the gateway on the
    /// first request for this object.
    pub fn ensure(
        &mut self,
        object: &str,
        gateway: &dyn MetadataGateway,
    ) -> Result<&[FieldDescriptor], GatewayError> {
        if !self.objects.contains_key(object) {
            let fields = gateway.object_fields(object)?;
            tracing::debug!(object, count = fields.len(), "cached object metadata");
            self.objects.insert(object.to_string(), fields);
        }
        Ok(self.objects[object].as_slice())
    }

    /// Seeds the cache directly, for hosts that batch-fetch metadata.
    pub fn insert(&mut self, object: impl Into<String>, fields: Vec<FieldDescriptor>) {
        self.objects.insert(object.into(), fields);
    }
}
