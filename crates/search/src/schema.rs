//! Entity field schemas.
//!
//! A schema declares, per searchable entity, which external field names are
//! filterable and what semantic type each carries. The parser consults it
//! to pick the clause kind for every `field:value` term. Schemas are built
//! once at startup (in code or from JSON configuration) and shared.
//!
//! Nested paths are registered as flat dotted keys, e.g. `address.city`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic type of a searchable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text; matched case-insensitively as a substring.
    Text,
    /// Closed vocabulary stored upper-cased; matched by equality.
    Enum,
    /// Numeric; equality or bracketed inclusive range.
    Number,
    /// Boolean equality.
    Boolean,
    /// Calendar date; a bare value matches the whole day.
    Date,
    /// Point in time; only bracketed ranges are accepted.
    Timestamp,
    /// Array-typed column; values are `|`-separated membership tests.
    List,
    /// No semantic type; plain equality on the raw text.
    Generic,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Enum => "enum",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
            FieldType::List => "list",
            FieldType::Generic => "generic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "enum" => Ok(FieldType::Enum),
            "number" => Ok(FieldType::Number),
            "boolean" => Ok(FieldType::Boolean),
            "date" => Ok(FieldType::Date),
            "timestamp" => Ok(FieldType::Timestamp),
            "list" => Ok(FieldType::List),
            "generic" => Ok(FieldType::Generic),
            _ => Err(format!("unknown field type: {}", s)),
        }
    }
}

/// Field table for one searchable entity.
///
/// # Examples
///
/// ```
/// use steward_search::schema::{EntitySchema, FieldType};
///
/// let schema = EntitySchema::new("person", "name")
///     .with_field("name", FieldType::Text)
///     .with_field("birthdate", FieldType::Date)
///     .with_field("address.city", FieldType::Text);
///
/// assert_eq!(schema.field_type("birthdate"), Some(FieldType::Date));
/// assert_eq!(schema.field_type("address.city"), Some(FieldType::Text));
/// assert_eq!(schema.field_type("missing"), None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    entity: String,
    default_field: String,
    fields: HashMap<String, FieldType>,
}

impl EntitySchema {
    /// Creates an empty schema for the named entity.
    ///
    /// `default_field` receives terms written without a `field:` prefix.
    pub fn new(entity: impl Into<String>, default_field: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            default_field: default_field.into(),
            fields: HashMap::new(),
        }
    }

    /// Declares a searchable field.
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    /// Loads a schema from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The entity name, used in error messages.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The field used for terms without an explicit `field:` prefix.
    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    /// Looks up the declared type of a field path.
    pub fn field_type(&self, path: &str) -> Option<FieldType> {
        self.fields.get(path).copied()
    }
}
