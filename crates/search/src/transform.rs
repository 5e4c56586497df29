//! Field transformations.
//!
//! A [`FieldTransformer`] maps an externally visible field name to the
//! column actually filtered, and can additionally override the declared
//! field type, supply a value-parsing function, or replace type dispatch
//! entirely with a custom SQL fragment. Transformers are declared next to
//! the entity schema and shared with the parser.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::schema::FieldType;
use crate::value::SqlValue;

/// Function turning a raw search value into a bind value.
pub type ValueParser = Arc<dyn Fn(&str) -> SqlValue + Send + Sync>;

/// Declared mapping for a single external field.
#[derive(Clone)]
pub struct Transformation {
    column: String,
    field_type: Option<FieldType>,
    parser: Option<ValueParser>,
    custom_sql: Option<String>,
}

impl Transformation {
    fn passthrough(field: &str) -> Self {
        Self {
            column: field.to_string(),
            field_type: None,
            parser: None,
            custom_sql: None,
        }
    }

    /// The column this field filters against.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The declared type override, if any.
    pub fn field_type(&self) -> Option<FieldType> {
        self.field_type
    }

    /// The custom SQL fragment, if this field bypasses type dispatch.
    pub fn custom_sql(&self) -> Option<&str> {
        self.custom_sql.as_deref()
    }

    /// Returns `true` when a value-parsing function is configured.
    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    /// Applies the value-parsing function, or passes the raw text through.
    pub fn parse_value(&self, raw: &str) -> SqlValue {
        match &self.parser {
            Some(parse) => parse(raw),
            None => SqlValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation")
            .field("column", &self.column)
            .field("field_type", &self.field_type)
            .field("parser", &self.parser.as_ref().map(|_| "<fn>"))
            .field("custom_sql", &self.custom_sql)
            .finish()
    }
}

/// Lookup table of per-field transformations.
///
/// # Examples
///
/// ```
/// use steward_search::transform::FieldTransformer;
/// use steward_search::schema::FieldType;
/// use steward_search::value::SqlValue;
///
/// let transformer = FieldTransformer::new()
///     .with_column("display", "full_name")
///     .with_type("status", "status_code", FieldType::Enum)
///     .with_parser("zip", "postal_code", |raw| {
///         SqlValue::Text(raw.trim().to_string())
///     });
///
/// assert_eq!(transformer.column("display"), "full_name");
/// assert_eq!(transformer.column("untouched"), "untouched");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldTransformer {
    transforms: HashMap<String, Transformation>,
}

impl FieldTransformer {
    /// Creates an empty transformer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transformer from plain field-to-column renames.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        let mut transformer = Self::new();
        for (field, column) in map {
            transformer.entry(&field).column = column;
        }
        transformer
    }

    fn entry(&mut self, field: &str) -> &mut Transformation {
        self.transforms
            .entry(field.to_string())
            .or_insert_with(|| Transformation::passthrough(field))
    }

    /// Maps a field to a different column name.
    pub fn with_column(mut self, field: &str, column: &str) -> Self {
        self.entry(field).column = column.to_string();
        self
    }

    /// Maps a field to a column and overrides its declared type.
    pub fn with_type(mut self, field: &str, column: &str, field_type: FieldType) -> Self {
        let entry = self.entry(field);
        entry.column = column.to_string();
        entry.field_type = Some(field_type);
        self
    }

    /// Maps a field to a column with a value-parsing function.
    ///
    /// A parsed field renders as a plain equality predicate bound to the
    /// function's output.
    pub fn with_parser(
        mut self,
        field: &str,
        column: &str,
        parser: impl Fn(&str) -> SqlValue + Send + Sync + 'static,
    ) -> Self {
        let entry = self.entry(field);
        entry.column = column.to_string();
        entry.parser = Some(Arc::new(parser));
        self
    }

    /// Replaces type dispatch for a field with a custom SQL fragment.
    ///
    /// The fragment carries its own `?` placeholder; the bound value is the
    /// raw search value, run through the field's parsing function when one
    /// is also configured.
    pub fn with_custom_sql(mut self, field: &str, sql: &str) -> Self {
        self.entry(field).custom_sql = Some(sql.to_string());
        self
    }

    /// The column a field filters against (the field itself when unmapped).
    pub fn column<'a>(&'a self, field: &'a str) -> &'a str {
        match self.transforms.get(field) {
            Some(t) => t.column(),
            None => field,
        }
    }

    /// The full transformation declared for a field, if any.
    pub fn get(&self, field: &str) -> Option<&Transformation> {
        self.transforms.get(field)
    }
}
