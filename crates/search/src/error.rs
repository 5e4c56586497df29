//! Error types for search parsing and statement building.
//!
//! The taxonomy separates client-input failures (malformed search strings),
//! configuration failures (unresolvable fields), and programming errors
//! (invalid clause arguments, builder calls out of phase order). None of
//! these are retried internally; they all propagate to the caller.

use thiserror::Error;

/// The umbrella error type for this crate.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed search-string syntax.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A referenced field could not be resolved against the entity schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Invalid arguments at clause construction.
    #[error(transparent)]
    Clause(#[from] ClauseError),

    /// Builder methods invoked out of order or after rendering.
    #[error(transparent)]
    Builder(#[from] BuilderError),
}

/// Result alias for operations that can fail anywhere in the pipeline.
pub type QueryResult<T> = Result<T, QueryError>;

/// Search-string syntax errors.
///
/// These map to client-facing bad-request failures: the input text itself
/// is malformed and no partial result is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input ended while a quoted literal was still open.
    #[error("unterminated quote in search string")]
    UnterminatedQuote,

    /// Input ended while a range bracket was still open.
    #[error("unterminated range bracket in search string")]
    UnterminatedBracket,

    /// A `[` appeared while another bracket was already open.
    #[error("range bracket opened at position {position} while another is open")]
    NestedBracket {
        /// Byte offset of the offending character.
        position: usize,
    },

    /// A `]` appeared with no bracket open.
    #[error("range bracket closed at position {position} with none open")]
    UnopenedBracket {
        /// Byte offset of the offending character.
        position: usize,
    },

    /// Input ended while a `(` group was still open.
    #[error("unclosed group in search string")]
    UnclosedGroup,

    /// A bracketed value was not of the form `[lo TO hi]`.
    #[error("malformed range '{value}': expected '[lo TO hi]'")]
    MalformedRange {
        /// The offending raw value.
        value: String,
    },

    /// A boolean field received something other than `true`/`false`.
    #[error("invalid boolean value '{value}' for field '{field}'")]
    InvalidBoolean {
        /// The field being filtered.
        field: String,
        /// The offending raw value.
        value: String,
    },

    /// A numeric field or range bound failed to parse.
    #[error("invalid number '{value}' for field '{field}'")]
    InvalidNumber {
        /// The field being filtered.
        field: String,
        /// The offending raw value.
        value: String,
    },

    /// A date field or range bound failed to parse.
    #[error("invalid date '{value}' for field '{field}'")]
    InvalidDate {
        /// The field being filtered.
        field: String,
        /// The offending raw value.
        value: String,
    },

    /// A timestamp range bound failed to parse.
    #[error("invalid timestamp '{value}' for field '{field}'")]
    InvalidTimestamp {
        /// The field being filtered.
        field: String,
        /// The offending raw value.
        value: String,
    },

    /// A timestamp field was given a bare value instead of a range.
    #[error("field '{field}' requires a bracketed time range, got '{value}'")]
    TimeRangeRequired {
        /// The field being filtered.
        field: String,
        /// The offending raw value.
        value: String,
    },
}

/// Field-resolution errors.
///
/// Raised when a search term names a field the entity schema does not
/// declare. These indicate a configuration gap or a bad client field name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The field is not declared on the entity.
    #[error("unknown search field '{field}' on entity '{entity}'")]
    UnknownField {
        /// The entity being searched.
        entity: String,
        /// The unresolvable field name.
        field: String,
    },
}

/// Invalid clause-construction arguments.
///
/// A clause without a filter target is a programming error and fails at
/// construction, never at render time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClauseError {
    /// The clause field name is empty.
    #[error("clause field name is empty")]
    EmptyField,

    /// A custom clause was given an empty SQL fragment.
    #[error("custom clause SQL is empty")]
    EmptySql,

    /// A list clause was given no items.
    #[error("list clause for field '{field}' has no items")]
    EmptyList {
        /// The field being filtered.
        field: String,
    },
}

/// Builder misuse errors.
///
/// Builder phases only move forward; rendering happens exactly once. These
/// surface during development and are not recoverable at runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// A builder call was made for an earlier phase than the current one.
    #[error("cannot {attempted} after {current}")]
    OutOfOrder {
        /// The phase the call belongs to.
        attempted: String,
        /// The phase the builder is already in.
        current: String,
    },

    /// `sql()` was called more than once.
    #[error("statement already rendered")]
    AlreadyRendered,

    /// The statement is missing a required section.
    #[error("statement is missing its {missing}")]
    Incomplete {
        /// The missing section, e.g. `table`.
        missing: String,
    },

    /// `search_str` was called without an attached parser.
    #[error("search parser not configured")]
    ParserNotConfigured,

    /// An `IN (...)` predicate was given no values.
    #[error("IN clause for field '{field}' has no values")]
    EmptyInList {
        /// The field being filtered.
        field: String,
    },
}
