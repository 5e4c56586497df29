//! Batched statement builders.
//!
//! A batch builder renders one parameterized statement and produces one
//! bind row per batch item. Static values bind the same in every row;
//! sourced values are re-evaluated against each item. Slots fill in
//! declaration order, so the row layout always matches the placeholder
//! order of the rendered SQL.

use std::fmt;

use tracing::trace;

use super::advance;
use crate::context::{QueryContext, TenantScope};
use crate::error::BuilderError;
use crate::value::SqlValue;

/// One bind slot of a batched statement.
enum Slot<T> {
    Static(SqlValue),
    Sourced(Box<dyn Fn(&T) -> SqlValue + Send + Sync>),
}

impl<T> Slot<T> {
    fn value_for(&self, item: &T) -> SqlValue {
        let value = match self {
            Slot::Static(value) => value.clone(),
            Slot::Sourced(source) => source(item),
        };
        value.normalized()
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Slot::Sourced(_) => f.debug_tuple("Sourced").field(&"<fn>").finish(),
        }
    }
}

/// Ordered construction phases of a batched INSERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum InsertPhase {
    Start,
    Into,
    Values,
    Batches,
    Done,
}

/// Builder for batched INSERT statements.
///
/// # Examples
///
/// ```
/// use steward_search::builder::BatchInsertBuilder;
/// use steward_search::context::QueryContext;
/// use steward_search::value::SqlValue;
///
/// struct Guest {
///     name: String,
/// }
///
/// let mut cmd = BatchInsertBuilder::new(QueryContext::default())
///     .into_table("invite").unwrap()
///     .value("event_id", 7).unwrap()
///     .value_source("person_name", |g: &Guest| SqlValue::from(g.name.as_str())).unwrap()
///     .add_batch(Guest { name: "ana".into() }).unwrap()
///     .add_batch(Guest { name: "bo".into() }).unwrap();
///
/// assert_eq!(
///     cmd.sql().unwrap(),
///     "INSERT INTO invite (event_id, person_name) VALUES (?, ?)"
/// );
/// assert_eq!(cmd.rows().len(), 2);
/// ```
#[derive(Debug)]
pub struct BatchInsertBuilder<T> {
    ctx: QueryContext,
    phase: InsertPhase,
    table: Option<String>,
    fields: Vec<String>,
    slots: Vec<Slot<T>>,
    items: Vec<T>,
}

impl<T> BatchInsertBuilder<T> {
    /// Creates a builder for the given context.
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            phase: InsertPhase::Start,
            table: None,
            fields: Vec::new(),
            slots: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Sets the target table.
    pub fn into_table(mut self, table: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, InsertPhase::Into)?;
        self.table = Some(table.to_string());
        Ok(self)
    }

    /// Inserts a field bound to the same value in every row.
    pub fn value(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, InsertPhase::Values)?;
        self.fields.push(field.to_string());
        self.slots.push(Slot::Static(value.into()));
        Ok(self)
    }

    /// Inserts a field bound per item by the source function.
    pub fn value_source(
        mut self,
        field: &str,
        source: impl Fn(&T) -> SqlValue + Send + Sync + 'static,
    ) -> Result<Self, BuilderError> {
        advance(&mut self.phase, InsertPhase::Values)?;
        self.fields.push(field.to_string());
        self.slots.push(Slot::Sourced(Box::new(source)));
        Ok(self)
    }

    /// Inserts the context's organization id into the `org_id` column.
    ///
    /// No-op when tenancy is disabled.
    pub fn in_org(self) -> Result<Self, BuilderError> {
        self.in_org_field("org_id")
    }

    /// Inserts the context's organization id into the given column.
    pub fn in_org_field(mut self, field: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, InsertPhase::Values)?;
        if let TenantScope::Org(org) = self.ctx.tenancy() {
            self.fields.push(field.to_string());
            self.slots.push(Slot::Static(SqlValue::Int(org.as_i32())));
        }
        Ok(self)
    }

    /// Adds one batch item.
    pub fn add_batch(mut self, item: T) -> Result<Self, BuilderError> {
        advance(&mut self.phase, InsertPhase::Batches)?;
        self.items.push(item);
        Ok(self)
    }

    /// Adds batch items.
    pub fn add_batches(mut self, items: Vec<T>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, InsertPhase::Batches)?;
        self.items.extend(items);
        Ok(self)
    }

    /// Renders the statement. May be called once.
    pub fn sql(&mut self) -> Result<String, BuilderError> {
        if self.phase == InsertPhase::Done {
            return Err(BuilderError::AlreadyRendered);
        }
        self.phase = InsertPhase::Done;

        let table = self.table.as_deref().ok_or(BuilderError::Incomplete {
            missing: "table".to_string(),
        })?;
        if self.fields.is_empty() {
            return Err(BuilderError::Incomplete {
                missing: "fields".to_string(),
            });
        }

        let placeholders = vec!["?"; self.fields.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            self.fields.join(", "),
            placeholders
        );
        trace!(sql = %sql, batches = self.items.len(), "rendered batch insert");
        Ok(sql)
    }

    /// One normalized bind row per batch item, in slot declaration order.
    pub fn rows(&self) -> Vec<Vec<SqlValue>> {
        self.items
            .iter()
            .map(|item| self.slots.iter().map(|slot| slot.value_for(item)).collect())
            .collect()
    }
}

/// Ordered construction phases of a batched UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum UpdatePhase {
    Start,
    Table,
    Values,
    Where,
    Batches,
    Done,
}

/// Builder for batched UPDATE statements.
///
/// SET slots bind first, then WHERE slots, each in declaration order.
#[derive(Debug)]
pub struct BatchUpdateBuilder<T> {
    phase: UpdatePhase,
    table: Option<String>,
    fields: Vec<String>,
    set_slots: Vec<Slot<T>>,
    wheres: Vec<String>,
    where_slots: Vec<Slot<T>>,
    items: Vec<T>,
}

impl<T> BatchUpdateBuilder<T> {
    /// Creates a builder for the given context.
    pub fn new(_ctx: QueryContext) -> Self {
        Self {
            phase: UpdatePhase::Start,
            table: None,
            fields: Vec::new(),
            set_slots: Vec::new(),
            wheres: Vec::new(),
            where_slots: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Sets the updated table.
    pub fn update(mut self, table: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, UpdatePhase::Table)?;
        self.table = Some(table.to_string());
        Ok(self)
    }

    /// Sets a column to the same value in every row.
    pub fn value(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, UpdatePhase::Values)?;
        self.fields.push(field.to_string());
        self.set_slots.push(Slot::Static(value.into()));
        Ok(self)
    }

    /// Sets a column per item from the source function.
    pub fn value_source(
        mut self,
        field: &str,
        source: impl Fn(&T) -> SqlValue + Send + Sync + 'static,
    ) -> Result<Self, BuilderError> {
        advance(&mut self.phase, UpdatePhase::Values)?;
        self.fields.push(field.to_string());
        self.set_slots.push(Slot::Sourced(Box::new(source)));
        Ok(self)
    }

    /// Adds an equality predicate bound to the same value in every row;
    /// a [`SqlValue::Null`] renders `field IS NULL` and binds nothing.
    pub fn with(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, UpdatePhase::Where)?;
        let value = value.into();
        if value.is_null() {
            self.wheres.push(format!("{} IS NULL", field));
        } else {
            self.wheres.push(format!("{}=?", field));
            self.where_slots.push(Slot::Static(value));
        }
        Ok(self)
    }

    /// Adds an equality predicate bound per item by the source function.
    pub fn with_source(
        mut self,
        field: &str,
        source: impl Fn(&T) -> SqlValue + Send + Sync + 'static,
    ) -> Result<Self, BuilderError> {
        advance(&mut self.phase, UpdatePhase::Where)?;
        self.wheres.push(format!("{}=?", field));
        self.where_slots.push(Slot::Sourced(Box::new(source)));
        Ok(self)
    }

    /// Adds a raw predicate with no bind values.
    pub fn where_clause(mut self, clause: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, UpdatePhase::Where)?;
        self.wheres.push(clause.to_string());
        Ok(self)
    }

    /// Adds one batch item.
    pub fn add_batch(mut self, item: T) -> Result<Self, BuilderError> {
        advance(&mut self.phase, UpdatePhase::Batches)?;
        self.items.push(item);
        Ok(self)
    }

    /// Adds batch items.
    pub fn add_batches(mut self, items: Vec<T>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, UpdatePhase::Batches)?;
        self.items.extend(items);
        Ok(self)
    }

    /// Renders the statement. May be called once.
    pub fn sql(&mut self) -> Result<String, BuilderError> {
        if self.phase == UpdatePhase::Done {
            return Err(BuilderError::AlreadyRendered);
        }
        self.phase = UpdatePhase::Done;

        let table = self.table.as_deref().ok_or(BuilderError::Incomplete {
            missing: "table".to_string(),
        })?;

        let mut sql = format!("UPDATE {}", table);
        if !self.fields.is_empty() {
            sql.push_str(" SET ");
            let assignments = self
                .fields
                .iter()
                .map(|f| format!("{}=?", f))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&assignments);
        }
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.join(" AND "));
        }

        trace!(sql = %sql, batches = self.items.len(), "rendered batch update");
        Ok(sql)
    }

    /// One normalized bind row per batch item: SET slots, then WHERE slots.
    pub fn rows(&self) -> Vec<Vec<SqlValue>> {
        self.items
            .iter()
            .map(|item| {
                self.set_slots
                    .iter()
                    .chain(self.where_slots.iter())
                    .map(|slot| slot.value_for(item))
                    .collect()
            })
            .collect()
    }
}

/// Ordered construction phases of a batched DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DeletePhase {
    Start,
    Table,
    Where,
    Batches,
    Done,
}

/// Builder for batched DELETE statements.
#[derive(Debug)]
pub struct BatchDeleteBuilder<T> {
    phase: DeletePhase,
    table: Option<String>,
    wheres: Vec<String>,
    where_slots: Vec<Slot<T>>,
    items: Vec<T>,
}

impl<T> BatchDeleteBuilder<T> {
    /// Creates a builder for the given context.
    pub fn new(_ctx: QueryContext) -> Self {
        Self {
            phase: DeletePhase::Start,
            table: None,
            wheres: Vec::new(),
            where_slots: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Sets the table to delete from.
    pub fn delete_from(mut self, table: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, DeletePhase::Table)?;
        self.table = Some(table.to_string());
        Ok(self)
    }

    /// Adds an equality predicate bound to the same value in every row;
    /// a [`SqlValue::Null`] renders `field IS NULL` and binds nothing.
    pub fn with(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, DeletePhase::Where)?;
        let value = value.into();
        if value.is_null() {
            self.wheres.push(format!("{} IS NULL", field));
        } else {
            self.wheres.push(format!("{}=?", field));
            self.where_slots.push(Slot::Static(value));
        }
        Ok(self)
    }

    /// Adds an equality predicate bound per item by the source function.
    pub fn with_source(
        mut self,
        field: &str,
        source: impl Fn(&T) -> SqlValue + Send + Sync + 'static,
    ) -> Result<Self, BuilderError> {
        advance(&mut self.phase, DeletePhase::Where)?;
        self.wheres.push(format!("{}=?", field));
        self.where_slots.push(Slot::Sourced(Box::new(source)));
        Ok(self)
    }

    /// Adds a raw predicate with no bind values.
    pub fn where_clause(mut self, clause: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, DeletePhase::Where)?;
        self.wheres.push(clause.to_string());
        Ok(self)
    }

    /// Adds one batch item.
    pub fn add_batch(mut self, item: T) -> Result<Self, BuilderError> {
        advance(&mut self.phase, DeletePhase::Batches)?;
        self.items.push(item);
        Ok(self)
    }

    /// Adds batch items.
    pub fn add_batches(mut self, items: Vec<T>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, DeletePhase::Batches)?;
        self.items.extend(items);
        Ok(self)
    }

    /// Renders the statement. May be called once.
    pub fn sql(&mut self) -> Result<String, BuilderError> {
        if self.phase == DeletePhase::Done {
            return Err(BuilderError::AlreadyRendered);
        }
        self.phase = DeletePhase::Done;

        let table = self.table.as_deref().ok_or(BuilderError::Incomplete {
            missing: "table".to_string(),
        })?;

        let mut sql = format!("DELETE FROM {}", table);
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.join(" AND "));
        }

        trace!(sql = %sql, batches = self.items.len(), "rendered batch delete");
        Ok(sql)
    }

    /// One normalized bind row per batch item, in slot declaration order.
    pub fn rows(&self) -> Vec<Vec<SqlValue>> {
        self.items
            .iter()
            .map(|item| {
                self.where_slots
                    .iter()
                    .map(|slot| slot.value_for(item))
                    .collect()
            })
            .collect()
    }
}
