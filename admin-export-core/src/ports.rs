//! Collaborator traits for schema lookup, record search and import.
//!
//! The admin screens never talk to storage directly. They ask a
//! [`SchemaProvider`] for the resource descriptor, a [`RecordSource`] for
//! rows matching a sanitized [`SearchRequest`], and a [`RecordSink`] to
//! store imported rows. All three are object-safe so hosts can inject
//! `Box<dyn ...>` or `Arc<dyn ...>` implementations.
//!
//! [`SchemaRegistry`] and [`MemoryRecordStore`] are in-process
//! implementations used by the CLI and by tests.

use crate::error::AdminExportError;
use crate::flatten::value_text;
use crate::import::{ImportOutcome, RowValidation};
use crate::models::{Record, SchemaDescriptor, SearchRequest, SearchResults};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Resolves resource names to schema descriptors.
pub trait SchemaProvider: Send + Sync {
    /// Returns the descriptor for `name`.
    ///
    /// # Errors
    /// Returns `AdminExportError::SchemaNotFound` for unknown resources.
    fn schema(&self, name: &str) -> Result<SchemaDescriptor>;
}

/// Searches stored records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Returns the rows of `schema` matching `request`.
    ///
    /// Filter and sort keys in `request` have already been sanitized.
    async fn search(&self, schema: &SchemaDescriptor, request: &SearchRequest)
    -> Result<SearchResults>;
}

/// Stores imported records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Validates and stores `rows` for `schema`.
    ///
    /// Row-level validation failures are reported in the outcome, not as
    /// an error; errors are reserved for storage failures.
    async fn import(&self, schema: &SchemaDescriptor, rows: Vec<Record>) -> Result<ImportOutcome>;
}

/// A fixed set of schema descriptors keyed by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, SchemaDescriptor>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a descriptor, keyed by its `name`.
    pub fn register(&mut self, schema: SchemaDescriptor) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    /// Builder form of [`SchemaRegistry::register`].
    pub fn with_schema(mut self, schema: SchemaDescriptor) -> Self {
        self.register(schema);
        self
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl SchemaProvider for SchemaRegistry {
    fn schema(&self, name: &str) -> Result<SchemaDescriptor> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| AdminExportError::schema_not_found(name))
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Compares two cell values for sorting.
///
/// Values are ordered by type first (null, bool, number, string, array,
/// object) so the ordering stays total on mixed columns. Within a type,
/// numbers compare numerically, strings lexically and collections by their
/// JSON text.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.total_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => type_rank(left)
            .cmp(&type_rank(right))
            .then_with(|| value_text(left).cmp(&value_text(right))),
    }
}

fn matches_filters(row: &Record, request: &SearchRequest) -> bool {
    request
        .filters
        .iter()
        .all(|(key, expected)| row.get(key).is_some_and(|v| value_text(v) == *expected))
}

fn compare_rows(left: &Record, right: &Record, request: &SearchRequest) -> Ordering {
    for (key, direction) in &request.sort {
        let ordering = compare_values(
            left.get(key).unwrap_or(&Value::Null),
            right.get(key).unwrap_or(&Value::Null),
        );
        let ordering = if direction.eq_ignore_ascii_case("desc") {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Applies equality filters, sort order and paging to a row set.
pub fn apply_search(rows: &[Record], request: &SearchRequest) -> SearchResults {
    let mut matched: Vec<&Record> = rows
        .iter()
        .filter(|row| matches_filters(row, request))
        .collect();
    matched.sort_by(|a, b| compare_rows(a, b, request));

    let total = matched.len();
    let page = matched.into_iter().skip(request.start);
    let rows = if request.range == 0 {
        page.cloned().collect()
    } else {
        page.take(request.range).cloned().collect()
    };

    SearchResults { rows, total }
}

/// Checks required fields, returning one entry per failing row.
pub fn validate_required(schema: &SchemaDescriptor, rows: &[Record]) -> Vec<RowValidation> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let validation = schema
                .fields
                .iter()
                .filter(|field| field.required)
                .filter(|field| row.get(&field.name).is_none_or(|v| value_text(v).is_empty()))
                .fold(RowValidation::new(index), |validation, field| {
                    let label = field.label.as_deref().unwrap_or(&field.name);
                    validation.with_error(field.name.clone(), format!("{} is required", label))
                });
            (!validation.errors.is_empty()).then_some(validation)
        })
        .collect()
}

/// Records held in memory, grouped by schema name.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with rows for one schema.
    pub fn with_rows(schema_name: impl Into<String>, rows: Vec<Record>) -> Self {
        let mut tables = HashMap::new();
        tables.insert(schema_name.into(), rows);
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Returns a copy of every row stored for `schema_name`.
    pub async fn rows(&self, schema_name: &str) -> Vec<Record> {
        self.tables
            .read()
            .await
            .get(schema_name)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordSource for MemoryRecordStore {
    async fn search(
        &self,
        schema: &SchemaDescriptor,
        request: &SearchRequest,
    ) -> Result<SearchResults> {
        let tables = self.tables.read().await;
        let rows = tables.get(&schema.name).map(Vec::as_slice).unwrap_or_default();
        Ok(apply_search(rows, request))
    }
}

#[async_trait]
impl RecordSink for MemoryRecordStore {
    async fn import(&self, schema: &SchemaDescriptor, rows: Vec<Record>) -> Result<ImportOutcome> {
        let validation = validate_required(schema, &rows);
        if !validation.is_empty() {
            return Ok(ImportOutcome::rejected(validation));
        }

        let count = rows.len();
        self.tables
            .write()
            .await
            .entry(schema.name.clone())
            .or_default()
            .extend(rows);

        Ok(ImportOutcome::imported(count))
    }
}
