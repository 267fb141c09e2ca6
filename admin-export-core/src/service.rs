//! Search, export and import orchestration.
//!
//! [`AdminService`] performs the work an admin controller does around its
//! collaborators: sanitize request keys under the right policy, shape the
//! search request, call the record source or sink, and turn the result into
//! a page, an export payload or an import report.

use crate::config::ExportConfig;
use crate::error::AdminExportError;
use crate::export::{ExportPayload, render_export_dated};
use crate::flatten::flatten_rows;
use crate::import::{ImportFormat, ImportReport, parse_import};
use crate::models::{
    ExportFormat, FilterMap, Record, Relation, SchemaDescriptor, SearchRequest, SortMap,
};
use crate::ports::{RecordSink, RecordSource, SchemaProvider};
use crate::sanitize::{KeyPolicy, sanitize_filters, sanitize_sort};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Parameters of a search page request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Raw filter parameters
    pub filters: FilterMap,
    /// Raw sort parameters
    pub sort: SortMap,
    /// Offset of the first row
    #[serde(default)]
    pub start: usize,
    /// Page size; the configured default applies when absent
    #[serde(default)]
    pub range: Option<usize>,
}

/// Parameters of an export request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportQuery {
    /// Raw filter parameters
    pub filters: FilterMap,
    /// Raw sort parameters
    pub sort: SortMap,
    /// Name of a related schema whose primary key may also be filtered on
    #[serde(default)]
    pub relation: Option<String>,
    /// Raw `type` parameter; unknown values export as JSON
    #[serde(default)]
    pub format: String,
}

/// Everything the search page needs to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Schema name
    pub schema: String,
    /// Rows of this page
    pub rows: Vec<Record>,
    /// Matching rows before paging
    pub total: usize,
    /// Offset of the first row
    pub start: usize,
    /// Page size used
    pub range: usize,
    /// Filters that were actually applied
    pub filters: FilterMap,
    /// Sort keys that were actually applied
    pub sort: SortMap,
    /// Fields offered as filters (active flag excluded)
    pub filterable: Vec<String>,
    /// Relations offered as filters (single links only)
    pub filterable_relations: Vec<Relation>,
}

/// Admin operations over injected collaborators.
pub struct AdminService<P, R> {
    schemas: P,
    records: R,
    config: ExportConfig,
}

impl<P, R> AdminService<P, R>
where
    P: SchemaProvider,
    R: RecordSource,
{
    /// Creates a service with the default configuration.
    pub fn new(schemas: P, records: R) -> Self {
        Self {
            schemas,
            records,
            config: ExportConfig::default(),
        }
    }

    /// Builder method to replace the configuration.
    ///
    /// # Errors
    /// Returns error if the configuration does not validate.
    pub fn with_config(mut self, config: ExportConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Current configuration
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// The record collaborator
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Runs a search page request.
    ///
    /// Keys are checked with the identifier policy and empty filter values
    /// are dropped.
    pub async fn search(&self, schema_name: &str, query: &SearchQuery) -> Result<SearchPage> {
        let schema = self.schemas.schema(schema_name)?;

        let request = SearchRequest {
            filters: sanitize_filters(&query.filters, &KeyPolicy::Identifier),
            sort: sanitize_sort(&query.sort, &KeyPolicy::Identifier),
            start: query.start,
            range: query.range.unwrap_or(self.config.search_range),
        };
        debug!(
            schema = %schema.name,
            filters = request.filters.len(),
            sort = request.sort.len(),
            "Searching records"
        );

        let results = self.records.search(&schema, &request).await?;

        Ok(SearchPage {
            schema: schema.name.clone(),
            rows: results.rows,
            total: results.total,
            start: request.start,
            range: request.range,
            filters: request.filters,
            sort: request.sort,
            filterable: schema.search_filterable_field_names(),
            filterable_relations: schema.filterable_relations().into_iter().cloned().collect(),
        })
    }

    /// Builds the sanitized, unpaged request an export runs with.
    pub fn export_request(&self, schema: &SchemaDescriptor, query: &ExportQuery) -> SearchRequest {
        let mut filterable = schema.filterable_field_names();
        if let Some(relation) = query.relation.as_deref() {
            match schema.relation(relation) {
                Some(relation) => filterable.push(relation.primary.clone()),
                None => debug!(relation, "Unknown relation ignored for export filters"),
            }
        }

        SearchRequest {
            filters: sanitize_filters(&query.filters, &KeyPolicy::whitelist(filterable)),
            sort: sanitize_sort(
                &query.sort,
                &KeyPolicy::whitelist(schema.sortable_field_names()),
            ),
            start: 0,
            range: 0,
        }
    }

    /// Exports every matching record, dated today.
    pub async fn export(&self, schema_name: &str, query: &ExportQuery) -> Result<ExportPayload> {
        self.export_dated(schema_name, query, chrono::Local::now().date_naive())
            .await
    }

    /// Exports every matching record with a fixed filename date.
    ///
    /// Keys are checked against the schema's filterable and sortable
    /// whitelists, paging is disabled, and rows are flattened before
    /// rendering.
    pub async fn export_dated(
        &self,
        schema_name: &str,
        query: &ExportQuery,
        date: NaiveDate,
    ) -> Result<ExportPayload> {
        let schema = self.schemas.schema(schema_name)?;
        let format = ExportFormat::from_request_type(&query.format);
        let request = self.export_request(&schema, query);

        let results = self.records.search(&schema, &request).await?;
        let rows = flatten_rows(&results.rows);
        let payload = render_export_dated(&rows, &schema, format, date, &self.config)?;

        info!(
            schema = %schema.name,
            format = %format,
            rows = payload.row_count,
            bytes = payload.body.len(),
            "Export rendered"
        );

        Ok(payload)
    }
}

impl<P, R> AdminService<P, R>
where
    P: SchemaProvider,
    R: RecordSource + RecordSink,
{
    /// Imports an uploaded payload.
    ///
    /// Payloads that cannot be decoded, or that exceed the configured row
    /// limit, produce a failed report rather than an error. Errors are
    /// reserved for an unknown schema or a failing collaborator.
    pub async fn import(
        &self,
        schema_name: &str,
        data: &[u8],
        format: ImportFormat,
    ) -> Result<ImportReport> {
        let schema = self.schemas.schema(schema_name)?;

        let rows = match parse_import(data, format) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(schema = %schema.name, error = %e, "Import payload rejected");
                return Ok(ImportReport::rejected_payload(&e));
            }
        };

        if rows.len() > self.config.max_import_rows {
            let e = AdminExportError::import_failed(format!(
                "{} rows exceeds the limit of {}",
                rows.len(),
                self.config.max_import_rows
            ));
            warn!(schema = %schema.name, error = %e, "Import payload rejected");
            return Ok(ImportReport::rejected_payload(&e));
        }

        let outcome = self.records.import(&schema, rows).await?;
        let report = ImportReport::from_outcome(&schema, &outcome);

        if report.error {
            info!(
                schema = %schema.name,
                failed_rows = outcome.validation.len(),
                "Import rejected by validation"
            );
        } else {
            info!(schema = %schema.name, imported = outcome.imported, "{}", report.message);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldDescriptor;
    use crate::ports::{MemoryRecordStore, SchemaRegistry};
    use serde_json::json;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("profile", "Profile")
            .with_active("profile_active")
            .with_field(FieldDescriptor::new("profile_id").sortable())
            .with_field(FieldDescriptor::new("profile_name").filterable().sortable().required())
            .with_field(FieldDescriptor::new("profile_active").filterable())
            .with_relation(Relation {
                name: "user".to_string(),
                primary: "user_id".to_string(),
                many: 1,
            })
    }

    fn service() -> AdminService<SchemaRegistry, MemoryRecordStore> {
        let rows = vec![
            json!({"profile_id": 1, "profile_name": "Ann", "profile_active": 1, "user_id": 7}),
            json!({"profile_id": 2, "profile_name": "Bob", "profile_active": 1, "user_id": 8}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();

        AdminService::new(
            SchemaRegistry::new().with_schema(schema()),
            MemoryRecordStore::with_rows("profile", rows),
        )
    }

    #[test]
    fn test_export_request_uses_whitelists() {
        let service = service();
        let query = ExportQuery {
            filters: FilterMap::from([
                ("profile_name".to_string(), String::new()),
                ("user_id".to_string(), "7".to_string()),
                ("profile_id".to_string(), "1".to_string()),
            ]),
            sort: SortMap::from([
                ("profile_id".to_string(), "DESC".to_string()),
                ("profile_active".to_string(), "ASC".to_string()),
            ]),
            relation: Some("user".to_string()),
            format: "csv".to_string(),
        };

        let request = service.export_request(&schema(), &query);
        assert_eq!(
            request.filters,
            FilterMap::from([
                ("profile_name".to_string(), String::new()),
                ("user_id".to_string(), "7".to_string()),
            ])
        );
        assert_eq!(
            request.sort,
            SortMap::from([("profile_id".to_string(), "DESC".to_string())])
        );
        assert_eq!(request.range, 0);
    }

    #[test]
    fn test_relation_primary_needs_relation() {
        let service = service();
        let query = ExportQuery {
            filters: FilterMap::from([("user_id".to_string(), "7".to_string())]),
            ..ExportQuery::default()
        };
        assert!(service.export_request(&schema(), &query).filters.is_empty());
    }

    #[tokio::test]
    async fn test_search_applies_defaults() {
        let service = service();
        let query = SearchQuery {
            filters: FilterMap::from([
                ("profile_name".to_string(), "Bob".to_string()),
                ("bad key".to_string(), "x".to_string()),
                ("profile_active".to_string(), String::new()),
            ]),
            ..SearchQuery::default()
        };

        let page = service.search("profile", &query).await.expect("search");
        assert_eq!(page.range, 50);
        assert_eq!(page.total, 1);
        assert_eq!(page.filters.len(), 1);
        assert_eq!(page.filterable, vec!["profile_name"]);
        assert_eq!(page.filterable_relations.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_schema_is_an_error() {
        let service = service();
        assert!(service.search("missing", &SearchQuery::default()).await.is_err());
        assert!(service.export("missing", &ExportQuery::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_import_reports_validation_errors() {
        let service = service();
        let report = service
            .import("profile", b"profile_id,profile_name\n3,\n", ImportFormat::Csv)
            .await
            .expect("import");

        assert!(report.error);
        assert_eq!(
            report.errors,
            Some(vec!["ROW 0 - profile_name: profile_name is required".to_string()])
        );
    }

    #[tokio::test]
    async fn test_import_respects_row_limit() {
        let service = service()
            .with_config(ExportConfig::new().with_max_import_rows(1))
            .expect("config");
        let report = service
            .import(
                "profile",
                br#"[{"profile_name": "A"}, {"profile_name": "B"}]"#,
                ImportFormat::Json,
            )
            .await
            .expect("import");

        assert!(report.error);
        assert!(report.message.contains("exceeds the limit"));
        assert_eq!(service.records().rows("profile").await.len(), 2);
    }
}
