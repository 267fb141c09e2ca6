//! Core data models for schema-described records.
//!
//! Records are schema-free ordered mappings produced by an external search
//! collaborator. The schema descriptor carries the per-resource metadata the
//! sanitizer, exporter and importer need: field lists, the filterable and
//! sortable whitelists, and the names used for XML roots and filenames.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single record: field name to value, in insertion order.
pub type Record = Map<String, Value>;

/// Raw or sanitized filter parameters (field name to value).
pub type FilterMap = IndexMap<String, String>;

/// Raw or sanitized sort parameters (field name to direction).
pub type SortMap = IndexMap<String, String>;

/// Export output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// XML document rooted at the resource name
    Xml,
    /// JSON array of objects
    #[default]
    Json,
}

impl ExportFormat {
    /// Resolves the `type` request parameter to a format.
    ///
    /// Matching is case-insensitive. Anything other than `csv` or `xml`
    /// resolves to JSON, so an unsupported type never fails the export.
    pub fn from_request_type(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => ExportFormat::Csv,
            "xml" => ExportFormat::Xml,
            "json" => ExportFormat::Json,
            other => {
                tracing::debug!(requested = other, "Unknown export type, falling back to JSON");
                ExportFormat::Json
            }
        }
    }

    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Json => "json",
        }
    }

    /// Content-Type header value for this format
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=UTF-8",
            ExportFormat::Xml => "text/xml; charset=UTF-8",
            ExportFormat::Json => "text/json; charset=UTF-8",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A single field of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column name
    pub name: String,
    /// Display label, used in validation messages
    #[serde(default)]
    pub label: Option<String>,
    /// Allowed as a filter key
    #[serde(default)]
    pub filterable: bool,
    /// Allowed as a sort key
    #[serde(default)]
    pub sortable: bool,
    /// Must be non-empty on import
    #[serde(default)]
    pub required: bool,
}

impl FieldDescriptor {
    /// Creates a plain field with no search capabilities
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            filterable: false,
            sortable: false,
            required: false,
        }
    }

    /// Builder method to mark the field filterable.
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Builder method to mark the field sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Builder method to mark the field required on import.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Builder method to set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A relation from one schema to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Name of the related schema
    pub name: String,
    /// Primary key field of the related schema
    pub primary: String,
    /// Cardinality marker: 0 or 1 for single links, 2 or more for many-to-many
    #[serde(default)]
    pub many: u8,
}

/// Metadata describing a resource exposed through the admin screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Machine name, used as the XML root element
    pub name: String,
    /// Human-readable singular name
    pub singular: String,
    /// Human-readable plural name, used in filenames and messages
    pub plural: String,
    /// Primary key field name
    pub primary: String,
    /// Soft-delete flag field, if the schema has one
    #[serde(default)]
    pub active: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl SchemaDescriptor {
    /// Creates a schema with no fields or relations.
    ///
    /// The plural defaults to the singular with an `s` appended.
    pub fn new(name: impl Into<String>, singular: impl Into<String>) -> Self {
        let name = name.into();
        let singular = singular.into();
        Self {
            primary: format!("{}_id", name),
            plural: format!("{}s", singular),
            name,
            singular,
            active: None,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Builder method to override the plural name.
    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self
    }

    /// Builder method to override the primary key field.
    pub fn with_primary(mut self, primary: impl Into<String>) -> Self {
        self.primary = primary.into();
        self
    }

    /// Builder method to set the soft-delete flag field.
    pub fn with_active(mut self, active: impl Into<String>) -> Self {
        self.active = Some(active.into());
        self
    }

    /// Builder method to append a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Builder method to append a relation.
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// All field names in declaration order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Field names that may be used as filter keys
    pub fn filterable_field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.filterable)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Field names that may be used as sort keys
    pub fn sortable_field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.sortable)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Filterable fields offered on the search page.
    ///
    /// The active flag has its own toggle there, so it is left out.
    pub fn search_filterable_field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.filterable)
            .filter(|f| self.active.as_deref() != Some(f.name.as_str()))
            .map(|f| f.name.clone())
            .collect()
    }

    /// Relations that can be filtered on (single links only)
    pub fn filterable_relations(&self) -> Vec<&Relation> {
        self.relations.iter().filter(|r| r.many < 2).collect()
    }

    /// Looks up a relation by the related schema's name
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A sanitized request handed to the record source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Equality filters, field to value
    pub filters: FilterMap,
    /// Sort keys in precedence order, field to direction
    pub sort: SortMap,
    /// Offset of the first row to return
    pub start: usize,
    /// Maximum number of rows to return; 0 means no limit
    pub range: usize,
}

/// Rows returned by the record source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Rows of the requested page
    pub rows: Vec<Record>,
    /// Total matching rows before paging
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_schema() -> SchemaDescriptor {
        SchemaDescriptor::new("profile", "Profile")
            .with_active("profile_active")
            .with_field(FieldDescriptor::new("profile_id").sortable())
            .with_field(FieldDescriptor::new("profile_name").filterable().sortable())
            .with_field(FieldDescriptor::new("profile_active").filterable())
            .with_field(FieldDescriptor::new("profile_meta"))
            .with_relation(Relation {
                name: "user".to_string(),
                primary: "user_id".to_string(),
                many: 1,
            })
            .with_relation(Relation {
                name: "tag".to_string(),
                primary: "tag_id".to_string(),
                many: 2,
            })
    }

    #[test]
    fn test_schema_defaults() {
        let schema = SchemaDescriptor::new("profile", "Profile");
        assert_eq!(schema.plural, "Profiles");
        assert_eq!(schema.primary, "profile_id");
        assert!(schema.fields.is_empty());
    }

    #[test]
    fn test_schema_overrides_and_lookup() {
        let schema = SchemaDescriptor::new("person", "Person")
            .with_plural("People")
            .with_primary("person_uuid")
            .with_field(FieldDescriptor::new("person_name").with_label("Name"));

        assert_eq!(schema.plural, "People");
        assert_eq!(schema.primary, "person_uuid");
        assert_eq!(
            schema.field("person_name").and_then(|f| f.label.as_deref()),
            Some("Name")
        );
        assert!(schema.field("person_age").is_none());
    }

    #[test]
    fn test_field_name_lists() {
        let schema = profile_schema();
        assert_eq!(
            schema.field_names(),
            vec!["profile_id", "profile_name", "profile_active", "profile_meta"]
        );
        assert_eq!(
            schema.filterable_field_names(),
            vec!["profile_name", "profile_active"]
        );
        assert_eq!(schema.sortable_field_names(), vec!["profile_id", "profile_name"]);
    }

    #[test]
    fn test_search_filterable_excludes_active_field() {
        let schema = profile_schema();
        assert_eq!(schema.search_filterable_field_names(), vec!["profile_name"]);
    }

    #[test]
    fn test_filterable_relations_skip_many_to_many() {
        let schema = profile_schema();
        let relations = schema.filterable_relations();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].name, "user");
        assert_eq!(schema.relation("tag").map(|r| r.many), Some(2));
    }

    #[test]
    fn test_export_format_resolution() {
        assert_eq!(ExportFormat::from_request_type("csv"), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_request_type("XML"), ExportFormat::Xml);
        assert_eq!(ExportFormat::from_request_type("json"), ExportFormat::Json);
        assert_eq!(ExportFormat::from_request_type("pdf"), ExportFormat::Json);
        assert_eq!(ExportFormat::from_request_type(""), ExportFormat::Json);
    }

    #[test]
    fn test_export_format_metadata() {
        assert_eq!(ExportFormat::Csv.content_type(), "text/csv; charset=UTF-8");
        assert_eq!(ExportFormat::Xml.content_type(), "text/xml; charset=UTF-8");
        assert_eq!(ExportFormat::Json.content_type(), "text/json; charset=UTF-8");
        assert_eq!(ExportFormat::Xml.to_string(), "xml");
    }

    #[test]
    fn test_schema_descriptor_serde_roundtrip() {
        let schema = profile_schema();
        let json = serde_json::to_string(&schema).expect("serialize");
        let deserialized: SchemaDescriptor = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(deserialized, schema);
    }
}
