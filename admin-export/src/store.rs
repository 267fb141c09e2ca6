//! File-backed collaborators.
//!
//! Schema descriptors come from a validated JSON file. Records live in a
//! JSON array file that is read on every request and rewritten on import.

use admin_export_core::error::AdminExportError;
use admin_export_core::ports::{apply_search, validate_required};
use admin_export_core::validation::validate_descriptor;
use admin_export_core::{
    ImportOutcome, Record, RecordSink, RecordSource, Result, SchemaDescriptor, SchemaRegistry,
    SearchRequest, SearchResults,
};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

async fn read_file(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AdminExportError::Io {
            context: format!("Failed to read {}", path.display()),
            source: e,
        }),
    }
}

fn descriptor_from(path: &Path, value: Value) -> Result<SchemaDescriptor> {
    validate_descriptor(&value).map_err(|e| {
        AdminExportError::configuration(format!(
            "Invalid schema descriptor in {}: {}",
            path.display(),
            e
        ))
    })?;
    serde_json::from_value(value).map_err(|e| {
        AdminExportError::serialization(format!("schema descriptor in {}", path.display()), e)
    })
}

/// Loads a descriptor file into a registry.
///
/// The file holds either a single descriptor object or an array of them.
/// Every descriptor is validated before it is registered.
pub async fn load_schemas(path: &Path) -> Result<SchemaRegistry> {
    let bytes = read_file(path).await?.ok_or_else(|| {
        AdminExportError::configuration(format!("Schema file not found: {}", path.display()))
    })?;
    let document: Value = serde_json::from_slice(&bytes).map_err(|e| {
        AdminExportError::serialization(format!("schema file {}", path.display()), e)
    })?;

    let descriptors = match document {
        Value::Array(items) => items,
        single => vec![single],
    };

    let mut registry = SchemaRegistry::new();
    for value in descriptors {
        let schema = descriptor_from(path, value)?;
        debug!(schema = %schema.name, fields = schema.fields.len(), "Loaded schema descriptor");
        registry.register(schema);
    }

    Ok(registry)
}

/// Picks the schema a command runs against.
///
/// An explicit name always wins. Without one, the registry must hold
/// exactly one schema.
pub fn select_schema(registry: &SchemaRegistry, requested: Option<&str>) -> Result<String> {
    if let Some(name) = requested {
        return Ok(name.to_string());
    }

    match registry.names().as_slice() {
        [only] => Ok((*only).to_string()),
        [] => Err(AdminExportError::configuration(
            "Schema file defines no schemas",
        )),
        names => Err(AdminExportError::configuration(format!(
            "Schema file defines several schemas ({}); pass --schema",
            names.join(", ")
        ))),
    }
}

/// Records stored as a JSON array in a single file.
///
/// A missing or blank file is an empty store. Imports hold a lock across
/// the read-modify-write so concurrent imports in one process do not lose
/// rows.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store over `path`; the file is not touched until used.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored record.
    pub async fn load(&self) -> Result<Vec<Record>> {
        let Some(bytes) = read_file(&self.path).await? else {
            return Ok(Vec::new());
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            AdminExportError::serialization(format!("record store {}", self.path.display()), e)
        })
    }

    async fn save(&self, rows: &[Record]) -> Result<()> {
        let json = serde_json::to_vec_pretty(rows).map_err(|e| {
            AdminExportError::serialization(format!("record store {}", self.path.display()), e)
        })?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AdminExportError::Io {
                context: format!("Failed to write to {}", self.path.display()),
                source: e,
            })
    }
}

#[async_trait]
impl RecordSource for JsonFileStore {
    async fn search(
        &self,
        _schema: &SchemaDescriptor,
        request: &SearchRequest,
    ) -> Result<SearchResults> {
        let rows = self.load().await?;
        Ok(apply_search(&rows, request))
    }
}

#[async_trait]
impl RecordSink for JsonFileStore {
    async fn import(&self, schema: &SchemaDescriptor, rows: Vec<Record>) -> Result<ImportOutcome> {
        let validation = validate_required(schema, &rows);
        if !validation.is_empty() {
            return Ok(ImportOutcome::rejected(validation));
        }

        let _guard = self.write_lock.lock().await;
        let mut stored = self.load().await?;
        let count = rows.len();
        stored.extend(rows);
        self.save(&stored).await?;

        info!(
            store = %self.path.display(),
            imported = count,
            total = stored.len(),
            "Record store updated"
        );
        Ok(ImportOutcome::imported(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admin_export_core::FieldDescriptor;
    use serde_json::json;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("profile", "Profile")
            .with_field(FieldDescriptor::new("profile_name").required())
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("missing.json"));
        assert!(store.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn test_file_store_import_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profiles.json");
        tokio::fs::write(&path, r#"[{"profile_name": "Ann"}]"#)
            .await
            .expect("seed");
        let store = JsonFileStore::new(&path);

        let outcome = store
            .import(&schema(), vec![record(json!({"profile_name": "Bo"}))])
            .await
            .expect("import");
        assert_eq!(outcome.imported, 1);

        let rows = store.load().await.expect("load");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["profile_name"], json!("Bo"));
    }

    #[tokio::test]
    async fn test_file_store_rejected_import_leaves_file_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profiles.json");
        let store = JsonFileStore::new(&path);

        let outcome = store
            .import(&schema(), vec![record(json!({"profile_name": ""}))])
            .await
            .expect("import");
        assert!(outcome.has_errors());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_file_store_rejects_malformed_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profiles.json");
        tokio::fs::write(&path, "{not json").await.expect("seed");

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(AdminExportError::Serialization { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_load_schemas_accepts_array_and_single() {
        let dir = tempfile::tempdir().expect("tempdir");
        let single = dir.path().join("single.json");
        tokio::fs::write(
            &single,
            r#"{"name": "profile", "singular": "Profile", "plural": "Profiles", "primary": "profile_id"}"#,
        )
        .await
        .expect("write");
        let registry = load_schemas(&single).await.expect("load");
        assert_eq!(select_schema(&registry, None).expect("select"), "profile");

        let several = dir.path().join("several.json");
        tokio::fs::write(
            &several,
            r#"[
                {"name": "profile", "singular": "Profile", "plural": "Profiles", "primary": "profile_id"},
                {"name": "user", "singular": "User", "plural": "Users", "primary": "user_id"}
            ]"#,
        )
        .await
        .expect("write");
        let registry = load_schemas(&several).await.expect("load");
        assert_eq!(registry.names(), vec!["profile", "user"]);
        assert!(select_schema(&registry, None).is_err());
        assert_eq!(select_schema(&registry, Some("user")).expect("select"), "user");
    }

    #[tokio::test]
    async fn test_file_load_schemas_rejects_invalid_descriptor() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, r#"{"name": "profile"}"#)
            .await
            .expect("write");

        assert!(matches!(
            load_schemas(&path).await,
            Err(AdminExportError::Configuration { .. })
        ));
    }
}
