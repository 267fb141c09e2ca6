//! Command execution.

use crate::cli::{Cli, Command, ExportArgs, ImportArgs, SearchArgs, SourceArgs};
use crate::store::{JsonFileStore, load_schemas, select_schema};
use admin_export_core::{
    AdminService, ExportConfig, ExportQuery, ImportFormat, SchemaRegistry, SearchQuery,
};
use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::Path;
use tracing::info;

type FileService = AdminService<SchemaRegistry, JsonFileStore>;

async fn build_service(
    source: &SourceArgs,
    config: ExportConfig,
) -> Result<(FileService, String)> {
    let registry = load_schemas(&source.schema_file)
        .await
        .with_context(|| format!("loading {}", source.schema_file.display()))?;
    let schema = select_schema(&registry, source.schema.as_deref())?;
    let service = AdminService::new(registry, JsonFileStore::new(&source.store))
        .with_config(config)?;
    Ok((service, schema))
}

/// Runs the parsed command, writing results to `out`.
///
/// Returns `false` when the command ran but reported a failure (a rejected
/// import), so the caller can set the exit status.
pub async fn execute<W: Write>(cli: &Cli, out: &mut W) -> Result<bool> {
    match &cli.command {
        Command::Export(args) => export(args, out).await.map(|()| true),
        Command::Search(args) => search(args, out).await.map(|()| true),
        Command::Import(args) => import(args, out).await,
    }
}

async fn export<W: Write>(args: &ExportArgs, out: &mut W) -> Result<()> {
    let (service, schema) = build_service(&args.source, args.config.to_config()).await?;
    let query = ExportQuery {
        filters: args.query.filter_map(),
        sort: args.query.sort_map(),
        relation: args.relation.clone(),
        format: args.format.clone(),
    };

    let payload = service.export(&schema, &query).await?;

    match &args.output {
        Some(output) => {
            let path = if output.is_dir() {
                output.join(&payload.filename)
            } else {
                output.clone()
            };
            tokio::fs::write(&path, &payload.body)
                .await
                .with_context(|| format!("writing {}", path.display()))?;

            info!("✓ Export saved to {}", path.display());
            writeln!(out, "Exported {} rows to {}", payload.row_count, path.display())?;
        }
        None => {
            out.write_all(&payload.body)?;
            out.flush()?;
        }
    }

    Ok(())
}

async fn search<W: Write>(args: &SearchArgs, out: &mut W) -> Result<()> {
    let (service, schema) = build_service(&args.source, args.config.to_config()).await?;
    let query = SearchQuery {
        filters: args.query.filter_map(),
        sort: args.query.sort_map(),
        start: args.start,
        range: args.range,
    };

    let page = service.search(&schema, &query).await?;
    serde_json::to_writer_pretty(&mut *out, &page)?;
    writeln!(out)?;

    Ok(())
}

fn import_format(args: &ImportArgs) -> Result<ImportFormat> {
    match args.format.as_deref() {
        Some("csv") => Ok(ImportFormat::Csv),
        Some("json") => Ok(ImportFormat::Json),
        Some(other) => bail!("unsupported import format '{}'", other),
        None => detect_format(&args.input),
    }
}

fn detect_format(input: &Path) -> Result<ImportFormat> {
    let name = input.to_string_lossy();
    ImportFormat::from_filename(&name)
        .with_context(|| format!("cannot tell the format of {}; pass --format", input.display()))
}

async fn import<W: Write>(args: &ImportArgs, out: &mut W) -> Result<bool> {
    let format = import_format(args)?;
    let (service, schema) = build_service(&args.source, args.config.to_config()).await?;
    let data = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("reading {}", args.input.display()))?;

    let report = service.import(&schema, &data, format).await?;
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;

    Ok(!report.error)
}
