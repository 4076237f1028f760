//! CLI command implementations
//!
//! Commands are thin: load the config and dataset descriptions, hand the
//! request to `ViewCompiler`, print the envelope.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::observability::{log_event_with_fields, Event, Logger};
use crate::schema::{FieldKind, SchemaCatalog};
use crate::view::{
    CompiledView, CompilerConfig, Dataset, InMemoryDatasets, ViewCompiler, ViewRequest, ViewResult,
};

use super::args::Command;
use super::errors::CliResult;
use super::io::{error_envelope, ok_envelope, read_request, read_requests, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile {
            dataset,
            request,
            config,
        } => compile(&dataset, request.as_deref(), config.as_deref()),
        Command::Start { dataset, config } => start(&dataset, config.as_deref()),
        Command::Check { dataset, config } => check(&dataset, config.as_deref()),
    }
}

/// Loads the config (or defaults) and applies its log level
pub fn load_config(path: Option<&Path>) -> CliResult<CompilerConfig> {
    let config = match path {
        Some(path) => {
            let config = CompilerConfig::load(path)?;
            log_event_with_fields(
                Event::ConfigLoaded,
                &[("path", path.display().to_string().as_str())],
            );
            config
        }
        None => CompilerConfig::default(),
    };
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}

fn load_dataset(path: &Path) -> CliResult<Dataset> {
    let dataset = Dataset::load(path)?;
    log_event_with_fields(
        Event::DatasetLoaded,
        &[("dataset", dataset.name.as_str())],
    );
    Ok(dataset)
}

fn build_compiler(datasets: &[PathBuf], config: CompilerConfig) -> CliResult<ViewCompiler> {
    let mut source = InMemoryDatasets::new();
    for path in datasets {
        source.insert(load_dataset(path)?);
    }
    Ok(ViewCompiler::new(Arc::new(source), config))
}

/// Response payload for a compiled view
pub fn compiled_to_json(compiled: &CompiledView) -> ViewResult<Value> {
    Ok(json!({
        "dataset": compiled.view.dataset().name,
        "stages": compiled.view.to_dicts()?,
        "group_slice": compiled.view.group_slice(),
        "media_types": compiled.media_types,
    }))
}

fn compile_value(compiler: &ViewCompiler, request: Value) -> CliResult<Value> {
    let request: ViewRequest = serde_json::from_value(request)?;
    let compiled = compiler.get_view(&request)?;
    Ok(compiled_to_json(&compiled)?)
}

/// Compile one request and print the result
pub fn compile(dataset: &Path, request: Option<&Path>, config: Option<&Path>) -> CliResult<()> {
    let config = load_config(config)?;
    let compiler = build_compiler(&[dataset.to_path_buf()], config)?;
    let request = read_request(request)?;
    write_response(compile_value(&compiler, request)?)
}

/// Compile newline-delimited requests until EOF.
///
/// A failing request yields an error line; the loop continues.
pub fn start(datasets: &[PathBuf], config: Option<&Path>) -> CliResult<()> {
    let config = load_config(config)?;
    let compiler = build_compiler(datasets, config)?;

    let mut stdout = std::io::stdout();
    for request in read_requests() {
        let response = match request.and_then(|r| compile_value(&compiler, r)) {
            Ok(data) => ok_envelope(data),
            Err(e) => error_envelope(e.code(), &e.message()),
        };
        serde_json::to_writer(&mut stdout, &response)?;
        writeln!(stdout)?;
        stdout.flush()?;
    }
    Ok(())
}

/// Summary of a dataset's layout
pub fn describe_dataset(dataset: &Dataset) -> Value {
    let catalog: &dyn SchemaCatalog = dataset.schema.as_ref();
    let labels: Vec<&str> = catalog
        .label_fields()
        .into_iter()
        .map(|f| f.path.as_str())
        .collect();
    let dicts: Vec<&str> = catalog
        .get_field_schema(true)
        .into_iter()
        .filter(|f| f.kind == FieldKind::Dict)
        .map(|f| f.path.as_str())
        .collect();
    json!({
        "name": dataset.name,
        "media_type": dataset.media_type,
        "group_field": dataset.group_field,
        "group_media_types": dataset.group_media_types,
        "fields": catalog.get_field_schema(false).len(),
        "frame_fields": catalog.get_frame_field_schema(false).len(),
        "label_fields": labels,
        "dict_fields": dicts,
        "saved_views": dataset.saved_views.keys().collect::<Vec<_>>(),
    })
}

/// Validate a dataset description and print its layout
pub fn check(dataset: &Path, config: Option<&Path>) -> CliResult<()> {
    load_config(config)?;
    let dataset = load_dataset(dataset)?;
    write_response(describe_dataset(&dataset))
}
