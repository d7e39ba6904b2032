#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )
)]
// crates/depotgate-cli/src/main.rs
// ============================================================================
// Module: DepotGate CLI Entry Point
// Description: Command dispatcher for the HTTP server and direct verb invocation.
// Purpose: Give an operator a single binary covering spec.md §6's verb table.
// Dependencies: clap, depotgate-config, depotgate-core, depotgate-http, depotgate-service,
//               depotgate-sink, depotgate-storage-fs, depotgate-store-sqlite, serde_json, tokio.
// ============================================================================

//! ## Overview
//! `depotgate serve` starts the HTTP façade over a composition root built
//! from [`DepotGateConfig`]; every other subcommand exercises the same
//! composition root directly, without going over HTTP, printing the verb's
//! JSON result to stdout. Both paths share [`build_backends`], so the wiring
//! an operator reads in a log line from `serve` is the same wiring a direct
//! verb invocation exercised.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use depotgate_config::DepotGateConfig;
use depotgate_core::ArtifactId;
use depotgate_core::ArtifactRole;
use depotgate_core::Clock;
use depotgate_core::DeliverableId;
use depotgate_core::DeliverableSpec;
use depotgate_core::PurgePolicy;
use depotgate_core::ReceiptId;
use depotgate_core::RootTaskId;
use depotgate_core::SystemClock;
use depotgate_core::TenantId;
use depotgate_core::interfaces::MetadataStore;
use depotgate_core::interfaces::OutboundSink;
use depotgate_core::interfaces::ReceiptStore;
use depotgate_core::interfaces::StorageBackend;
use depotgate_http::AppState;
use depotgate_service::DeliverableManager;
use depotgate_service::ShippingService;
use depotgate_service::StagingArea;
use depotgate_sink::CompositeSink;
use depotgate_sink::FsSink;
use depotgate_sink::HttpSink;
use depotgate_storage_fs::FsStorageBackend;
use depotgate_store_sqlite::SqliteStore;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "depotgate",
    disable_help_subcommand = true,
    disable_version_flag = true,
    arg_required_else_help = true
)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands, one per `spec.md` §6 verb plus `serve`.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP façade.
    Serve(ServeCommand),
    /// Stage artifact bytes under a task.
    Stage(StageCommand),
    /// List live artifacts staged under a task.
    StageList(StageListCommand),
    /// Fetch a single artifact's pointer metadata.
    GetArtifact(GetArtifactCommand),
    /// Fetch a single artifact's stored bytes.
    GetContent(GetContentCommand),
    /// Declare a deliverable contract under a task.
    DeclareDeliverable(DeclareDeliverableCommand),
    /// Mark a named requirement satisfied on a deliverable.
    MarkRequirement(MarkRequirementCommand),
    /// Compute whether a deliverable's contract is currently satisfied.
    CheckClosure(CheckClosureCommand),
    /// Ship a deliverable to its configured destination.
    Ship(ShipCommand),
    /// Purge staged artifacts under a task.
    Purge(PurgeCommand),
    /// List receipts emitted for a task.
    ListReceipts(ListReceiptsCommand),
}

/// Config path shared by every subcommand.
#[derive(Args, Debug)]
struct ConfigArg {
    /// Optional config file path (defaults to `depotgate.toml` or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
}

/// Arguments for `stage`.
#[derive(Args, Debug)]
struct StageCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Root task id to stage the artifact under.
    #[arg(long)]
    task_id: String,
    /// Path to the file whose bytes should be staged.
    #[arg(long, value_name = "PATH")]
    content: PathBuf,
    /// Caller-declared MIME type.
    #[arg(long, default_value = "application/octet-stream")]
    mime_type: String,
    /// Caller-declared role: `final_output`, `supporting`, `plan`, `log`, or `other`.
    #[arg(long, default_value = "final_output")]
    role: String,
    /// The receipt that produced this artifact, if any.
    #[arg(long, value_name = "RECEIPT_ID")]
    produced_by_receipt_id: Option<String>,
}

/// Arguments for `stage-list`.
#[derive(Args, Debug)]
struct StageListCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Root task id to list artifacts under.
    #[arg(long)]
    task_id: String,
    /// Restrict the listing to a single role.
    #[arg(long)]
    role: Option<String>,
}

/// Arguments for `get-artifact`.
#[derive(Args, Debug)]
struct GetArtifactCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Artifact id to fetch.
    #[arg(long)]
    artifact_id: String,
}

/// Arguments for `get-content`.
#[derive(Args, Debug)]
struct GetContentCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Artifact id whose bytes should be fetched.
    #[arg(long)]
    artifact_id: String,
    /// Destination path for the fetched bytes; defaults to stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Arguments for `declare-deliverable`.
#[derive(Args, Debug)]
struct DeclareDeliverableCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Root task id to declare the deliverable under.
    #[arg(long)]
    task_id: String,
    /// Path to a JSON file holding the deliverable's [`DeliverableSpec`].
    #[arg(long, value_name = "PATH")]
    spec: PathBuf,
}

/// Arguments for `mark-requirement`.
#[derive(Args, Debug)]
struct MarkRequirementCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Deliverable id to mark the requirement on.
    #[arg(long)]
    deliverable_id: String,
    /// Name of the requirement being marked satisfied.
    #[arg(long)]
    requirement: String,
}

/// Arguments for `check-closure`.
#[derive(Args, Debug)]
struct CheckClosureCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Deliverable id to compute closure for.
    #[arg(long)]
    deliverable_id: String,
}

/// Arguments for `ship`.
#[derive(Args, Debug)]
struct ShipCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Deliverable id to ship.
    #[arg(long)]
    deliverable_id: String,
}

/// Retention policy choices exposed on the `purge` subcommand.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum PurgePolicyArg {
    /// Delete bytes and drop pointers immediately.
    Immediate,
    /// Drop pointers after a 24-hour retention window.
    Retain24h,
    /// Drop pointers after a 7-day retention window.
    Retain7d,
    /// Record intent only; no pointer state change.
    Manual,
}

impl From<PurgePolicyArg> for PurgePolicy {
    fn from(value: PurgePolicyArg) -> Self {
        match value {
            PurgePolicyArg::Immediate => Self::Immediate,
            PurgePolicyArg::Retain24h => Self::Retain24h,
            PurgePolicyArg::Retain7d => Self::Retain7d,
            PurgePolicyArg::Manual => Self::Manual,
        }
    }
}

/// Arguments for `purge`.
#[derive(Args, Debug)]
struct PurgeCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Root task id to purge artifacts under.
    #[arg(long)]
    task_id: String,
    /// Retention policy to apply.
    #[arg(long, value_enum)]
    policy: PurgePolicyArg,
    /// Restrict the purge to these artifact ids; defaults to every live artifact.
    #[arg(long, value_delimiter = ',')]
    artifact_ids: Vec<String>,
}

/// Arguments for `list-receipts`.
#[derive(Args, Debug)]
struct ListReceiptsCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArg,
    /// Root task id to list receipts under.
    #[arg(long)]
    task_id: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper; every failure path reduces to a single display string.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("depotgate {version}"))?;
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Stage(command) => command_stage(&command),
        Commands::StageList(command) => command_stage_list(&command),
        Commands::GetArtifact(command) => command_get_artifact(&command),
        Commands::GetContent(command) => command_get_content(&command),
        Commands::DeclareDeliverable(command) => command_declare_deliverable(&command),
        Commands::MarkRequirement(command) => command_mark_requirement(&command),
        Commands::CheckClosure(command) => command_check_closure(&command),
        Commands::Ship(command) => command_ship(&command),
        Commands::Purge(command) => command_purge(&command),
        Commands::ListReceipts(command) => command_list_receipts(&command),
    }
}

// ============================================================================
// SECTION: Composition Root
// ============================================================================

/// The synchronous service stack every subcommand shares, built once from config.
struct Backends {
    /// C3: pointer/deliverable metadata.
    metadata: Arc<dyn MetadataStore>,
    /// C1: staged byte storage.
    storage: Arc<dyn StorageBackend>,
    /// C4: append-only receipt log.
    receipts: Arc<dyn ReceiptStore>,
    /// C5: stages artifacts and lists live pointers.
    staging: Arc<StagingArea>,
    /// C6: declares deliverables and answers closure queries.
    deliverables: Arc<DeliverableManager>,
    /// C7: ships deliverables and purges staged bytes.
    shipping: Arc<ShippingService>,
}

/// Default timeout applied to the HTTP sink's outbound requests.
const HTTP_SINK_TIMEOUT: Duration = Duration::from_secs(30);

/// Loads config at `path` (or the default resolution order) and validates it.
fn load_config(path: Option<&Path>) -> CliResult<DepotGateConfig> {
    DepotGateConfig::load(path).map_err(|err| CliError::new(format!("loading config: {err}")))
}

/// Builds the sink registered for every scheme named in `config.enabled_sinks`.
fn build_sink(config: &DepotGateConfig) -> CliResult<Arc<dyn OutboundSink>> {
    let mut builder = CompositeSink::builder();
    for scheme in &config.enabled_sinks {
        match scheme.as_str() {
            "fs" => {
                let base = config
                    .sink_bases_by_scheme
                    .get("fs")
                    .ok_or_else(|| CliError::new("enabled_sinks includes \"fs\" but no base path is configured"))?;
                let sink = FsSink::new(base.clone()).map_err(|err| CliError::new(format!("building fs sink: {err}")))?;
                builder = builder.sink("fs", sink);
            }
            "http" | "https" => {
                let sink = HttpSink::new(HTTP_SINK_TIMEOUT).map_err(|err| CliError::new(format!("building http sink: {err}")))?;
                builder = builder.sink(scheme.clone(), sink);
            }
            other => return Err(CliError::new(format!("unrecognized sink scheme: {other}"))),
        }
    }
    Ok(Arc::new(builder.build()))
}

/// Builds the full service stack from a validated config.
fn build_backends(config: &DepotGateConfig) -> CliResult<Backends> {
    let storage: Arc<dyn StorageBackend> =
        Arc::new(FsStorageBackend::new(config.storage_base_path.clone()).map_err(|err| CliError::new(format!("opening storage: {err}")))?);
    let metadata_store =
        SqliteStore::open(PathBuf::from(&config.metadata_db_url)).map_err(|err| CliError::new(format!("opening metadata store: {err}")))?;
    let metadata: Arc<dyn MetadataStore> = Arc::new(metadata_store);
    let receipts_store =
        SqliteStore::open(PathBuf::from(&config.receipts_db_url)).map_err(|err| CliError::new(format!("opening receipt store: {err}")))?;
    let receipts: Arc<dyn ReceiptStore> = Arc::new(receipts_store);
    let sink = build_sink(config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let staging = Arc::new(StagingArea::new(
        storage.clone(),
        metadata.clone(),
        receipts.clone(),
        clock.clone(),
        config.max_artifact_bytes,
    ));
    let deliverables = Arc::new(DeliverableManager::new(metadata.clone(), clock.clone()));
    let shipping = Arc::new(ShippingService::new(storage.clone(), sink, metadata.clone(), receipts.clone(), clock));

    Ok(Backends {
        metadata,
        storage,
        receipts,
        staging,
        deliverables,
        shipping,
    })
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|err| CliError::new(format!("parsing bind address: {err}")))?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let backends = build_backends(&config)?;
    let state = AppState {
        tenant_id,
        staging: backends.staging,
        deliverables: backends.deliverables,
        shipping: backends.shipping,
        metadata: backends.metadata,
        storage: backends.storage,
        receipts: backends.receipts,
        metrics: Arc::new(depotgate_http::telemetry::NoopMetrics),
    };
    write_stderr_line(&format!("depotgate listening on {addr}"))?;
    depotgate_http::serve(state, addr).await.map_err(|err| CliError::new(format!("serving: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Direct Verb Commands
// ============================================================================

/// Parses a caller-declared role string into [`ArtifactRole`] against the
/// closed vocabulary fixed by `spec.md` §3.
fn parse_role(raw: &str) -> CliResult<ArtifactRole> {
    match raw {
        "final_output" => Ok(ArtifactRole::FinalOutput),
        "supporting" => Ok(ArtifactRole::Supporting),
        "plan" => Ok(ArtifactRole::Plan),
        "log" => Ok(ArtifactRole::Log),
        "other" => Ok(ArtifactRole::Other),
        other => Err(CliError::new(format!("unknown artifact role: {other}"))),
    }
}

/// Executes `stage`.
fn command_stage(command: &StageCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let task_id = RootTaskId::new(command.task_id.clone());
    let backends = build_backends(&config)?;
    let produced_by = command
        .produced_by_receipt_id
        .as_deref()
        .map(|raw| ReceiptId::parse(raw).ok_or_else(|| CliError::new(format!("invalid receipt id: {raw}"))))
        .transpose()?;
    let mut file = std::fs::File::open(&command.content).map_err(|err| CliError::new(format!("opening {}: {err}", command.content.display())))?;
    let pointer = backends
        .staging
        .stage(&tenant_id, &task_id, &mut file, command.mime_type.clone(), parse_role(&command.role)?, produced_by)
        .map_err(|err| CliError::new(err.to_string()))?;
    print_json(&pointer)
}

/// Executes `stage-list`.
fn command_stage_list(command: &StageListCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let task_id = RootTaskId::new(command.task_id.clone());
    let backends = build_backends(&config)?;
    let role = command.role.as_deref().map(parse_role).transpose()?;
    let pointers = backends.staging.list(&tenant_id, &task_id, role.as_ref()).map_err(|err| CliError::new(err.to_string()))?;
    print_json(&pointers)
}

/// Executes `get-artifact`.
fn command_get_artifact(command: &GetArtifactCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let artifact_id = ArtifactId::parse(&command.artifact_id).ok_or_else(|| CliError::new(format!("invalid artifact id: {}", command.artifact_id)))?;
    let backends = build_backends(&config)?;
    let pointer = backends.metadata.get_artifact(&tenant_id, artifact_id).map_err(|err| CliError::new(err.to_string()))?;
    print_json(&pointer)
}

/// Executes `get-content`.
fn command_get_content(command: &GetContentCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let artifact_id = ArtifactId::parse(&command.artifact_id).ok_or_else(|| CliError::new(format!("invalid artifact id: {}", command.artifact_id)))?;
    let backends = build_backends(&config)?;
    let pointer = backends.metadata.get_artifact(&tenant_id, artifact_id).map_err(|err| CliError::new(err.to_string()))?;
    let bytes = backends.storage.retrieve(&pointer.location).map_err(|err| CliError::new(err.to_string()))?;
    match &command.output {
        Some(path) => std::fs::write(path, bytes).map_err(|err| CliError::new(format!("writing {}: {err}", path.display())))?,
        None => write_stdout_bytes(&bytes)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `declare-deliverable`.
fn command_declare_deliverable(command: &DeclareDeliverableCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let task_id = RootTaskId::new(command.task_id.clone());
    let spec: DeliverableSpec = read_json_file(&command.spec)?;
    let backends = build_backends(&config)?;
    let deliverable_id = backends.deliverables.declare(&tenant_id, &task_id, spec).map_err(|err| CliError::new(err.to_string()))?;
    print_json(&deliverable_id.to_string())
}

/// Executes `mark-requirement`.
fn command_mark_requirement(command: &MarkRequirementCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let deliverable_id = parse_deliverable_id(&command.deliverable_id)?;
    let backends = build_backends(&config)?;
    let contract = backends
        .deliverables
        .mark_requirement(&tenant_id, deliverable_id, command.requirement.clone())
        .map_err(|err| CliError::new(err.to_string()))?;
    print_json(&contract)
}

/// Executes `check-closure`.
fn command_check_closure(command: &CheckClosureCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let deliverable_id = parse_deliverable_id(&command.deliverable_id)?;
    let backends = build_backends(&config)?;
    let report = backends.deliverables.check_closure(&tenant_id, deliverable_id).map_err(|err| CliError::new(err.to_string()))?;
    print_json(&report)
}

/// Executes `ship`.
fn command_ship(command: &ShipCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let deliverable_id = parse_deliverable_id(&command.deliverable_id)?;
    let backends = build_backends(&config)?;
    let manifest = backends.shipping.ship(&tenant_id, deliverable_id).map_err(|err| CliError::new(err.to_string()))?;
    print_json(&manifest)
}

/// Executes `purge`.
fn command_purge(command: &PurgeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let task_id = RootTaskId::new(command.task_id.clone());
    let artifact_ids = if command.artifact_ids.is_empty() {
        None
    } else {
        Some(
            command
                .artifact_ids
                .iter()
                .map(|raw| ArtifactId::parse(raw).ok_or_else(|| CliError::new(format!("invalid artifact id: {raw}"))))
                .collect::<CliResult<Vec<_>>>()?,
        )
    };
    let backends = build_backends(&config)?;
    let receipt = backends
        .shipping
        .purge(&tenant_id, &task_id, command.policy.into(), artifact_ids)
        .map_err(|err| CliError::new(err.to_string()))?;
    print_json(&receipt)
}

/// Executes `list-receipts`.
fn command_list_receipts(command: &ListReceiptsCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let tenant_id = TenantId::new(config.tenant_id.clone());
    let task_id = RootTaskId::new(command.task_id.clone());
    let backends = build_backends(&config)?;
    let receipts = backends.receipts.list(&tenant_id, &task_id, None).map_err(|err| CliError::new(err.to_string()))?;
    print_json(&receipts)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a deliverable id, wrapping a parse failure as a [`CliError`].
fn parse_deliverable_id(raw: &str) -> CliResult<DeliverableId> {
    DeliverableId::parse(raw).ok_or_else(|| CliError::new(format!("invalid deliverable id: {raw}")))
}

/// Reads and deserializes `path` as JSON.
fn read_json_file<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let mut raw = String::new();
    std::fs::File::open(path)
        .and_then(|mut file| file.read_to_string(&mut raw))
        .map_err(|err| CliError::new(format!("reading {}: {err}", path.display())))?;
    serde_json::from_str(&raw).map_err(|err| CliError::new(format!("parsing {}: {err}", path.display())))
}

/// Serializes `value` as pretty JSON and writes it to stdout.
fn print_json<T: serde::Serialize>(value: &T) -> CliResult<ExitCode> {
    let rendered = serde_json::to_string_pretty(value).map_err(|err| CliError::new(format!("serializing output: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(format!("writing stdout: {err}")))
}

/// Writes raw bytes to stdout with no trailing newline.
fn write_stdout_bytes(bytes: &[u8]) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes).map_err(|err| CliError::new(format!("writing stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}").map_err(|err| CliError::new(format!("writing stderr: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
