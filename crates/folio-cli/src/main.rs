//! CLI binary for running Folio over a remote content store.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use folio_engine::{
    EngineOptions, FolioConfig, LoggingDelegate, Profile, RunSession, TraversalEngine,
    UserRegistry,
};
use folio_manifest::Severity;
use folio_store::{LocalStore, RcloneStore, RemoteStore};

#[derive(Parser)]
#[command(name = "folio", version, about = "Manifest-driven folder-command interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "folio.toml")]
    config: PathBuf,

    /// Configuration profile (default: $USER)
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Prefix of the top folder's manifest name (default: $FOLIO_USER_PREFIX)
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StoreKind {
    Rclone,
    Local,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the content tree from the configured top folder
    Run {
        /// Remote store backend
        #[arg(long, value_enum, default_value = "rclone")]
        store: StoreKind,

        /// Root directory served as the store when using `--store local`
        #[arg(long)]
        local_root: Option<PathBuf>,

        /// Log content work and skip local file transfers
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a local manifest file
    Validate {
        /// Path to the manifest file
        file: PathBuf,
    },

    /// List the operators known to the system
    Users {
        /// Remote store backend
        #[arg(long, value_enum, default_value = "rclone")]
        store: StoreKind,

        /// Root directory served as the store when using `--store local`
        #[arg(long)]
        local_root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let code = match &cli.command {
        Commands::Run {
            store,
            local_root,
            dry_run,
            json,
        } => {
            cmd_run(&cli, *store, local_root.as_deref(), *dry_run, *json).await?
        }
        Commands::Validate { file } => {
            init_logging(cli.verbose, None)?;
            cmd_validate(file)?
        }
        Commands::Users { store, local_root } => {
            init_logging(cli.verbose, None)?;
            cmd_users(&cli, *store, local_root.as_deref()).await?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Console logging, plus a plain-text run log in `logs_dir` when given.
/// Returns the run log path.
fn init_logging(verbose: bool, logs_dir: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    let filter = if verbose { "debug" } else { "info" };
    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = logs_dir else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(filter))
            .with(console)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    let path = dir.join(format!(
        "folio-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(console)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(Some(path))
}

fn load_profile(cli: &Cli) -> anyhow::Result<(FolioConfig, Profile)> {
    let config = FolioConfig::load(&cli.config)?;
    let name = cli
        .profile
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .ok_or_else(|| anyhow!("no profile given and USER is not set"))?;
    let profile = config.profile(&name)?.clone();
    Ok((config, profile))
}

fn build_store(
    kind: StoreKind,
    local_root: Option<&Path>,
    config: &FolioConfig,
) -> anyhow::Result<Arc<dyn RemoteStore>> {
    match kind {
        StoreKind::Rclone => Ok(Arc::new(RcloneStore::new(config.remote.name.clone()))),
        StoreKind::Local => {
            let root = local_root.ok_or_else(|| anyhow!("--store local requires --local-root"))?;
            Ok(Arc::new(LocalStore::new(root)))
        }
    }
}

async fn load_users(
    store: &dyn RemoteStore,
    config: &FolioConfig,
    profile: &Profile,
) -> anyhow::Result<UserRegistry> {
    std::fs::create_dir_all(&profile.temp_directory)?;
    let scratch = tempfile::Builder::new()
        .prefix("users")
        .tempdir_in(&profile.temp_directory)?;
    let users = UserRegistry::load(store, &config.users_folder(), scratch.path()).await?;
    Ok(users)
}

async fn cmd_run(
    cli: &Cli,
    kind: StoreKind,
    local_root: Option<&Path>,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let (config, profile) = load_profile(cli)?;
    let log_path = init_logging(cli.verbose, Some(&profile.logs_directory))?;
    if let Some(ref path) = log_path {
        tracing::debug!(path = %path.display(), "run log opened");
    }
    let store = build_store(kind, local_root, &config)?;
    let users = load_users(store.as_ref(), &config, &profile).await?;

    let command_prefix = cli
        .prefix
        .clone()
        .or_else(|| std::env::var("FOLIO_USER_PREFIX").ok())
        .or_else(|| config.run.command_prefix.clone())
        .unwrap_or_default();
    let options = EngineOptions {
        command_prefix,
        scratch_root: profile.temp_directory.clone(),
        support_directory: profile.support_directory.clone(),
        outputs: profile.output_paths(),
        dry_run: dry_run || config.run.dry_run,
    };
    let engine = TraversalEngine::new(store, users, Arc::new(LoggingDelegate), options)?;

    let mut session = RunSession::new(config.top_folder());
    let report = engine.run(&mut session).await;
    // Removes the engine's scratch directories before the exit status is returned.
    drop(engine);
    let report_path = report.save(&profile.logs_directory).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
        for failure in &report.failures {
            println!("  FAILED {}: {}", failure.folder, failure.error);
        }
        if let Some(ref error) = report.error {
            println!("  ABORTED: {error}");
        }
        println!("Report: {}", report_path.display());
        if let Some(ref path) = log_path {
            println!("Log: {}", path.display());
        }
        let recipients = session.identity.log_recipients();
        if !recipients.is_empty() {
            println!("Log requested by:");
            for user in recipients {
                println!("  {} <{}>", user.name, user.email_address);
            }
        }
    }

    Ok(exit_code(report.is_success()))
}

fn cmd_validate(path: &Path) -> anyhow::Result<ExitCode> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let validation = folio_manifest::validate_text(&source);

    for diag in &validation.diagnostics {
        let severity = match diag.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        println!("[{}] {}: {}", severity, diag.rule, diag);
    }
    if validation.has_errors() {
        return Ok(ExitCode::FAILURE);
    }

    match folio_manifest::parse(&source, &path.display().to_string()) {
        Ok(manifest) => {
            println!(
                "Manifest is valid: command_set {} with {} command(s)",
                manifest.command_set,
                manifest.commands.len()
            );
            for name in manifest.command_names() {
                println!("  {name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("[ERROR] {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn cmd_users(cli: &Cli, kind: StoreKind, local_root: Option<&Path>) -> anyhow::Result<()> {
    let (config, profile) = load_profile(cli)?;
    let store = build_store(kind, local_root, &config)?;
    let users = load_users(store.as_ref(), &config, &profile).await?;

    if users.users().is_empty() {
        println!("No users defined");
        return Ok(());
    }
    for user in users.users() {
        let mut flags = Vec::new();
        if user.is_admin {
            flags.push("admin");
        }
        if user.mail_logs {
            flags.push("mail-logs");
        }
        println!(
            "{:<16} {:<32} {}",
            user.name,
            user.email_address,
            flags.join(",")
        );
    }
    Ok(())
}
