//! WolfHA - High-Availability Replication Setup Manager
//!
//! Usage:
//!   wolfha show            - Show the HA configuration of this platform
//!   wolfha generate-key    - Generate a shared cluster key
//!   wolfha setup ...       - Create or edit the HA replication configuration
//!   wolfha init            - Write a default configuration file
//!   wolfha check-config    - Validate a configuration file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wolfha::api::{HaApi, HttpHaApi};
use wolfha::cache::StaleQueries;
use wolfha::config::WolfHaConfig;
use wolfha::form::{FormDefaults, FormField, FormMode, FormStateManager};
use wolfha::model::InstanceType;
use wolfha::notify::{ConsoleSink, NotificationSink, Severity};
use wolfha::workflow::{HaView, SubmitOutcome, WorkflowOrchestrator};

/// WolfHA - High-Availability Replication Setup Manager
#[derive(Parser)]
#[command(name = "wolfha")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/wolfha/config.toml")]
    config: PathBuf,

    /// Platform API endpoint (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error; overrides config)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the HA replication configuration
    Show,

    /// Generate a new shared cluster key
    GenerateKey,

    /// Create the HA replication configuration, or edit its schedule
    Setup(SetupArgs),

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "wolfha.toml")]
        output: PathBuf,
    },

    /// Check configuration file for errors
    CheckConfig {
        /// Path to config file to check (defaults to --config path)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SetupArgs {
    /// Role of this instance (Active or Standby)
    #[arg(long = "type")]
    instance_type: Option<InstanceType>,

    /// Address other instances reach this one on (http:// or https://)
    #[arg(long)]
    address: Option<String>,

    /// Shared authentication key (generated on the active instance)
    #[arg(long, conflicts_with = "generate_key")]
    key: Option<String>,

    /// Generate a new shared key (Active instances only)
    #[arg(long)]
    generate_key: bool,

    /// Replication frequency in minutes
    #[arg(long)]
    frequency: Option<String>,

    /// Enable periodic replication
    #[arg(long, conflicts_with = "disable")]
    enable: bool,

    /// Disable periodic replication
    #[arg(long)]
    disable: bool,

    /// Show the resulting form without submitting it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Checking a config must not depend on loading it
    if let Commands::CheckConfig { file } = &cli.command {
        let path = file.as_deref().unwrap_or(&cli.config);
        if run_check_config(path).is_err() {
            std::process::exit(1);
        }
        return;
    }

    let config = match load_config(&cli.config, cli.endpoint.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let level = cli.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, &config.logging.format);

    let result = match cli.command {
        Commands::Show => run_show(&config).await,
        Commands::GenerateKey => run_generate_key(&config).await,
        Commands::Setup(args) => run_setup(&config, args).await,
        Commands::Init { output } => run_init(&output, &config),
        Commands::CheckConfig { .. } => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Load the config file if present, then apply the endpoint override
fn load_config(path: &Path, endpoint: Option<&str>) -> anyhow::Result<WolfHaConfig> {
    let mut config = if path.exists() {
        WolfHaConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?
    } else {
        WolfHaConfig::default()
    };

    if let Some(endpoint) = endpoint {
        config.api.endpoint = endpoint.to_string();
        config.validate()?;
    }

    Ok(config)
}

fn build_orchestrator(
    config: &WolfHaConfig,
) -> anyhow::Result<(WorkflowOrchestrator, Arc<ConsoleSink>, Arc<StaleQueries>)> {
    let api = Arc::new(HttpHaApi::new(config)?);
    let sink = Arc::new(ConsoleSink::new(true));
    let cache = Arc::new(StaleQueries::new());
    let orchestrator = WorkflowOrchestrator::new(api, sink.clone(), cache.clone());
    Ok((orchestrator, sink, cache))
}

// ============ Commands ============

async fn run_show(config: &WolfHaConfig) -> anyhow::Result<()> {
    let (orchestrator, _, _) = build_orchestrator(config)?;
    let view = orchestrator.fetch_view().await?;
    print_view(&view);
    Ok(())
}

async fn run_generate_key(config: &WolfHaConfig) -> anyhow::Result<()> {
    let api = HttpHaApi::new(config)?;
    let key = api.generate_key().await?;
    println!("{}", key);
    Ok(())
}

async fn run_setup(config: &WolfHaConfig, args: SetupArgs) -> anyhow::Result<()> {
    let (orchestrator, sink, cache) = build_orchestrator(config)?;
    let defaults = FormDefaults::from(config);

    let mut form = orchestrator.open_form(&defaults).await?;
    tracing::info!("Opened HA replication form in {} mode", form.mode());

    if let Some(instance_type) = args.instance_type {
        form.set_field(FormField::InstanceType, &instance_type.to_string())?;
    }
    if let Some(address) = &args.address {
        form.set_field(FormField::InstanceAddress, address)?;
    }
    if let Some(key) = &args.key {
        if let Err(e) = form.enter_cluster_key(key) {
            if matches!(e, wolfha::Error::GeneratedKeyRequired) {
                bail!("{}; use --generate-key instead of --key", e);
            }
            return Err(e.into());
        }
    }
    if let Some(frequency) = &args.frequency {
        form.set_field(FormField::ReplicationFrequency, frequency)?;
    }
    if args.enable {
        form.set_field(FormField::ReplicationEnabled, "true")?;
    }
    if args.disable {
        form.set_field(FormField::ReplicationEnabled, "false")?;
    }
    if args.generate_key {
        orchestrator.generate_key(&mut form).await?;
    }

    if let Some(notice) = form.standby_notice() {
        sink.notify(Severity::Warning, notice);
    }
    print_form(&form);

    if args.dry_run {
        if form.mode() == FormMode::Edit {
            form.cancel()?;
            println!("Changes discarded, configuration left as is");
        } else {
            println!("Dry run, nothing submitted");
        }
        return Ok(());
    }

    match orchestrator.submit(&mut form).await? {
        SubmitOutcome::Succeeded { config_id } => {
            tracing::debug!("Configuration {} updated", config_id);
            if !cache.take_stale().is_empty() {
                let view = orchestrator.fetch_view().await?;
                print_view(&view);
            }
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            println!();
            for (field, message) in &errors {
                println!("\x1b[1;31m✗\x1b[0m {}: {}", field, message);
            }
            bail!("form has {} invalid field(s)", errors.len())
        }
        SubmitOutcome::Failed => bail!("replication configuration was not applied"),
    }
}

fn run_init(output: &Path, config: &WolfHaConfig) -> anyhow::Result<()> {
    let config_content = format!(
        r#"# WolfHA Configuration
# Generated configuration file

[api]
endpoint = "{endpoint}"
# api_token = "your-api-token"
request_timeout_secs = 30

[form]
# default_instance_address = "https://this-platform.example.com"
default_replication_frequency_minutes = 1
default_replication_enabled = true

[logging]
level = "info"
format = "pretty"
"#,
        endpoint = config.endpoint()
    );

    std::fs::write(output, config_content)?;
    println!("Configuration file created: {}", output.display());
    println!("Then run: wolfha --config {} setup --type active --generate-key", output.display());

    Ok(())
}

fn run_check_config(path: &Path) -> anyhow::Result<()> {
    match WolfHaConfig::from_file(path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Endpoint:         {}", config.endpoint());
            println!("  API token:        {}", if config.api.api_token.is_some() { "set" } else { "not set" });
            println!("  Instance address: {}", config.default_instance_address());
            println!("  Frequency:        {} minute(s)", config.form.default_replication_frequency_minutes);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            Err(e.into())
        }
    }
}

// ============ Output ============

fn print_form(form: &FormStateManager) {
    let values = form.values();
    let action = match form.mode() {
        FormMode::Create => "Create",
        FormMode::Edit => "Save",
    };

    println!();
    println!("HA Replication Configuration ({})", action);
    println!("==================================");
    println!("Instance Type:      {}", values.instance_type);
    println!("Address:            {}", values.instance_address);
    println!("Shared Key:         {}", if values.cluster_key.is_empty() { "(none)" } else { values.cluster_key.as_str() });
    if values.instance_type == InstanceType::Active {
        println!("Frequency:          {} minute(s)", values.frequency_label());
        println!("Replication:        {}", if values.replication_enabled { "enabled" } else { "disabled" });
    }
    println!();
}

fn print_view(view: &HaView) {
    let Some(config) = &view.config else {
        println!("High availability is not configured on this platform");
        return;
    };

    println!();
    println!("HA Configuration {}", config.uuid);
    println!("========================================");
    match &view.schedule {
        Some(s) => println!(
            "Replication: {} every {} minute(s)",
            if s.is_running { "\x1b[32mRUNNING\x1b[0m" } else { "\x1b[33mSTOPPED\x1b[0m" },
            wolfha::form::format_minutes(s.frequency_milliseconds)
        ),
        None => println!("Replication: not scheduled"),
    }
    println!();

    println!("{:<40} {:<10} {:<7} {:<25}", "ADDRESS", "ROLE", "LOCAL", "LAST BACKUP");
    println!("{}", "-".repeat(82));
    for instance in &config.instances {
        let last_backup = instance
            .last_backup
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<40} {:<10} {:<7} {:<25}",
            instance.address,
            instance.instance_type().to_string(),
            if instance.is_local { "yes" } else { "" },
            last_backup
        );
    }
    if config.local_instance().is_none() {
        println!();
        println!("\x1b[1;31m✗\x1b[0m Can't find an HA platform instance with is_local = true");
    }
    println!();
}
