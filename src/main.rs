use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use portfolio_messages::config::Settings;
use portfolio_messages::messages::{LoadOutcome, MessageEntry, MessageKind, ResolvedMessage};
use portfolio_messages::mode::Mode;
use portfolio_messages::MessageCenter;

#[derive(Parser)]
#[command(name = "portfolio-messages")]
#[command(version = "0.1.0")]
#[command(about = "Inspect and administer the portfolio tracker's notification messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or switch the MOCK/API mode
    Mode {
        #[command(subcommand)]
        action: Option<ModeAction>,
    },
    /// Work with the message catalog
    Messages {
        #[command(subcommand)]
        action: MessageAction,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum ModeAction {
    /// Print the current mode
    Show,
    /// Switch to MOCK mode
    Mock,
    /// Probe the backend and switch to API mode
    Api,
}

#[derive(Subcommand)]
enum MessageAction {
    /// List cached catalog entries (loads the catalog first)
    List,
    /// Fetch the catalog now, ignoring the cache age
    Refresh,
    /// Drop the persisted catalog and load again
    Reload,
    /// Resolve a code the way screens do
    Resolve {
        code: String,
        /// Resolve as an alert instead of a toast
        #[arg(long)]
        alert: bool,
    },
    /// Create or update a catalog entry
    Put {
        code: String,
        #[arg(short, long, value_enum, default_value = "toast")]
        kind: KindArg,
        /// Message text; `\n` separates title and description
        #[arg(short, long)]
        text: String,
    },
    /// Delete a catalog entry
    Delete { code: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Toast,
    Alert,
}

impl From<KindArg> for MessageKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Toast => MessageKind::Toast,
            KindArg::Alert => MessageKind::Alert,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = Settings::load(cli.config.as_deref())?;

    if let Commands::Config = cli.command {
        println!("{}", settings.to_toml()?);
        return Ok(());
    }

    let center = MessageCenter::open(&settings)?;
    info!("Mode: {}", center.mode.get_mode());

    match cli.command {
        Commands::Mode { action } => run_mode(&center, action.unwrap_or(ModeAction::Show)).await?,
        Commands::Messages { action } => run_messages(&center, action).await?,
        Commands::Config => {}
    }

    Ok(())
}

async fn run_mode(center: &MessageCenter, action: ModeAction) -> Result<()> {
    let notice = match action {
        ModeAction::Show => {
            println!("{}", center.mode.get_mode());
            return Ok(());
        }
        ModeAction::Mock => center.switch_mode(Mode::Mock).await,
        ModeAction::Api => center.switch_mode(Mode::Api).await,
    };

    print_resolved(&center.resolve(notice, MessageKind::Toast));
    println!("Mode: {}", center.mode.get_mode());
    Ok(())
}

async fn run_messages(center: &MessageCenter, action: MessageAction) -> Result<()> {
    match action {
        MessageAction::List => {
            report_outcome(center.cache.load().await);
            list_entries(center);
        }
        MessageAction::Refresh => {
            let outcome = center.cache.force_refresh().await;
            report_outcome(outcome);
            let notice = match outcome {
                LoadOutcome::Fetched { .. } => "CATALOG_REFRESHED",
                LoadOutcome::Skipped => "MOCK_MODE_WARNING",
                _ => "CATALOG_REFRESH_FAILED",
            };
            print_resolved(&center.resolve(notice, MessageKind::Toast));
        }
        MessageAction::Reload => {
            report_outcome(center.cache.reload().await);
            list_entries(center);
        }
        MessageAction::Resolve { code, alert } => {
            center.start().await;
            let kind = if alert { MessageKind::Alert } else { MessageKind::Toast };
            print_resolved(&center.resolve(&code, kind));
        }
        MessageAction::Put { code, kind, text } => {
            let entry = MessageEntry::new(code, kind.into(), text.replace("\\n", "\n"));
            match center.editor.save(entry).await {
                Ok(outcome) => print_resolved(&center.resolve(outcome.saved_notice(), MessageKind::Toast)),
                Err(e) => {
                    error!("Save failed: {}", e);
                    return Err(anyhow!(e));
                }
            }
        }
        MessageAction::Delete { code } => match center.editor.delete(&code).await {
            Ok(outcome) => print_resolved(&center.resolve(outcome.deleted_notice(), MessageKind::Toast)),
            Err(e) => {
                error!("Delete failed: {}", e);
                return Err(anyhow!(e));
            }
        },
    }
    Ok(())
}

fn report_outcome(outcome: LoadOutcome) {
    match outcome {
        LoadOutcome::Skipped => warn!("MOCK mode: backend catalog is not used"),
        LoadOutcome::FromStorage { count } => info!("Catalog from local cache: {} entries", count),
        LoadOutcome::Fetched { count } => info!("Catalog fetched: {} entries", count),
        LoadOutcome::StaleFallback { count } => warn!("Backend unreachable, using expired cache: {} entries", count),
        LoadOutcome::Unavailable => warn!("Backend unreachable and no cached catalog"),
    }
}

fn list_entries(center: &MessageCenter) {
    let entries = center.cache.entries();
    println!("\n=== Message Catalog ({} entries) ===", entries.len());
    if let Some(fetched_at) = center.cache.fetched_at() {
        println!("Fetched at: {}", fetched_at.to_rfc3339());
    }
    for entry in entries {
        println!("{:<32} {:<6} {}", entry.code, entry.kind, entry.text.replace('\n', " | "));
    }
}

fn print_resolved(message: &ResolvedMessage) {
    match message {
        ResolvedMessage::Toast(toast) => {
            match toast.severity {
                Some(severity) => println!("[{:?}] {}", severity, toast.title),
                None => println!("{}", toast.title),
            }
            if let Some(description) = &toast.description {
                println!("  {}", description.replace('\n', "\n  "));
            }
        }
        ResolvedMessage::Alert { body_text } => println!("{}", body_text),
    }
}
