mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use prepkit_call::{CallAgent, CallStatus, CallView, ChannelNavigator, VapiClient};
use prepkit_core::config::Config;
use prepkit_core::interview_store::{InterviewStore, JsonlInterviewStore, MemoryInterviewStore};
use prepkit_core::types::InterviewParams;
use prepkit_gateway::GatewayState;
use prepkit_providers::GeminiProvider;

#[derive(Parser)]
#[command(
    name = "prepkit",
    about = "Mock interview backend: question generation and voice calls",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to listen on (default: 3000)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate and store one interview
    Generate {
        #[arg(long)]
        role: String,

        /// Interview type, e.g. technical, behavioural, mixed
        #[arg(long = "type", default_value = "mixed")]
        interview_type: String,

        #[arg(long)]
        level: String,

        /// Comma-separated tech stack
        #[arg(long)]
        techstack: String,

        #[arg(long, default_value_t = 5)]
        amount: u32,

        #[arg(long = "userid")]
        user_id: String,

        /// Print the record without writing it to the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a voice interview call until it ends or Ctrl-C
    Call {
        /// Name shown on the candidate card
        #[arg(long, default_value = "You")]
        user_name: String,
    },

    /// Stored interview records
    Interviews {
        #[command(subcommand)]
        action: InterviewAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show configuration status
    Status,
}

#[derive(Subcommand)]
enum InterviewAction {
    /// List stored interviews
    List,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get a config value by dotted path
    Get { key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(Config::config_path);
    let config = Config::load(&config_path)?;

    logging::init(&config.logging.clone().unwrap_or_default(), cli.verbose)?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config.gateway_port());
            check_config(&config)?;
            let state = gateway_state(config, false)?;
            tracing::info!(
                provider = state.provider.id(),
                model = %state.config.model(),
                "Starting PrepKit gateway on port {port}"
            );
            prepkit_gateway::start_gateway(Arc::new(state), port).await?;
        }
        Commands::Generate {
            role,
            interview_type,
            level,
            techstack,
            amount,
            user_id,
            dry_run,
        } => {
            let params = InterviewParams {
                interview_type,
                role,
                level,
                techstack,
                amount,
                user_id,
            };
            let state = gateway_state(config, dry_run)?;
            let stored = prepkit_gateway::generate::generate_interview(&state, &params).await?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        Commands::Call { user_name } => run_call(&config, &user_name).await?,
        Commands::Interviews { action } => match action {
            InterviewAction::List => {
                let store = JsonlInterviewStore::new(config.storage_dir(), config.collection());
                let interviews = store.list().await?;
                if interviews.is_empty() {
                    println!("No interviews stored.");
                }
                for stored in interviews {
                    let i = &stored.interview;
                    println!(
                        "{}  {}  {} {} ({})  {} questions  [{}]",
                        stored.id,
                        i.created_at.format("%Y-%m-%d %H:%M"),
                        i.level,
                        i.role,
                        i.interview_type,
                        i.questions.len(),
                        i.techstack.join(", "),
                    );
                }
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&config)?;
                println!("{json}");
            }
            ConfigAction::Get { key } => match config.get_path(&key) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => anyhow::bail!("No config value at {key:?}"),
            },
        },
        Commands::Status => {
            println!("PrepKit v{}", env!("CARGO_PKG_VERSION"));
            println!("Config: {}", config_path.display());
            println!("Gateway: {}:{}", config.gateway_bind(), config.gateway_port());
            println!("Model: {}", config.model());
            println!(
                "Store: {}",
                config
                    .storage_dir()
                    .join(format!("{}.jsonl", config.collection()))
                    .display()
            );
            let (warnings, errors) = config.validate();
            for w in &warnings {
                println!("warning: {w}");
            }
            for e in &errors {
                println!("error: {e}");
            }
        }
    }

    Ok(())
}

/// Log config warnings; refuse to continue on errors.
fn check_config(config: &Config) -> anyhow::Result<()> {
    let (warnings, errors) = config.validate();
    for w in &warnings {
        tracing::warn!("{w}");
    }
    if !errors.is_empty() {
        anyhow::bail!("Invalid configuration: {}", errors.join("; "));
    }
    Ok(())
}

fn gateway_state(config: Config, in_memory: bool) -> anyhow::Result<GatewayState> {
    let provider = Arc::new(GeminiProvider::new(config.generation().base_url.as_deref()));
    let store: Arc<dyn InterviewStore> = if in_memory {
        Arc::new(MemoryInterviewStore::new())
    } else {
        Arc::new(JsonlInterviewStore::new(
            config.storage_dir(),
            config.collection(),
        ))
    };

    let state = GatewayState::from_config(Arc::new(config), provider, store);

    #[cfg(feature = "metrics")]
    let state = state.with_metrics(prepkit_gateway::metrics::install_prometheus_recorder()?);

    Ok(state)
}

async fn run_call(config: &Config, user_name: &str) -> anyhow::Result<()> {
    let voice = config.voice();
    let public_key = voice
        .resolve_public_key()
        .ok_or_else(|| anyhow::anyhow!("No voice public key configured"))?;

    let client = Arc::new(VapiClient::new(public_key, voice.base_url.as_deref()));
    let (navigator, mut routes) = ChannelNavigator::channel();
    let agent = CallAgent::mount(client, Arc::new(navigator), voice.resolve_assistant_id());
    let mut updates = agent.watch();

    print_view(&agent.view(user_name));
    agent.start().await;
    if agent.status() == CallStatus::Inactive {
        print_view(&agent.view(user_name));
        agent.unmount().await;
        anyhow::bail!("Call did not start");
    }

    let mut last = agent.view(user_name);
    print_view(&last);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = agent.view(user_name);
                if view != last {
                    print_view(&view);
                    last = view;
                }
            }
            route = routes.recv() => {
                if let Some(route) = route {
                    println!("Call finished, returning to {route}");
                }
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                agent.stop().await;
            }
        }
    }

    agent.unmount().await;
    Ok(())
}

fn print_view(view: &CallView) {
    let speaking = if view.is_speaking { " (speaking)" } else { "" };
    println!(
        "[{:?}] AI Interviewer{speaking} | {} | button: {}",
        view.status, view.user_name, view.button
    );
    if let Some(line) = &view.transcript {
        println!("    {line}");
    }
}
