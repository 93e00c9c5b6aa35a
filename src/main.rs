//! streamchat CLI: streaming chat, model listing, chat history and settings.
//!
//! Usage:
//!   streamchat chat <message>      Send a message in the current chat
//!   streamchat models              List available models
//!   streamchat chats list          List saved chats
//!   streamchat config show         Show current settings

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use streamchat::models::chat::ChatMessage;
use streamchat::services::chat::{ChatService, SendOverrides};
use streamchat::storage::{ChatStore, ConfigService, CredentialStore};
use streamchat::SettingsUpdate;
use streamchat_core::proxy::ProxyConfig;
use streamchat_core::streaming::StreamEvent;
use streamchat_llm::{build_http_client, ModelInfo, ProviderIdentity, ReqwestTransport, TurnRole};

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Parser)]
#[command(
    name = "streamchat",
    version,
    about = "Streaming chat client for OpenAI, Groq, Gemini, Ollama and LM Studio"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message and stream the reply
    Chat {
        /// Provider to use for this message (overrides config)
        #[arg(short, long)]
        provider: Option<ProviderIdentity>,

        /// Model to use for this message (overrides config)
        #[arg(short, long)]
        model: Option<String>,

        /// Augment the message with web search results
        #[arg(short, long)]
        search: bool,

        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// List available models
    Models {
        /// Only list models of this provider
        #[arg(short, long)]
        provider: Option<ProviderIdentity>,

        /// Bypass the discovery cache
        #[arg(short, long)]
        refresh: bool,
    },

    /// Manage saved chats
    Chats {
        #[command(subcommand)]
        action: ChatCommands,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ChatCommands {
    /// List all chats
    List,
    /// Start a new chat
    New,
    /// Switch the current chat
    Switch {
        /// Chat ID
        id: String,
    },
    /// Delete a chat
    Delete {
        /// Chat ID
        id: String,
    },
    /// Print the current chat
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print settings and configured keys
    Show,
    /// Store an API key (openai, groq, gemini, tavily); empty removes it
    SetKey { name: String, value: String },
    /// Select the provider, auto-selecting a model it offers
    SetProvider { provider: ProviderIdentity },
    /// Select the model
    SetModel { model: String },
    /// Turn web search on or off
    Search { state: Toggle },
    /// Override a provider's API root; empty restores the default
    SetBaseUrl { provider: ProviderIdentity, url: String },
    /// Route requests through a proxy, e.g. socks5://127.0.0.1:1080
    SetProxy { url: String },
    /// Stop using a proxy
    ClearProxy,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let service = open_service()?;

    match cli.command {
        Commands::Chat {
            provider,
            model,
            search,
            message,
        } => {
            let overrides = SendOverrides {
                provider,
                model,
                search: search.then_some(true),
            };
            cmd_chat(&service, &message.join(" "), &overrides).await?
        }
        Commands::Models { provider, refresh } => cmd_models(&service, provider, refresh).await,
        Commands::Chats { action } => cmd_chats(&service, action).await?,
        Commands::Config { action } => cmd_config(&service, action).await?,
    }

    Ok(())
}

fn open_service() -> Result<ChatService> {
    let config = ConfigService::new()?;
    let proxy = config
        .get_config()
        .proxy
        .clone()
        .map(ProxyConfig::with_password_from_env);
    let client = build_http_client(proxy.as_ref())?;

    Ok(ChatService::from_parts(
        ChatStore::new()?,
        CredentialStore::new()?,
        config,
        Arc::new(ReqwestTransport::new(client)),
    ))
}

// ── Chat Command ────────────────────────────────────────────────────

async fn cmd_chat(service: &ChatService, message: &str, overrides: &SendOverrides) -> Result<()> {
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let mut console = ConsoleSink::new(io::stdout(), io::stderr());
    let outcome = service
        .send_message_with(message, overrides, &cancel, |event| console.write_event(event))
        .await;
    console.end_reasoning();

    match outcome {
        Ok(outcome) => {
            println!();
            if let Some(artifact) = &outcome.artifact {
                eprintln!("[artifact] {} ({}) id={}", artifact.title, artifact.kind, artifact.id);
            }
            if outcome.result.has_reasoning() {
                eprintln!(
                    "{}[thought for {:.1}s, {} reasoning tokens]{}",
                    DIM,
                    outcome.result.elapsed_ms as f64 / 1000.0,
                    outcome.result.reasoning_tokens,
                    RESET
                );
            }
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("\n[cancelled]");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Streams reasoning dimmed to one writer and the answer to another.
struct ConsoleSink<O: Write, E: Write> {
    out: O,
    err: E,
    in_reasoning: bool,
}

impl<O: Write, E: Write> ConsoleSink<O, E> {
    fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            in_reasoning: false,
        }
    }

    /// Usage-only events carry no text and leave the output untouched.
    fn write_event(&mut self, event: &StreamEvent) {
        if !event.is_fragment() {
            return;
        }
        if event.is_reasoning {
            if !self.in_reasoning {
                let _ = write!(self.err, "{}", DIM);
                self.in_reasoning = true;
            }
            let _ = write!(self.err, "{}", event.text);
            let _ = self.err.flush();
        } else {
            self.end_reasoning();
            let _ = write!(self.out, "{}", event.text);
            let _ = self.out.flush();
        }
    }

    fn end_reasoning(&mut self) {
        if self.in_reasoning {
            let _ = writeln!(self.err, "{}", RESET);
            let _ = self.err.flush();
            self.in_reasoning = false;
        }
    }
}

// ── Models Command ──────────────────────────────────────────────────

async fn cmd_models(service: &ChatService, provider: Option<ProviderIdentity>, refresh: bool) {
    let models = match (provider, refresh) {
        (_, true) => service.refresh_models(provider).await,
        (Some(p), false) => service.list_models(p).await,
        (None, false) => service.all_models().await,
    };

    if models.is_empty() {
        println!("No models available. Check API keys with `streamchat config show`.");
        return;
    }
    for model in &models {
        println!("{}", describe_model(model));
    }
}

fn describe_model(model: &ModelInfo) -> String {
    let mut line = format!("{:<10} {}", model.provider.as_str(), model.id);
    if model.name != model.id {
        line.push_str(&format!("  ({})", model.name));
    }
    if let Some(window) = model.context_window {
        line.push_str(&format!("  ctx={}", window));
    }
    line
}

// ── Chats Command ───────────────────────────────────────────────────

async fn cmd_chats(service: &ChatService, action: ChatCommands) -> Result<()> {
    let mut chats = service.chats().write().await;
    match action {
        ChatCommands::List => {
            let current = chats.current_chat_id().to_string();
            for chat in chats.chats() {
                let marker = if chat.id == current { "*" } else { " " };
                println!(
                    "{} {}  {}  ({} messages)",
                    marker,
                    chat.id,
                    chat.title,
                    chat.messages.len()
                );
            }
        }
        ChatCommands::New => {
            let chat = chats.create_chat();
            println!("Created chat {}", chat.id);
        }
        ChatCommands::Switch { id } => {
            chats.switch_to(&id)?;
            println!("Switched to {}", id);
        }
        ChatCommands::Delete { id } => {
            chats.delete_chat(&id)?;
            println!("Deleted {}", id);
        }
        ChatCommands::Show => {
            let chat = chats.current();
            println!("# {}\n", chat.title);
            for message in &chat.messages {
                print_message(message);
            }
            for artifact in &chat.artifacts {
                println!("[artifact] {} ({}) id={}", artifact.title, artifact.kind, artifact.id);
            }
        }
    }
    Ok(())
}

fn print_message(message: &ChatMessage) {
    let who = match message.role {
        TurnRole::User => "you",
        TurnRole::Assistant => "assistant",
    };
    if let Some(thinking) = &message.thinking {
        println!("{}[{} thinking]\n{}{}", DIM, who, thinking, RESET);
    }
    println!("[{}]\n{}\n", who, message.content);
}

// ── Config Command ──────────────────────────────────────────────────

async fn cmd_config(service: &ChatService, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let config = service.get_config().await;
            println!("{}", serde_json::to_string_pretty(&config)?);
            let credentials = service.credentials().read().await;
            println!("keys: {}", credentials.configured().join(", "));
        }
        ConfigCommands::SetKey { name, value } => {
            service.credentials().write().await.set(&name, &value)?;
            if let Ok(provider) = name.parse::<ProviderIdentity>() {
                service.catalog().invalidate(Some(provider));
            }
            println!("Saved key '{}'", name);
        }
        ConfigCommands::SetProvider { provider } => {
            let config = service.select_provider(provider).await?;
            println!(
                "Provider: {}, model: {}",
                config.selected_provider.display_name(),
                if config.selected_model.is_empty() {
                    provider.default_model()
                } else {
                    config.selected_model.as_str()
                }
            );
        }
        ConfigCommands::SetModel { model } => {
            service.select_model(model).await?;
        }
        ConfigCommands::Search { state } => {
            service
                .update_config(SettingsUpdate {
                    search_enabled: Some(matches!(state, Toggle::On)),
                    ..Default::default()
                })
                .await?;
        }
        ConfigCommands::SetBaseUrl { provider, url } => {
            service
                .update_config(SettingsUpdate {
                    base_urls: Some([(provider, url)].into_iter().collect()),
                    ..Default::default()
                })
                .await?;
            service.catalog().invalidate(Some(provider));
        }
        ConfigCommands::SetProxy { url } => {
            let proxy = ProxyConfig::parse(&url).map_err(anyhow::Error::msg)?;
            service
                .update_config(SettingsUpdate {
                    proxy: Some(proxy),
                    ..Default::default()
                })
                .await?;
        }
        ConfigCommands::ClearProxy => {
            service
                .update_config(SettingsUpdate {
                    clear_proxy: true,
                    ..Default::default()
                })
                .await?;
        }
    }
    Ok(())
}
