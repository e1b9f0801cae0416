//! # Adaptive Chef CLI
//!
//! Command-line interface for the meal planning assistant.
//!
//! Usage:
//!   chef                      interactive chat through the full pipeline
//!   chef chat --simple        interactive single-call chat
//!   chef ask <text>           one request, then exit
//!   chef demo                 scripted three-step walkthrough
//!   chef models               models that support generateContent
//!
//! Examples:
//!   chef ask "I'm vegan and allergic to peanuts"
//!   chef -s alice ask "Create a 3-day meal plan using my pantry items"
//!   RUST_LOG=chef_agent=debug chef demo

use chef_agent::{Chef, ChefConfig, ChefReply};
use chef_core::{GeminiProvider, LlmProvider, ProviderConfig, Session, SessionManager};
use chef_error::Error;
use clap::{Parser, Subcommand};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

type GeminiChef = Chef<GeminiProvider>;

const EXIT_COMMANDS: [&str; 4] = ["quit", "exit", "bye", "goodbye"];

const DEMO_INPUTS: [&str; 3] = [
    "Hi! I'm vegan and allergic to peanuts.",
    "Add rice, beans, tomatoes, and spinach to my pantry",
    "Create a 3-day meal plan using my pantry items",
];

#[derive(Parser)]
#[command(name = "chef")]
#[command(author, version, about = "The Adaptive Chef - AI meal planning assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Google AI Studio API key
    #[arg(long, env = "GOOGLE_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Model to use instead of the provider default
    #[arg(short, long, env = "CHEF_MODEL", global = true)]
    model: Option<String>,

    /// Override the Generative Language API base URL
    #[arg(long, env = "CHEF_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Session ID; state lives only as long as the process
    #[arg(short, long, global = true, default_value = "default")]
    session: String,

    /// Maximum plan/critique iterations
    #[arg(long, global = true, default_value_t = 3)]
    max_iterations: usize,

    /// Sampling temperature
    #[arg(long, global = true, default_value_t = 0.7)]
    temperature: f32,

    /// Nucleus sampling threshold
    #[arg(long, global = true, default_value_t = 0.95)]
    top_p: f32,

    /// Show critiques for every iteration and token usage
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only print replies
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat {
        /// Single-call chat without the specialist pipeline
        #[arg(long)]
        simple: bool,
    },
    /// Send one request through the pipeline
    Ask {
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },
    /// Run the scripted demo conversation
    Demo,
    /// List models that support generateContent
    Models,
}

/// Terminal output options
#[derive(Clone, Copy)]
struct Output {
    verbose: bool,
    quiet: bool,
}

fn is_exit_command(input: &str) -> bool {
    EXIT_COMMANDS
        .iter()
        .any(|c| input.trim().eq_ignore_ascii_case(c))
}

fn print_banner() {
    println!(
        r#"
╔═══════════════════════════════════════════════════════════════╗
║                                                               ║
║            🍳 THE ADAPTIVE CHEF - INTERACTIVE CHAT            ║
║                                                               ║
║               AI-Powered Meal Planning Assistant              ║
║                                                               ║
╚═══════════════════════════════════════════════════════════════╝

Welcome! I'm The Adaptive Chef, your AI meal planning assistant.

I can help you:
• Set dietary preferences and track allergies
• Manage your pantry inventory
• Generate personalized meal plans
• Get cooking instructions and recipes

Type 'quit' or 'exit' to end the conversation.
"#
    );
}

fn print_reply(reply: &ChefReply, out: Output) {
    if out.verbose {
        if let Some(plan) = &reply.plan {
            for iteration in &plan.outcome.iterations {
                println!("\n--- Iteration {} critique ---", iteration.iteration);
                println!("{}", iteration.critique);
            }
            println!();
        }
    }

    if out.quiet {
        println!("{}", reply);
    } else {
        println!("\n🍳 Chef: {}", reply);
    }
}

fn print_usage<P: LlmProvider>(chef: &Chef<P>) {
    let usage = chef.usage();
    println!(
        "\n📊 {} calls, {} prompt + {} completion tokens",
        usage.total_calls, usage.total_prompt_tokens, usage.total_completion_tokens
    );
}

fn print_turn_error(err: &Error) {
    debug!(error = ?err, "turn failed");
    println!("❌ Error: {}", err.message());
    println!("   Please try again or rephrase your question.");
}

async fn run_turn<P: LlmProvider>(
    chef: &mut Chef<P>,
    session: &mut Session,
    input: &str,
    simple: bool,
    out: Output,
) -> Result<(), Error> {
    if simple {
        if !out.quiet {
            print!("\n🍳 Chef: ");
        }
        chef.chat(session, input, |text| {
            print!("{}", text);
            std::io::stdout().flush().ok();
        })
        .await?;
        println!();
    } else {
        let reply = chef.process_request(session, input).await?;
        print_reply(&reply, out);
    }

    if out.verbose {
        print_usage(chef);
    }
    Ok(())
}

/// Read-eval loop over `reader` until an exit word, end of input or Ctrl-C.
/// A failed turn is reported and the loop keeps going.
async fn interactive<P, R>(
    chef: &mut Chef<P>,
    session: &mut Session,
    reader: R,
    simple: bool,
    out: Output,
) where
    P: LlmProvider,
    R: AsyncBufRead + Unpin,
{
    if !out.quiet {
        print_banner();
    }

    let mut lines = reader.lines();
    loop {
        print!("\n👤 You: ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = match line {
            Ok(Some(line)) => line.trim().to_string(),
            Ok(None) => {
                println!();
                break;
            }
            Err(e) => {
                warn!(error = %e, "failed to read input");
                break;
            }
        };

        if input.is_empty() {
            continue;
        }
        if is_exit_command(&input) {
            break;
        }

        let turn = tokio::select! {
            result = run_turn(chef, session, &input, simple, out) => result,
            _ = tokio::signal::ctrl_c() => {
                println!("\n⏹️  Interrupted");
                break;
            }
        };
        if let Err(err) = turn {
            print_turn_error(&err);
        }
    }

    println!("\n👋 Thanks for chatting! Happy cooking!");
}

async fn run_demo(chef: &mut GeminiChef, session: &mut Session, out: Output) {
    if !out.quiet {
        println!("🍳 The Adaptive Chef - Demo\n");
    }

    for (step, input) in DEMO_INPUTS.iter().enumerate() {
        println!("\n{}", "=".repeat(70));
        println!("Step {}: 👤 User: {}", step + 1, input);
        println!("{}", "=".repeat(70));

        if let Err(err) = run_turn(chef, session, input, false, out).await {
            eprintln!("❌ Error: {}", err);
            std::process::exit(1);
        }
    }

    println!("\n{}", "=".repeat(70));
    println!("{}", session.preferences.summary());
    println!("\n{}", session.pantry.list_items());
    println!("\n📚 Plans in history: {}", session.history.len());
    print_usage(chef);
}

async fn list_models(chef: &GeminiChef) {
    match chef.provider().list_models().await {
        Ok(models) => {
            for model in models.iter().filter(|m| m.supports_generate_content()) {
                match &model.display_name {
                    Some(display) => println!("{}  ({})", model.name, display),
                    None => println!("{}", model.name),
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e.into_error().with_operation("cli::models"));
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let out = Output {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let mut provider_config = ProviderConfig::gemini(cli.api_key.clone());
    if let Some(model) = &cli.model {
        provider_config = provider_config.with_model(model.clone());
    }
    if let Some(base_url) = &cli.base_url {
        provider_config = provider_config.with_base_url(base_url.clone());
    }
    if !provider_config.has_api_key() {
        warn!("GOOGLE_API_KEY is not set");
        eprintln!("⚠️  GOOGLE_API_KEY not set. Add it to your environment or a .env file;");
        eprintln!("   requests will fail until it is configured.");
    }

    let provider = match GeminiProvider::new(provider_config) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Error: {}", e.into_error().with_operation("cli::init"));
            std::process::exit(1);
        }
    };

    let config = ChefConfig::default()
        .with_max_iterations(cli.max_iterations)
        .with_temperature(cli.temperature)
        .with_top_p(cli.top_p);
    let mut chef = Chef::with_config(provider, config);
    let mut sessions = SessionManager::new();
    let session = sessions.get_or_create(&cli.session);

    match cli.command {
        Some(Commands::Models) => list_models(&chef).await,
        Some(Commands::Demo) => run_demo(&mut chef, session, out).await,
        Some(Commands::Ask { text }) => {
            let input = text.join(" ");
            if let Err(err) = run_turn(&mut chef, session, &input, false, out).await {
                eprintln!("❌ Error: {}", err);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { simple }) => {
            let stdin = BufReader::new(tokio::io::stdin());
            interactive(&mut chef, session, stdin, simple, out).await
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            interactive(&mut chef, session, stdin, false, out).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chef_core::{
        CompletionRequest, CompletionResponse, FinishReason, ProviderError, StreamReceiver, Usage,
    };
    use clap::CommandFactory;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers `complete` calls from a queue and keeps every request.
    #[derive(Default)]
    struct QueuedProvider {
        replies: Mutex<VecDeque<Result<CompletionResponse, ProviderError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl QueuedProvider {
        fn reply(self, reply: Result<&str, ProviderError>) -> Self {
            let reply = reply.map(|text| CompletionResponse {
                id: String::new(),
                model: "queued".into(),
                content: Some(text.to_string()),
                tool_calls: Vec::new(),
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            });
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        fn user_messages(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter_map(|r| r.messages.last().and_then(|m| m.content.clone()))
                .collect()
        }
    }

    impl LlmProvider for QueuedProvider {
        fn name(&self) -> &str {
            "queued"
        }

        fn default_model(&self) -> &str {
            "queued"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Other("no reply queued".into())))
        }

        async fn stream(&self, _request: CompletionRequest) -> Result<StreamReceiver, ProviderError> {
            Err(ProviderError::Other("streaming not queued".into()))
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("quit"));
        assert!(is_exit_command("  Goodbye "));
        assert!(is_exit_command("BYE"));
        assert!(!is_exit_command("quit smoking tips"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["chef", "-s", "alice", "ask", "plan", "my", "week"]).unwrap();
        assert_eq!(cli.session, "alice");
        match cli.command {
            Some(Commands::Ask { text }) => assert_eq!(text.join(" "), "plan my week"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["chef", "chat", "--simple"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Chat { simple: true })));
        assert_eq!(cli.max_iterations, 3);
        assert_eq!(cli.session, "default");
    }

    #[tokio::test]
    async fn test_interactive_skips_blank_lines_and_survives_errors() {
        let provider = QueuedProvider::default()
            .reply(Err(ProviderError::Network("connection reset".into())))
            .reply(Ok(r#"{"reply": "Hello! How can I help?"}"#))
            .reply(Ok("Your pantry is unchanged."));
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");
        let out = Output {
            verbose: false,
            quiet: true,
        };
        let input: &[u8] = b"\n   \nI'm vegan\nhello\nbye\nnever sent\n";

        interactive(&mut chef, &mut session, input, false, out).await;

        let sent = chef.provider().user_messages();
        assert_eq!(sent.len(), 3);
        assert!(sent[0].contains("📝 User Request: I'm vegan"));
        assert!(sent[1].contains("📝 User Request: hello"));
        assert!(sent[2].contains("📝 User Request: hello"));
        assert!(session.preferences.is_empty());
        assert_eq!(chef.usage().total_calls, 2);
    }
}
