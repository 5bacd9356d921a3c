use bizlocate::{Assistant, ChatSession, ContextSnapshot, Submission};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bizlocate")]
#[command(about = "BizLocate CLI — ask questions about a location analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory with a default config.json and an empty context.json.
    Init {
        /// Config file path (default: BIZLOCATE_CONFIG_PATH or ~/.bizlocate/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Print the system prompt composed from the current context (no network call).
    Prompt {
        #[command(flatten)]
        ctx: ContextArgs,

        /// Print the full request body as JSON, with this text as the user message.
        #[arg(long, value_name = "TEXT")]
        json: Option<String>,
    },

    /// Ask a single question and print the reply.
    Ask {
        #[command(flatten)]
        ctx: ContextArgs,

        /// The question.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Chat with the assistant (interactive).
    Chat {
        #[command(flatten)]
        ctx: ContextArgs,
    },
}

/// Config and analysis context options shared by prompt, ask and chat.
#[derive(Args, Clone)]
struct ContextArgs {
    /// Config file path (default: BIZLOCATE_CONFIG_PATH or ~/.bizlocate/config.json)
    #[arg(long, short, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Context snapshot JSON (default: BIZLOCATE_CONTEXT_PATH or analysis.contextPath from config)
    #[arg(long, value_name = "PATH")]
    context: Option<PathBuf>,

    /// Location name; overrides the context file.
    #[arg(long)]
    location: Option<String>,

    /// Business type; overrides the context file.
    #[arg(long)]
    business_type: Option<String>,

    /// Success score (0-100); overrides the context file.
    #[arg(long)]
    score: Option<f64>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("bizlocate {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Prompt { ctx, json }) => {
            if let Err(e) = run_prompt(ctx, json) {
                log::error!("prompt failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask { ctx, message }) => {
            if let Err(e) = run_ask(ctx, message.join(" ")).await {
                log::error!("ask failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { ctx }) => {
            if let Err(e) = run_chat(ctx).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(bizlocate::config::default_config_path);
    let dir = bizlocate::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Load config and build the context snapshot: file first, then command-line overrides.
fn load(args: &ContextArgs) -> anyhow::Result<(bizlocate::config::Config, ContextSnapshot)> {
    let (config, path) = bizlocate::config::load_config(args.config.clone())?;
    let context_path = args
        .context
        .clone()
        .or_else(|| bizlocate::config::resolve_context_path(&config, &path));
    let from_file = match context_path {
        Some(p) => bizlocate::context::load_context(&p)?,
        None => ContextSnapshot::default(),
    };
    let overrides = ContextSnapshot {
        location: args.location.clone(),
        business_type: args.business_type.clone(),
        success_score: args.score,
        satellite: None,
    };
    Ok((config, from_file.merge(overrides)))
}

fn run_prompt(args: ContextArgs, json: Option<String>) -> anyhow::Result<()> {
    let (config, context) = load(&args)?;
    match json {
        Some(user_text) => {
            let assistant = Assistant::from_config(&config);
            let request = assistant.build_request(&user_text, &context);
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        None => println!("{}", bizlocate::prompt::compose_system_prompt(&context)),
    }
    Ok(())
}

async fn run_ask(args: ContextArgs, message: String) -> anyhow::Result<()> {
    let (config, context) = load(&args)?;
    let assistant = Assistant::from_config(&config);
    if message.trim().is_empty() {
        anyhow::bail!("message is empty");
    }
    println!("{}", assistant.reply(message.trim(), &context).await);
    Ok(())
}

async fn run_chat(args: ContextArgs) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, context) = load(&args)?;
    let assistant = Assistant::from_config(&config);
    let mut chat = ChatSession::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if let Some(greeting) = chat.conversation().last() {
        println!("< [{}] {}", greeting.time_label(), greeting.text());
    }

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }

        let text = match chat.begin_turn(input) {
            Submission::Ignored => continue,
            Submission::Send(text) => text,
        };
        write!(stdout, "…")?;
        stdout.flush()?;
        let reply = assistant.reply(&text, &context).await;
        write!(stdout, "\r")?;
        chat.complete_turn(reply);

        if let Some(m) = chat.conversation().last() {
            println!("< [{}] {}", m.time_label(), m.text().trim());
        }
    }

    Ok(())
}
