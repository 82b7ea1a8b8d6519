use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use ferric_bot::application::messaging::{BotContext, DispatchEngine};
use ferric_bot::domain::traits::Transport;
use ferric_bot::infrastructure::adapters::{ConsoleAdapter, IrcAdapter};
use ferric_bot::infrastructure::config::Config;
use ferric_bot::plugins::{DylibSource, Plugin, PluginRegistry};

#[derive(Parser)]
#[command(name = "ferric-bot")]
#[command(about = "A plugin-driven IRC bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config);
        }
        Commands::Version => {
            println!("ferric-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn run_bot(config_path: String) {
    // Load config; logging comes up afterwards so the debug flag applies
    let (config, load_warning) = if std::path::Path::new(&config_path).exists() {
        match Config::load(&config_path) {
            Ok(config) => (config, None),
            Err(e) => (
                Config::load_env(),
                Some(format!("Failed to load config: {}, using defaults", e)),
            ),
        }
    } else {
        (Config::load_env(), None)
    };

    init_tracing(config.debug);

    if let Some(warning) = load_warning {
        tracing::warn!("{}", warning);
    }

    tracing::info!("Starting ferric-bot: {}", config.bot.nick);

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let context = BotContext::new(&config.bot.nick, outbound_tx);

        // handler code lives in the mapped libraries, so the source has
        // to outlive the engine
        let mut source = DylibSource::new();
        let mut registry = PluginRegistry::load(
            &config.plugins.load,
            &config.plugins.directory,
            &mut source,
            &context,
        );

        let console_mode = config.server.host.is_empty();
        if console_mode {
            for plugin in demo_plugins() {
                tracing::info!("Module: {} loaded (built-in)", plugin.name());
                registry.register_with_init(plugin, &context);
            }
        }

        let mut engine = DispatchEngine::new(registry, context, &config.command_prefix)
            .with_tick_interval(config.tick_interval())
            .with_join_on_invite(config.join_on_invite);

        let transport: Box<dyn Transport> = if console_mode {
            Box::new(ConsoleAdapter::new(&config.bot.nick))
        } else {
            Box::new(IrcAdapter::new(
                config.server.clone(),
                &config.bot.nick,
                config.channels.clone(),
            ))
        };

        let transport_task = tokio::spawn(transport.run(event_tx, outbound_rx));

        let result = tokio::select! {
            result = engine.run(event_rx) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                Ok(())
            }
        };

        transport_task.abort();

        if let Err(e) = result {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    });
}

/// Built-in plugins for console mode, so the binary is usable without
/// any compiled plugin libraries.
fn demo_plugins() -> Vec<Plugin> {
    let echo = Plugin::new("echo").on_command(|_bot, event| {
        if event.command.name == "echo" {
            Ok(Some(event.command.arg_text()))
        } else {
            Ok(None)
        }
    });

    let ping = Plugin::new("ping")
        .on_command(|_bot, event| Ok((event.command.name == "ping").then(|| "pong".to_string())))
        .on_user_join(|bot, event| {
            bot.say(&event.channel, &format!("Welcome, {}!", event.user.nick));
            Ok(())
        });

    vec![echo, ping]
}

fn init_config() {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
}
