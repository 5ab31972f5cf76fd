use clap::{Parser, Subcommand};
use rdapbot::lens::utils::OutputFormat;
use rdapbot::BotConfig;
use tracing::Level;

mod commands;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.rdapbot/rdapbot.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: table (default), markdown, json, json-pretty
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Shorthand for `--format json`
    #[clap(long, global = true)]
    json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interaction endpoint.
    Serve(commands::serve::ServeArgs),

    /// Look a domain or IP address up and print one view of the report.
    Lookup(commands::lookup::LookupArgs),

    /// Show the effective configuration.
    Config(commands::config::ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = match BotConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        cli.format
    };

    match cli.command {
        Commands::Serve(args) => commands::serve::run(config, args),
        Commands::Lookup(args) => commands::lookup::run(&config, args, output_format),
        Commands::Config(args) => commands::config::run(&config, args, output_format),
    }
}
