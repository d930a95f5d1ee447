use clap::{Parser, Subcommand};
use tracing::Level;

mod cli;

#[derive(Parser)]
#[command(
    name = "noiseprobe",
    version,
    about = "Watch a classifier degrade as Gaussian noise accumulates in its weights"
)]
struct Cli {
    /// Log every perturbation (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a noise sweep and report loss and accuracy per step
    Run(cli::run::RunArgs),
    /// Print the noise schedule without running anything
    Schedule(cli::schedule::ScheduleCmdArgs),
    /// Write an untrained checkpoint with N(0, 1) weights
    Init(cli::init::InitArgs),
    /// Write a config file holding every default
    Config(cli::config::ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run(args) => cli::run::cmd_run(args),
        Command::Schedule(args) => cli::schedule::cmd_schedule(args),
        Command::Init(args) => cli::init::cmd_init(args),
        Command::Config(args) => cli::config::cmd_config(args),
    }
}
