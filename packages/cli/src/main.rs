mod commands;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    add_page, edit, goto, new_id, remove_page, resolve, show, turn, watch, AddPageArgs,
    EditCommand, GotoArgs, RemovePageArgs, ResolveArgs, ShowArgs, TurnArgs, WatchArgs, Workspace,
};
use config::Config;
use tracing_subscriber::EnvFilter;

/// Folio CLI - inspect and edit picture books
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show one page at a time, as on a phone
    #[arg(long, global = true)]
    mobile: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new book id
    New,

    /// Resolve the book id of a page query string
    Resolve(ResolveArgs),

    /// Print the spreads of a book
    Show(ShowArgs),

    #[command(flatten)]
    Edit(EditCommand),

    /// Add a page after a spread
    AddPage(AddPageArgs),

    /// Remove an added page
    RemovePage(RemovePageArgs),

    /// Open a book at a spread
    Goto(GotoArgs),

    /// Turn one page forward or back
    Turn(TurnArgs),

    /// Print remote updates to a book as they arrive
    Watch(WatchArgs),
}

async fn run(cli: Cli, cwd: &str, mut config: Config) -> anyhow::Result<()> {
    if cli.mobile {
        config.mobile = true;
    }

    match cli.command {
        Command::New => new_id(),
        Command::Resolve(args) => resolve(args),
        Command::Show(args) => show(args, &Workspace::open(cwd, config)?).await,
        Command::Edit(command) => edit(command, &Workspace::open(cwd, config)?).await,
        Command::AddPage(args) => add_page(args, &Workspace::open(cwd, config)?).await,
        Command::RemovePage(args) => remove_page(args, &Workspace::open(cwd, config)?).await,
        Command::Goto(args) => goto(args, &Workspace::open(cwd, config)?).await,
        Command::Turn(args) => turn(args, &Workspace::open(cwd, config)?).await,
        Command::Watch(args) => watch(args, &Workspace::open(cwd, config)?).await,
    }
}

fn init_tracing(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = async {
        let cwd = std::env::current_dir()
            .context("Cannot get current directory")?
            .display()
            .to_string();
        let config = Config::load(&cwd)?;
        init_tracing(&config);
        run(cli, &cwd, config).await
    }
    .await;

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
