use super::{flush, BookArg, Workspace};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use folio_editor::Direction;

#[derive(Debug, Args)]
pub struct AddPageArgs {
    #[command(flatten)]
    pub book: BookArg,

    /// Spread to insert after; the current spread when omitted
    #[arg(long)]
    pub after: Option<usize>,
}

#[derive(Debug, Args)]
pub struct RemovePageArgs {
    #[command(flatten)]
    pub book: BookArg,

    /// Position of the added spread to remove
    #[arg(long)]
    pub index: usize,
}

#[derive(Debug, Args)]
pub struct GotoArgs {
    #[command(flatten)]
    pub book: BookArg,

    /// Spread position to open at
    pub index: usize,
}

#[derive(Debug, Args)]
pub struct TurnArgs {
    #[command(flatten)]
    pub book: BookArg,

    pub direction: TurnDirection,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TurnDirection {
    Prev,
    Next,
}

impl From<TurnDirection> for Direction {
    fn from(direction: TurnDirection) -> Self {
        match direction {
            TurnDirection::Prev => Direction::Prev,
            TurnDirection::Next => Direction::Next,
        }
    }
}

pub async fn add_page(args: AddPageArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.store(&args.book.id);
    let (mut session, sink) = workspace.session(&store).await;

    let key = match args.after {
        Some(index) => {
            let anchor = session
                .projection()
                .at(index)
                .map(|s| s.key)
                .with_context(|| format!("No spread at position {}", index))?;
            session.add_page_after(anchor)?
        }
        None => session.add_page()?,
    };
    flush(&store, &sink).await?;

    let spread = session
        .projection()
        .get(key)
        .context("Added spread vanished")?;
    println!(
        "{} Added {} at position {}",
        "✓".green(),
        spread.label.bright_white(),
        spread.index
    );
    Ok(())
}

pub async fn remove_page(args: RemovePageArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.store(&args.book.id);
    let (mut session, sink) = workspace.session(&store).await;

    let key = session
        .projection()
        .at(args.index)
        .map(|s| s.key)
        .with_context(|| format!("No spread at position {}", args.index))?;
    let removed = session.remove_page(key)?;
    flush(&store, &sink).await?;

    println!(
        "{} Removed {} ({})",
        "✓".green(),
        removed.label.bright_white(),
        removed.id.dimmed()
    );
    Ok(())
}

pub async fn goto(args: GotoArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.store(&args.book.id);
    let (mut session, sink) = workspace.session(&store).await;

    session.jump_to(args.index)?;
    flush(&store, &sink).await?;

    println!("{} At {}", "✓".green(), session.nav_label().cyan());
    Ok(())
}

pub async fn turn(args: TurnArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.store(&args.book.id);
    let (mut session, sink) = workspace.session(&store).await;

    if !session.turn_page(args.direction.into()) {
        println!("{} Already at the {}", "⚠️".yellow(), match args.direction {
            TurnDirection::Prev => "first page",
            TurnDirection::Next => "last page",
        });
        return Ok(());
    }
    flush(&store, &sink).await?;

    println!("{} At {}", "✓".green(), session.nav_label().cyan());
    Ok(())
}
