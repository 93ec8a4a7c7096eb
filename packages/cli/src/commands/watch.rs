use super::{BookArg, Workspace};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tokio_stream::StreamExt;
use tracing::info;

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub book: BookArg,
}

/// Follow a book and print every remote update merged into it
pub async fn watch(args: WatchArgs, workspace: &Workspace) -> Result<()> {
    let _watcher = workspace.backend.watch()?;
    let store = workspace.store(&args.book.id);
    let (mut session, _) = workspace.session(&store).await;
    let mut updates = Box::pin(store.subscribe().into_stream());

    println!(
        "{} Watching {} in {}",
        "👀".bright_blue(),
        args.book.id.bright_white().bold(),
        workspace.backend.dir().display()
    );
    println!("   At: {}", session.nav_label().cyan());
    println!("   Press Ctrl+C to stop");
    println!();

    loop {
        tokio::select! {
            snapshot = updates.next() => {
                let Some(snapshot) = snapshot else {
                    info!("Store closed");
                    break;
                };
                let report = session.apply_remote(snapshot);
                if report.is_noop() {
                    continue;
                }
                println!(
                    "{} {} applied, {} unchanged{}",
                    "↻".green(),
                    report.applied,
                    report.unchanged,
                    if report.unbound > 0 {
                        format!(", {} unknown fields", report.unbound).yellow().to_string()
                    } else {
                        String::new()
                    }
                );
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("{} Stopped", "✓".green());
                break;
            }
        }
    }

    Ok(())
}
