use super::{BookArg, Workspace};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::{BookSession, Page, Spread};

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub book: BookArg,

    /// Also print field contents
    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn show(args: ShowArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.store(&args.book.id);
    let (session, _) = workspace.session(&store).await;

    println!(
        "{} {} ({} spreads, {} added)",
        "📖".bright_blue(),
        args.book.id.bright_white().bold(),
        session.projection().len(),
        session.dynamic_spreads().len()
    );
    println!("   At: {}", session.nav_label().cyan());
    println!();

    for spread in session.projection().spreads() {
        print_spread(&session, spread, args.verbose);
    }

    let editables = session.projection().editables();
    if args.verbose && !editables.is_empty() {
        println!();
        for (id, html) in editables {
            println!("   {} {}", format!("{}:", id).dimmed(), html);
        }
    }

    Ok(())
}

fn print_spread(session: &BookSession, spread: &Spread, verbose: bool) {
    let marker = if spread.index == session.current_index() {
        "▶".green().to_string()
    } else {
        " ".to_string()
    };
    let kind = if spread.is_dynamic() {
        "+".yellow().to_string()
    } else {
        " ".to_string()
    };

    println!(
        "{} {:>3} {} {:<24} {}",
        marker,
        spread.index,
        kind,
        spread.label,
        page_numbers(spread).dimmed()
    );

    if verbose {
        for page in spread.pages() {
            print_page(page);
        }
    }
}

fn page_numbers(spread: &Spread) -> String {
    match (spread.left.number, spread.right.number) {
        (Some(left), Some(right)) => format!("pp. {}-{}", left, right),
        (Some(n), None) | (None, Some(n)) => format!("p. {}", n),
        (None, None) => String::new(),
    }
}

fn print_page(page: &Page) {
    if let Some(text) = &page.text {
        let content = if text.content.is_empty() {
            "(empty)".dimmed().to_string()
        } else {
            text.content.clone()
        };
        println!("        {} {}", format!("{}:", text.id).dimmed(), content);
    }
    if let Some(zone) = &page.zone {
        let state = if zone.hidden {
            "hidden".red().to_string()
        } else {
            zone.position.as_str().to_string()
        };
        let image = if zone.populated { "image" } else { "no image" };
        println!(
            "        {} {} ({})",
            format!("{}:", zone.id).dimmed(),
            state,
            image
        );
    }
}
