use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_model::{DocumentId, IdResolution};

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Query string of the hosting page, e.g. "?id=abc1234"
    pub query: String,
}

/// Print a fresh book id
pub fn new_id() -> Result<()> {
    let id = DocumentId::generate();
    println!("{} {}", "✓".green(), id.to_string().bright_white().bold());
    println!("  Open with {}", format!("?id={}", id).cyan());
    Ok(())
}

/// Resolve the book id a page would use, generating one when absent
pub fn resolve(args: ResolveArgs) -> Result<()> {
    match DocumentId::resolve(&args.query) {
        IdResolution::Existing(id) => {
            println!("{} {}", "Existing:".green(), id.as_str().bright_white());
        }
        IdResolution::Generated { id, redirect_query } => {
            println!("{} {}", "Generated:".yellow(), id.as_str().bright_white());
            println!("  Redirect to {}", redirect_query.cyan());
        }
    }
    Ok(())
}
