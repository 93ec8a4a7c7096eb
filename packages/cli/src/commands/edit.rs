use super::{flush, BookArg, Workspace};
use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use folio_editor::Edit;
use folio_model::ZonePosition;

/// Field-level edits, one per invocation
#[derive(Debug, Subcommand)]
pub enum EditCommand {
    /// Replace the text of a page
    SetText {
        #[command(flatten)]
        book: BookArg,
        field: String,
        value: String,
    },

    /// Put an image (data URI or URL) into a zone
    SetImage {
        #[command(flatten)]
        book: BookArg,
        field: String,
        src: String,
    },

    /// Replace a title or other rich-text editable
    SetEditable {
        #[command(flatten)]
        book: BookArg,
        editable: String,
        html: String,
    },

    /// Hide an image zone
    HideZone {
        #[command(flatten)]
        book: BookArg,
        zone: String,
    },

    /// Show a hidden image zone
    ShowZone {
        #[command(flatten)]
        book: BookArg,
        zone: String,
    },

    /// Place an image above or below the text
    MoveZone {
        #[command(flatten)]
        book: BookArg,
        zone: String,
        position: Placement,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Placement {
    Top,
    Bottom,
}

impl From<Placement> for ZonePosition {
    fn from(placement: Placement) -> Self {
        match placement {
            Placement::Top => ZonePosition::Top,
            Placement::Bottom => ZonePosition::Bottom,
        }
    }
}

impl EditCommand {
    /// Split into the target book id and the edit to apply
    fn into_edit(self) -> (String, Edit) {
        match self {
            EditCommand::SetText { book, field, value } => (
                book.id,
                Edit::SetText {
                    field_id: field,
                    value,
                },
            ),
            EditCommand::SetImage { book, field, src } => {
                (book.id, Edit::SetImage { field_id: field, src })
            }
            EditCommand::SetEditable {
                book,
                editable,
                html,
            } => (
                book.id,
                Edit::SetEditable {
                    editable_id: editable,
                    html,
                },
            ),
            EditCommand::HideZone { book, zone } => (book.id, Edit::HideZone { zone_id: zone }),
            EditCommand::ShowZone { book, zone } => (book.id, Edit::ShowZone { zone_id: zone }),
            EditCommand::MoveZone {
                book,
                zone,
                position,
            } => (
                book.id,
                Edit::MoveZone {
                    zone_id: zone,
                    position: position.into(),
                },
            ),
        }
    }
}

pub async fn edit(command: EditCommand, workspace: &Workspace) -> Result<()> {
    let (id, edit) = command.into_edit();
    let store = workspace.store(&id);
    let (mut session, sink) = workspace.session(&store).await;

    let field = edit.field_id().to_string();
    session.apply_edit(edit)?;
    flush(&store, &sink).await?;

    println!("{} Updated {}", "✓".green(), field.bright_white());
    Ok(())
}
