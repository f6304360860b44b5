//! Presentation subcommands.

use std::path::PathBuf;

use {
    anyhow::Result,
    clap::Subcommand,
    docpilot_presentation::{SlideDeck, build_presentation},
};

use crate::output::{emit, load_payload, payload_dir};

#[derive(Subcommand)]
pub enum SlidesAction {
    /// Build a .pptx from a JSON slide deck.
    Create {
        /// Deck as inline JSON or a JSON file. Relative image paths resolve
        /// against the file's directory.
        spec: String,
        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn handle_slides(action: SlidesAction) -> Result<()> {
    match action {
        SlidesAction::Create { spec, output } => {
            let mut deck: SlideDeck = load_payload(&spec)?;
            if let Some(base) = payload_dir(&spec) {
                deck.resolve_images(base);
            }
            let report = build_presentation(&deck, &output)?;
            emit(&report, None)
        },
    }
}
