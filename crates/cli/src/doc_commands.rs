//! Word document subcommands.

use std::path::PathBuf;

use {
    anyhow::Result,
    clap::Subcommand,
    docpilot_document::{DocumentSpec, build_document, extract_text},
    serde_json::json,
};

use crate::output::{emit, load_payload, payload_dir};

#[derive(Subcommand)]
pub enum DocAction {
    /// Build a .docx from a JSON section list.
    Create {
        /// Document spec as inline JSON or a JSON file. Relative image paths
        /// resolve against the file's directory.
        spec: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the paragraph text of a .docx.
    Text {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn handle_doc(action: DocAction) -> Result<()> {
    match action {
        DocAction::Create { spec, output } => {
            let mut document: DocumentSpec = load_payload(&spec)?;
            if let Some(base) = payload_dir(&spec) {
                document.resolve_images(base);
            }
            let report = build_document(&document, &output)?;
            emit(&report, None)
        },
        DocAction::Text { input, output } => {
            let paragraphs = extract_text(&input)?;
            emit(
                &json!({ "path": input, "paragraphs": paragraphs }),
                output.as_deref(),
            )
        },
    }
}
