//! PDF subcommands.

use std::{collections::BTreeMap, path::PathBuf};

use {
    anyhow::{Result, bail},
    clap::Subcommand,
    docpilot_pdf::{
        annotate::{self, Annotation},
        create::{self, PdfSpec},
        form, info, merge,
    },
    serde_json::{Value, json},
};

use crate::output::{emit, load_payload};

#[derive(Subcommand)]
pub enum PdfAction {
    /// Create a text PDF from a JSON spec.
    Create {
        /// PDF spec as inline JSON or a JSON file.
        spec: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Concatenate PDFs in the given order.
    Merge {
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Add text, free-text and highlight annotations.
    Annotate {
        input: PathBuf,
        /// Annotation list as inline JSON or a JSON file.
        #[arg(long)]
        annotations: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Fill AcroForm fields by name.
    Fill {
        input: PathBuf,
        /// `{"field.name": "value"}` as inline JSON or a JSON file.
        #[arg(long)]
        values: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List AcroForm fields.
    Fields { input: PathBuf },
    /// Page count, version and document metadata.
    Info { input: PathBuf },
    /// Extract text.
    Text {
        input: PathBuf,
        /// 1-based pages, comma-separated (all pages when omitted).
        #[arg(long, value_delimiter = ',')]
        pages: Vec<u32>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn handle_pdf(action: PdfAction) -> Result<()> {
    match action {
        PdfAction::Create { spec, output } => {
            let spec: PdfSpec = load_payload(&spec)?;
            emit(&create::create_pdf(&spec, &output)?, None)
        },
        PdfAction::Merge { inputs, output } => {
            if inputs.contains(&output) {
                bail!("output would overwrite one of the inputs");
            }
            emit(&merge::merge(&inputs, &output)?, None)
        },
        PdfAction::Annotate {
            input,
            annotations,
            output,
        } => {
            let annotations: Vec<Annotation> = load_payload(&annotations)?;
            if annotations.is_empty() {
                bail!("no annotations given");
            }
            emit(&annotate::annotate(&input, &output, &annotations)?, None)
        },
        PdfAction::Fill {
            input,
            values,
            output,
        } => {
            let raw: BTreeMap<String, Value> = load_payload(&values)?;
            let values = raw
                .into_iter()
                .map(|(name, value)| {
                    let text = match value {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (name, text)
                })
                .collect();
            emit(&form::fill(&input, &output, &values)?, None)
        },
        PdfAction::Fields { input } => emit(&form::list_fields(&input)?, None),
        PdfAction::Info { input } => emit(&info::info(&input)?, None),
        PdfAction::Text {
            input,
            pages,
            output,
        } => {
            let selected = (!pages.is_empty()).then_some(pages.as_slice());
            let text = info::extract_text(&input, selected)?;
            emit(&json!({ "path": input, "text": text }), output.as_deref())
        },
    }
}
