use crate::model::{Language, StrictMode};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "blockcode-rs",
    about = "Generate C, Python or Java source from a visual block program."
)]
pub struct Args {
    #[arg(
        value_name = "INPUT",
        required_unless_present = "list_blocks",
        help = "Program JSON file, or a .bcz bundle archive."
    )]
    pub input: Option<PathBuf>,

    #[arg(value_name = "OUTPUT", help = "Write generated source here instead of stdout.")]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "MODE",
        help = "Override the program's strictness mode (beginner or advanced)."
    )]
    pub mode: Option<StrictMode>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Load block definitions from a JSON file instead of the built-in catalog."
    )]
    pub registry: Option<PathBuf>,

    #[arg(
        long,
        help = "Emit a comment instead of borrowing another language's template when a block lacks one."
    )]
    pub strict_templates: bool,

    #[arg(
        long,
        value_name = "LANG",
        help = "Print the block catalog for a language as JSON and exit."
    )]
    pub list_blocks: Option<Language>,

    #[arg(long, help = "Report placement rule violations and fail when any are found.")]
    pub check: bool,

    #[arg(
        long,
        value_name = "PATH",
        help = "Also write a .bcz bundle (manifest, program and generated source)."
    )]
    pub bundle: Option<PathBuf>,

    #[arg(
        long,
        help = "Output the execution request JSON (language, file name, source) instead of raw source."
    )]
    pub emit_request: bool,
}
