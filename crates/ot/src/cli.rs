//! Clap CLI definitions for the `ot` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// ot -- OnTask personalization engine.
///
/// Evaluates rule formulas and renders personalized action texts over the
/// rows of a workflow table.
#[derive(Parser, Debug)]
#[command(
    name = "ot",
    about = "OnTask personalization engine",
    long_about = "Evaluates rule formulas and renders personalized action texts over the rows of a workflow table.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file (YAML).
    #[arg(long, global = true, env = "ONTASK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate variable names into template-safe identifiers.
    Translate(TranslateArgs),

    /// Evaluate a rule formula as a boolean, a SQL predicate or a description.
    Formula(FormulaArgs),

    /// Render an action for every selected row.
    Run(RunArgs),

    /// Render an action for a single row.
    Preview(PreviewArgs),

    /// Count the rows selected by each condition of an action.
    Count(CountArgs),
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Names to translate.
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Evaluation mode of `ot formula`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Bool,
    Sql,
    Text,
}

#[derive(Args, Debug)]
pub struct FormulaArgs {
    /// Formula file in rule-builder JSON.
    pub formula: PathBuf,

    /// Evaluation mode.
    #[arg(short, long, value_enum, default_value = "bool")]
    pub mode: ModeArg,

    /// JSON object with the variable values (boolean mode).
    #[arg(short, long)]
    pub context: Option<PathBuf>,
}

/// Workflow and data inputs shared by the row commands.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Workflow description (YAML or JSON).
    pub workflow: PathBuf,

    /// JSON array of row objects keyed by column name.
    pub rows: PathBuf,

    /// Action name (default: the first action of the workflow).
    #[arg(short, long)]
    pub action: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Additional template rendered per row (e.g. an email subject).
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Column appended to every record.
    #[arg(short, long)]
    pub key_column: Option<String>,

    /// Skip rows whose key column holds this value (repeatable).
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Position of the row among the selected ones, from 1.
    #[arg(short, long, conflicts_with = "key")]
    pub index: Option<usize>,

    /// Select the row whose key column holds this value.
    #[arg(long, requires = "key_column")]
    pub key: Option<String>,

    /// Column searched by --key.
    #[arg(short, long)]
    pub key_column: Option<String>,

    /// Template rendered in place of the action text.
    #[arg(short, long)]
    pub text: Option<String>,
}

#[derive(Args, Debug)]
pub struct CountArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}
