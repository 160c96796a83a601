use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "branchtale",
    about = "Branchtale: structural validation and compilation for branching stories",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every story check and print the report
    Check {
        /// Story corpus directory (overrides `[story].root`)
        #[arg(long)]
        story: Option<String>,

        /// Configuration file (defaults to ./branchtale.toml when present)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Log ingestion and search details to stderr
        #[arg(long)]
        debug: bool,
    },

    /// Run every story check and write the story document when accepted
    Build {
        /// Story corpus directory (overrides `[story].root`)
        #[arg(long)]
        story: Option<String>,

        /// Output path for the story document (overrides `[story].output`)
        #[arg(long)]
        out: Option<String>,

        /// Configuration file (defaults to ./branchtale.toml when present)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Log ingestion and search details to stderr
        #[arg(long)]
        debug: bool,
    },

    /// List canonical loops and whether an ending can be reached from each
    Loops {
        /// Story corpus directory (overrides `[story].root`)
        #[arg(long)]
        story: Option<String>,

        /// Configuration file (defaults to ./branchtale.toml when present)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Log ingestion and search details to stderr
        #[arg(long)]
        debug: bool,
    },
}
