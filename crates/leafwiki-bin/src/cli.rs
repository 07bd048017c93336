use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Local administration of a leafwiki page database
#[derive(Parser, Debug)]
#[command(name = "leafwiki", version, about = "Leafwiki page store CLI")]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Datastore file, overrides the configured path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a page
    Create {
        /// Title for a fresh body with a single header block
        #[arg(long)]
        title: Option<String>,
        /// Editor JSON body. Takes precedence over --title.
        #[arg(long)]
        body_file: Option<PathBuf>,
        /// Parent page id
        #[arg(long)]
        parent: Option<String>,
    },
    /// Print a page
    Show { id: String },
    /// List pages
    List {
        /// Only pages without a parent
        #[arg(long)]
        roots: bool,
    },
    /// List direct children of a page
    Children { id: String },
    /// Print the parent chain of a page
    Ancestors { id: String },
    /// Print the page forest
    Tree,
    /// Replace the body of a page
    SetBody { id: String, body_file: PathBuf },
    /// Move a page under another page, or to the top level with --root
    SetParent {
        id: String,
        #[arg(required_unless_present = "root")]
        parent: Option<String>,
        #[arg(long, conflicts_with = "parent")]
        root: bool,
    },
    /// Delete a page
    Remove { id: String },
}
