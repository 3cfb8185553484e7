//! Command-line surface: one subcommand per admin screen.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "console", about = "Calibration-lab admin workflows")]
pub struct Cli {
    /// Settings file; missing is fine.
    #[arg(long, default_value = "console.toml")]
    pub config: PathBuf,
    /// Permission codes granted to this session, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub permissions: Vec<u32>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    VisualTest(VisualTestCommand),
    #[command(subcommand)]
    ActionItem(ActionItemCommand),
    #[command(subcommand)]
    RevRequest(RevRequestCommand),
}

#[derive(Subcommand, Debug)]
pub enum VisualTestCommand {
    List,
    Show { id: String },
    Add {
        #[arg(long)]
        description: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        description: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ActionItemCommand {
    List {
        #[arg(long)]
        status: Option<String>,
    },
    Accept { id: String },
    Assign { id: String },
}

#[derive(Args, Debug)]
pub struct DecisionArgs {
    pub id: String,
    #[arg(long, default_value = "")]
    pub reason: String,
    #[arg(long, default_value = "")]
    pub remark: String,
}

#[derive(Subcommand, Debug)]
pub enum RevRequestCommand {
    List {
        #[arg(long)]
        status: Option<String>,
    },
    Approve(DecisionArgs),
    Reject(DecisionArgs),
}
