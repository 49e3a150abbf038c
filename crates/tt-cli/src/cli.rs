use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tt_types::{PlanterId, TreeCaptureId};

#[derive(Parser)]
#[command(
    name = "tt",
    about = "TreeTracker capture: planters, identifications, and tree captures",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding records.json and the photos/ folder
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/tt.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage planters and their identifications
    #[command(subcommand)]
    Planter(PlanterCommand),
    /// Record and inspect tree captures
    #[command(subcommand)]
    Tree(TreeCommand),
}

#[derive(Subcommand)]
pub enum PlanterCommand {
    /// Register a new planter
    Add(PlanterAddArgs),
    /// Record a new identification for a planter
    Identify(IdentifyArgs),
    /// Show a planter with its identifications
    Show(PlanterShowArgs),
    /// List all planters
    List,
}

#[derive(Subcommand)]
pub enum TreeCommand {
    /// Save a tree capture for a planter
    Save(TreeSaveArgs),
    /// List tree captures
    List(TreeListArgs),
    /// Flag a tree capture as uploaded
    MarkUploaded(MarkUploadedArgs),
}

#[derive(Args)]
pub struct PlanterAddArgs {
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub organization: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub identifier: Option<String>,
    #[arg(long)]
    pub accept_terms: bool,
}

#[derive(Args)]
pub struct IdentifyArgs {
    pub planter: PlanterId,
    /// Verification photo to attach
    #[arg(long)]
    pub photo: Option<PathBuf>,
}

#[derive(Args)]
pub struct PlanterShowArgs {
    pub planter: PlanterId,
}

#[derive(Args)]
pub struct TreeSaveArgs {
    #[arg(long)]
    pub planter: PlanterId,
    /// Photo of the tree
    #[arg(long)]
    pub image: PathBuf,
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,
    /// Horizontal accuracy in meters
    #[arg(long)]
    pub accuracy: f64,
}

#[derive(Args)]
pub struct TreeListArgs {
    /// Only trees attributed to this planter
    #[arg(long)]
    pub planter: Option<PlanterId>,
}

#[derive(Args)]
pub struct MarkUploadedArgs {
    pub tree: TreeCaptureId,
}
