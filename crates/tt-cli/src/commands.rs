use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;
use tt_capture::{resolve_latest, LocalTreeService, TreeService};
use tt_documents::{DocumentStore, FsDocumentStore};
use tt_records::{JsonFileRecordStore, RecordStore, UnitOfWork};
use tt_types::{
    DetachedPlanter, Identification, IdentificationId, Location, Planter, PlanterDetail,
    PlanterId, PlanterProfile, TreeCapture, TreeServiceData,
};

use crate::cli::*;
use crate::config::CliConfig;

/// Stores opened from the resolved config.
struct Workspace {
    config: CliConfig,
    records: Arc<dyn RecordStore>,
    documents: Arc<dyn DocumentStore>,
    format: OutputFormat,
}

impl Workspace {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = CliConfig::resolve(cli.data_dir.as_deref(), cli.config.as_deref())?;
        debug!(data_dir = %config.data_dir.display(), "opening local stores");
        let records_path = config.records_path();
        let records = JsonFileRecordStore::open(&records_path)
            .with_context(|| format!("opening {}", records_path.display()))?;
        let documents = FsDocumentStore::new(config.photos_dir())
            .with_extension(config.photo_extension.clone());
        Ok(Self {
            config,
            records: Arc::new(records),
            documents: Arc::new(documents),
            format: cli.format,
        })
    }

    fn service(&self) -> LocalTreeService {
        LocalTreeService::new(self.records.clone(), self.documents.clone())
            .with_config(self.config.service.clone())
    }

    fn planter(&self, id: &PlanterId) -> anyhow::Result<PlanterDetail> {
        self.records
            .planter(id)?
            .with_context(|| format!("planter {id} not found"))
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ws = Workspace::open(&cli)?;
    match cli.command {
        Command::Planter(PlanterCommand::Add(args)) => cmd_planter_add(&ws, args).await,
        Command::Planter(PlanterCommand::Identify(args)) => cmd_identify(&ws, args).await,
        Command::Planter(PlanterCommand::Show(args)) => cmd_planter_show(&ws, args),
        Command::Planter(PlanterCommand::List) => cmd_planter_list(&ws),
        Command::Tree(TreeCommand::Save(args)) => cmd_tree_save(&ws, args).await,
        Command::Tree(TreeCommand::List(args)) => cmd_tree_list(&ws, args),
        Command::Tree(TreeCommand::MarkUploaded(args)) => cmd_mark_uploaded(&ws, args).await,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

async fn cmd_planter_add(ws: &Workspace, args: PlanterAddArgs) -> anyhow::Result<()> {
    let mut planter = DetachedPlanter::new(PlanterProfile {
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        organization: args.organization,
        phone_number: args.phone,
        identifier: args.identifier,
        created_at: None,
    });
    planter.set_accepted_terms(args.accept_terms);
    let detail = planter.into_detail();

    let mut work = UnitOfWork::new(ws.records.as_ref());
    work.insert_planter(detail.clone());
    work.commit().await?;

    if ws.json() {
        return print_json(&detail);
    }
    println!("{} Added planter {}", "✓".green().bold(), detail.id.to_string().yellow());
    if let Some(name) = detail.profile.display_name() {
        println!("  Name: {name}");
    }
    Ok(())
}

async fn cmd_identify(ws: &Workspace, args: IdentifyArgs) -> anyhow::Result<()> {
    let planter = ws.planter(&args.planter)?;
    let mut identification = Identification::new(planter.id.clone());
    if let Some(path) = &args.photo {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let key = format!("identification-{}", identification.id);
        let photo = ws.documents.store(&bytes, &key).await?;
        identification = identification.with_photo(photo);
    }

    let mut work = UnitOfWork::new(ws.records.as_ref());
    work.insert_identification(identification.clone());
    if let Err(e) = work.commit().await {
        if let Some(photo) = &identification.photo {
            ws.config
                .service
                .orphaned_photos
                .discard(ws.documents.as_ref(), photo)
                .await;
        }
        return Err(e.into());
    }

    if ws.json() {
        return print_json(&identification);
    }
    println!(
        "{} Identified planter {} as {}",
        "✓".green().bold(),
        planter.id.short_id().yellow(),
        identification.id.to_string().cyan()
    );
    if let Some(photo) = &identification.photo {
        println!("  Photo: {photo}");
    }
    Ok(())
}

#[derive(Serialize)]
struct PlanterView<'a> {
    planter: &'a PlanterDetail,
    latest_identification: Option<&'a IdentificationId>,
    identifications: &'a [Identification],
}

fn cmd_planter_show(ws: &Workspace, args: PlanterShowArgs) -> anyhow::Result<()> {
    let planter = ws.planter(&args.planter)?;
    let mut identifications = ws.records.identifications_of(&planter.id)?;
    identifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let latest = resolve_latest(&identifications).map(|i| i.id.clone());

    if ws.json() {
        return print_json(&PlanterView {
            planter: &planter,
            latest_identification: latest.as_ref(),
            identifications: &identifications,
        });
    }

    let profile = &planter.profile;
    println!("Planter {}", planter.id.to_string().yellow().bold());
    println!("  Name:         {}", or_dash(profile.display_name().as_deref()));
    println!("  Email:        {}", or_dash(profile.email.as_deref()));
    println!("  Phone:        {}", or_dash(profile.phone_number.as_deref()));
    println!("  Organization: {}", or_dash(profile.organization.as_deref()));
    println!("  Identifier:   {}", or_dash(profile.identifier.as_deref()));
    let terms = if planter.accepted_terms {
        "accepted"
    } else {
        "not accepted"
    };
    println!("  Terms:        {terms}");
    println!("  Uploaded:     {}", planter.uploaded);
    println!("Identifications: {}", identifications.len().to_string().bold());
    for identification in &identifications {
        let marker = if latest.as_ref() == Some(&identification.id) {
            "*".green().bold()
        } else {
            " ".normal()
        };
        let created = identification
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "undated".into());
        println!(
            "  {} {}  {}  {} trees",
            marker,
            identification.id.short_id().cyan(),
            created,
            identification.trees.len()
        );
    }
    Ok(())
}

fn cmd_planter_list(ws: &Workspace) -> anyhow::Result<()> {
    let planters = ws.records.planters()?;
    if ws.json() {
        return print_json(&planters);
    }
    if planters.is_empty() {
        println!("No planters.");
        return Ok(());
    }
    for planter in &planters {
        println!(
            "{}  {:<24}  {} identifications",
            planter.id.short_id().yellow(),
            or_dash(planter.profile.display_name().as_deref()),
            planter.identifications.len()
        );
    }
    Ok(())
}

fn print_tree(tree: &TreeCapture) {
    let status = if tree.uploaded {
        "uploaded".green()
    } else {
        "pending".yellow()
    };
    println!(
        "{}  {}  {:.6}, {:.6} ±{}m  {}",
        tree.id.short_id().cyan(),
        tree.created_at.format("%Y-%m-%d %H:%M"),
        tree.latitude,
        tree.longitude,
        tree.horizontal_accuracy,
        status
    );
}

async fn cmd_tree_save(ws: &Workspace, args: TreeSaveArgs) -> anyhow::Result<()> {
    let planter = ws.planter(&args.planter)?;
    let image = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("reading {}", args.image.display()))?;
    let location = Location::new(args.lat, args.lon, args.accuracy);
    location.validate()?;

    let tree = ws
        .service()
        .save_tree(TreeServiceData::new(image, location), &planter)
        .await?;

    if ws.json() {
        return print_json(&tree);
    }
    println!("{} Saved tree {}", "✓".green().bold(), tree.id.to_string().cyan());
    println!("  Identification: {}", tree.identification.to_string().yellow());
    println!("  Photo: {}", tree.photo);
    Ok(())
}

fn cmd_tree_list(ws: &Workspace, args: TreeListArgs) -> anyhow::Result<()> {
    let mut trees = ws.records.tree_captures()?;
    if let Some(id) = &args.planter {
        let planter = ws.planter(id)?;
        trees.retain(|tree| planter.identifications.contains(&tree.identification));
    }
    trees.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    if ws.json() {
        return print_json(&trees);
    }
    if trees.is_empty() {
        println!("No tree captures.");
        return Ok(());
    }
    for tree in &trees {
        print_tree(tree);
    }
    Ok(())
}

async fn cmd_mark_uploaded(ws: &Workspace, args: MarkUploadedArgs) -> anyhow::Result<()> {
    let tree = ws
        .records
        .tree_capture(&args.tree)?
        .with_context(|| format!("tree capture {} not found", args.tree))?;
    if tree.uploaded {
        if ws.json() {
            return print_json(&tree);
        }
        println!("Tree {} is already uploaded.", tree.id.short_id().cyan());
        return Ok(());
    }

    let mut work = UnitOfWork::new(ws.records.as_ref());
    work.set_tree_uploaded(&tree.id, true);
    work.commit().await?;

    if ws.json() {
        let updated = ws
            .records
            .tree_capture(&tree.id)?
            .with_context(|| format!("tree capture {} vanished after commit", tree.id))?;
        return print_json(&updated);
    }
    println!("{} Marked tree {} as uploaded", "✓".green().bold(), tree.id.short_id().cyan());
    Ok(())
}
