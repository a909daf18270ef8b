// src/main.rs

mod cli;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use cli::{Args, Command, Target, ToolArgs};
use log::{info, warn};
use std::path::Path;
use std::time::Instant;
use tap_trace::analyzer::{self, PathAnalysis};
use tap_trace::config::AppConfig;
use tap_trace::dataset::{self, Dataset, Workspace};
use tap_trace::renderer;
use tap_trace::session::AnnotationSession;
use tap_trace::{normalize_click, Dimensions, Error};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let start_time = Instant::now();
    let config = AppConfig::load(args.config.as_deref()).context("Failed to load config")?;

    match args.command {
        Command::Report {
            folder,
            test_id,
            current,
        } => report(&folder, test_id.as_deref(), current)?,
        Command::Annotate {
            target,
            x,
            y,
            display_width,
            display_height,
            tool,
        } => annotate(&config, &target, &tool, (x, y), (display_width, display_height))?,
        Command::Retype { target, tool } => retype(&config, &target, &tool)?,
        Command::Render {
            folder,
            output,
            test_id,
        } => render(&config, &folder, &output, test_id.as_deref())?,
    }

    info!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn load_workspace(folder: &Path) -> Result<Workspace> {
    dataset::discover(folder)
        .with_context(|| format!("No valid data found in {}", folder.display()))
}

fn selected_datasets<'a>(workspace: &'a Workspace, test_id: Option<&str>) -> Result<Vec<&'a Dataset>> {
    Ok(match test_id {
        Some(id) => vec![workspace.dataset(id)?],
        None => workspace.datasets.values().collect(),
    })
}

fn report(folder: &Path, test_id: Option<&str>, current: Option<usize>) -> Result<()> {
    let workspace = load_workspace(folder)?;

    let analyses: Vec<PathAnalysis> = match test_id {
        Some(id) => {
            let dataset = workspace.dataset(id)?;
            let Some(dimensions) = dataset.dimensions else {
                bail!("Image dimensions of {} could not be read", id);
            };
            vec![analyzer::analyze_dataset(&workspace.store, id, dimensions)]
        }
        None => analyzer::analyze_workspace(&workspace),
    };

    println!(
        "Path report for {} ({})",
        folder.display(),
        Local::now().to_rfc2822()
    );
    for analysis in &analyses {
        println!();
        print!("{}", analysis);
        if let Some(step) = current.and_then(|index| analysis.highlight_step(index)) {
            println!(
                "Current image: step {} ({:.2} px)",
                analysis.step_labels()[step],
                analysis.distances[step]
            );
        }
    }
    Ok(())
}

/// Loads the workspace and positions a session on the target image
fn open_target(
    config: &AppConfig,
    target: &Target,
) -> Result<(Workspace, Dataset, AnnotationSession)> {
    let workspace = load_workspace(&target.folder)?;
    let dataset = workspace.dataset(&target.test_id)?.clone();
    let index = dataset
        .index_of(&target.image)
        .ok_or_else(|| Error::UnknownImage {
            test_id: target.test_id.clone(),
            image_id: target.image.clone(),
        })?;

    let mut session = AnnotationSession::new(&workspace.store, &dataset, config.tool_defaults);
    session.jump_to(&workspace.store, &dataset, index);
    Ok((workspace, dataset, session))
}

fn apply_tool(session: &mut AnnotationSession, tool: &ToolArgs) {
    session.tool = tool.tool.into();
    session.settings = tool.settings(session.settings);
}

/// Exports the store. A failed export is reported and leaves the
/// previous file in place; the edit itself is not treated as failed.
fn save(workspace: &Workspace) -> bool {
    match workspace.save() {
        Ok(path) => {
            println!("Interactions exported to {}", path.display());
            true
        }
        Err(e) => {
            warn!("Error exporting interactions: {}", e);
            false
        }
    }
}

fn annotate(
    config: &AppConfig,
    target: &Target,
    tool: &ToolArgs,
    (x, y): (f64, f64),
    (display_width, display_height): (Option<u32>, Option<u32>),
) -> Result<()> {
    let (mut workspace, dataset, mut session) = open_target(config, target)?;
    apply_tool(&mut session, tool);

    let displayed = match (display_width, display_height, dataset.dimensions) {
        (Some(width), Some(height), _) => Dimensions::new(width, height),
        (width, height, Some(dims)) => {
            Dimensions::new(width.unwrap_or(dims.width), height.unwrap_or(dims.height))
        }
        _ => bail!("Image size unknown; pass --display-width and --display-height"),
    };
    let point = normalize_click(x, y, displayed).context("Click lies outside the displayed image")?;

    session
        .record_click(&mut workspace.store, &dataset, point)
        .context("Could not record the click")?;

    if let Some(view) = session.view(&workspace.store, &dataset) {
        println!("{} [{}] {}", view.label, view.tool, view.grounding_text);
        if !view.can_export {
            println!("Slide start recorded; annotate the same image again to set its end.");
        }
    }
    save(&workspace);
    Ok(())
}

fn retype(config: &AppConfig, target: &Target, tool: &ToolArgs) -> Result<()> {
    let (mut workspace, dataset, mut session) = open_target(config, target)?;
    apply_tool(&mut session, tool);

    if !session.commit_pending_edit(&mut workspace.store, &dataset) {
        println!("{}: nothing to change", target.image);
        return Ok(());
    }
    if let Some(view) = session.view(&workspace.store, &dataset) {
        println!("{} [{}] {}", view.label, view.tool, view.grounding_text);
    }
    save(&workspace);
    Ok(())
}

fn render(config: &AppConfig, folder: &Path, output: &Path, test_id: Option<&str>) -> Result<()> {
    let workspace = load_workspace(folder)?;
    for dataset in selected_datasets(&workspace, test_id)? {
        let target = output.join(&dataset.test_id);
        let count = renderer::render_dataset(dataset, &workspace.store, &target, &config.overlay)
            .with_context(|| format!("Failed to render {}", dataset.test_id))?;
        info!("Rendered {} images to {}", count, target.display());
    }
    Ok(())
}
