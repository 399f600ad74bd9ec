//! # Texel CLI
//!
//! Command-line interface for texel density checks.
//!
//! ## Commands
//! - `object` - Check one object of the manifest scene
//! - `asset` - Check one prefab asset
//! - `folder` - Check every prefab under a folder

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use texel_assets::ProjectManifest;
use texel_core::{BatchOutcome, BatchReport, DensityConfig};
use texel_editor::{DensityTool, Scope};

/// Texel density checker
#[derive(Parser)]
#[command(name = "texel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project manifest (JSON)
    #[arg(short, long, default_value = "texel.json")]
    pub manifest: PathBuf,

    /// Texture resolution in pixels (512, 1024, 2048, 4096 or any positive value)
    #[arg(short, long)]
    pub resolution: Option<u32>,

    /// Target texel density in pixels per meter
    #[arg(short, long, allow_negative_numbers = true)]
    pub target: Option<f32>,

    /// Allowed deviation from the target, in percent
    #[arg(long, allow_negative_numbers = true)]
    pub tolerance: Option<f32>,

    /// Evaluate roots in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check one object of the scene (active descendants only)
    Object {
        /// Object name
        name: String,
    },

    /// Check one prefab asset (inactive descendants included)
    Asset {
        /// Asset path
        path: PathBuf,
    },

    /// Check every prefab under a folder (inactive descendants included)
    Folder {
        /// Folder path
        path: PathBuf,
    },
}

impl Cli {
    /// Settings from the manifest, overridden by command-line flags
    pub fn resolve_config(&self, saved: Option<DensityConfig>) -> DensityConfig {
        let mut config = saved.unwrap_or_default();
        if let Some(resolution) = self.resolution {
            config.texture_resolution = resolution;
        }
        if let Some(target) = self.target {
            config.target_texel_density = target;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance_percent = tolerance;
        }
        config
    }

    /// Scope selected by the subcommand
    pub fn scope(&self) -> Scope {
        match &self.command {
            Commands::Object { name } => Scope::SceneObject(name.clone()),
            Commands::Asset { path } => Scope::Asset(path.clone()),
            Commands::Folder { path } => Scope::Folder(path.clone()),
        }
    }
}

/// Render a report as plain text
pub fn render_report(report: &BatchReport, config: &DensityConfig) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, report, config);
    out
}

fn write_report(out: &mut String, report: &BatchReport, config: &DensityConfig) -> fmt::Result {
    writeln!(
        out,
        "Resolution {} px, target {:.2} px/m, tolerance {:.1}%",
        config.texture_resolution,
        config.target_texel_density,
        config.effective_tolerance()
    )?;

    for entry in &report.entries {
        writeln!(out)?;
        writeln!(out, "{}", entry.root)?;

        if let Some(failure) = &entry.failure {
            writeln!(out, "  failed: {}", failure)?;
            continue;
        }

        for result in &entry.results {
            writeln!(
                out,
                "  {:<24} {:<5} {:>10.2} px/m  world {:>10.4} m2  uv {:>8.4}",
                result.name,
                result.status.label(),
                result.texel_density,
                result.world_area,
                result.uv_area
            )?;
        }

        let aggregate = &entry.aggregate;
        if aggregate.has_value {
            writeln!(
                out,
                "  overall {:.2} px/m {} ({}/{} meshes valid)",
                aggregate.overall_texel_density,
                aggregate.overall_status.label(),
                aggregate.valid_mesh_count,
                aggregate.total_mesh_count
            )?;
        } else if aggregate.total_mesh_count == 0 {
            writeln!(out, "  overall ERROR (no meshes found)")?;
        } else {
            writeln!(out, "  overall ERROR (0/{} meshes valid)", aggregate.total_mesh_count)?;
        }
    }

    writeln!(out)?;
    match report.outcome() {
        BatchOutcome::NoRoots => writeln!(out, "Nothing to check."),
        BatchOutcome::AllFailed => writeln!(out, "All {} root(s) failed.", report.len()),
        BatchOutcome::Completed { evaluated, failed } => {
            writeln!(out, "{} root(s) checked, {} failed.", evaluated, failed)
        }
    }
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let manifest = ProjectManifest::load(&cli.manifest)
        .with_context(|| format!("failed to load {}", cli.manifest.display()))?;
    let project = manifest.into_project();

    let config = cli.resolve_config(project.config);
    let mut tool = DensityTool::new(config);
    tool.parallel = cli.parallel;

    let scope = cli.scope();
    log::debug!("Scope: {:?}, settings: {:?}", scope, config);
    let report = tool.calculate(&project, &scope)?;

    println!("{}", format_output(report, &config, cli.json)?);
    Ok(())
}

/// Text or JSON rendering of a report
pub fn format_output(report: &BatchReport, config: &DensityConfig, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(report)?)
    } else {
        Ok(render_report(report, config).trim_end().to_string())
    }
}
