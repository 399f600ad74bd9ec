//! # Texel Editor
//!
//! Session state behind the texel density window.
//!
//! ## Scopes
//! - Scene object: one node of the open scene, active descendants only
//! - Asset: one prefab, inactive descendants included
//! - Folder: every prefab under a folder, inactive descendants included
//!
//! Each calculation replaces the previous report; the settings are kept
//! for the lifetime of the session.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use texel_assets::Project;
use texel_core::{run_batch, run_batch_parallel, BatchReport, DensityConfig};

pub use texel_core::RESOLUTION_PRESETS;

/// What a calculation runs over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// A node of the open scene, by name
    SceneObject(String),
    /// A single prefab asset, by path
    Asset(PathBuf),
    /// Every prefab under a folder
    Folder(PathBuf),
}

impl Scope {
    /// Whether enumeration includes inactive nodes
    ///
    /// Instantiated assets may start inactive, so asset scopes include them.
    pub fn include_inactive(&self) -> bool {
        !matches!(self, Self::SceneObject(_))
    }
}

/// Texel density tool session
#[derive(Debug, Default)]
pub struct DensityTool {
    /// Current settings
    pub config: DensityConfig,
    /// Evaluate roots on the rayon pool
    pub parallel: bool,
    last_report: Option<BatchReport>,
}

impl DensityTool {
    /// Create a session with the given settings
    pub fn new(config: DensityConfig) -> Self {
        Self {
            config,
            parallel: false,
            last_report: None,
        }
    }

    /// Select the next resolution preset, wrapping around
    pub fn cycle_resolution(&mut self) -> u32 {
        let next = RESOLUTION_PRESETS
            .iter()
            .position(|&r| r == self.config.texture_resolution)
            .map(|i| RESOLUTION_PRESETS[(i + 1) % RESOLUTION_PRESETS.len()])
            .unwrap_or(RESOLUTION_PRESETS[0]);
        self.config.texture_resolution = next;
        next
    }

    /// Run a calculation over `scope` and keep its report
    ///
    /// The previous report is discarded first, so a failed calculation
    /// leaves no stale results behind.
    pub fn calculate(&mut self, project: &Project, scope: &Scope) -> anyhow::Result<&BatchReport> {
        self.last_report = None;
        self.config.validate().context("invalid texel density settings")?;

        let include_inactive = scope.include_inactive();
        let report = match scope {
            Scope::SceneObject(name) => {
                let node = project
                    .scene
                    .find_by_name(name)
                    .ok_or_else(|| anyhow!("no scene object named '{}'", name))?;
                let roots = [(name.clone(), node)];
                self.run(&roots, &project.scene, include_inactive)?
            }
            Scope::Asset(path) => {
                let id = project
                    .assets
                    .get_id_by_path(path)
                    .ok_or_else(|| anyhow!("no asset at {}", path.display()))?;
                let roots = [(path.display().to_string(), id)];
                self.run(&roots, &project.assets, include_inactive)?
            }
            Scope::Folder(folder) => {
                let roots = project.assets.prefab_roots(folder);
                log::info!("Found {} prefab(s) under {}", roots.len(), folder.display());
                self.run(&roots, &project.assets, include_inactive)?
            }
        };

        Ok(self.last_report.insert(report))
    }

    fn run<R, E>(&self, roots: &[(String, R)], enumerator: &E, include_inactive: bool) -> anyhow::Result<BatchReport>
    where
        R: Sync,
        E: texel_core::MeshEnumerator<R> + Sync,
    {
        let report = if self.parallel {
            run_batch_parallel(roots, enumerator, &self.config, include_inactive)?
        } else {
            run_batch(roots, enumerator, &self.config, include_inactive)?
        };
        Ok(report)
    }

    /// Report of the last calculation
    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    /// Discard the last report
    pub fn clear(&mut self) {
        self.last_report = None;
    }
}
