//! Batch Evaluation
//!
//! Runs the evaluator over many roots. Each root is isolated: an error while
//! enumerating one root is logged and recorded on that root's entry, and the
//! batch moves on.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, AggregateResult};
use crate::error::ConfigError;
use crate::evaluate::{evaluate_mesh, MeshEvalResult};
use crate::mesh::MeshItem;
use crate::DensityConfig;

/// Capability that lists the mesh items under a root
///
/// Implemented by host collaborators such as the scene graph or an asset
/// database, and by any closure with the same signature.
pub trait MeshEnumerator<R: ?Sized> {
    /// Enumerate mesh items under `root`, including inactive nodes on request
    fn enumerate_mesh_items(&self, root: &R, include_inactive: bool) -> anyhow::Result<Vec<MeshItem>>;
}

impl<R: ?Sized, F> MeshEnumerator<R> for F
where
    F: Fn(&R, bool) -> anyhow::Result<Vec<MeshItem>>,
{
    fn enumerate_mesh_items(&self, root: &R, include_inactive: bool) -> anyhow::Result<Vec<MeshItem>> {
        self(root, include_inactive)
    }
}

/// Evaluation of one root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootReport {
    /// Root identifier, e.g. an object name or asset path
    pub root: String,
    /// Per-mesh results in enumeration order
    pub results: Vec<MeshEvalResult>,
    /// Overall verdict
    pub aggregate: AggregateResult,
    /// Cause, when the root could not be processed at all
    pub failure: Option<String>,
}

impl RootReport {
    /// Report for a root that failed before any mesh was evaluated
    pub fn failed(root: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            results: Vec::new(),
            aggregate: AggregateResult::default(),
            failure: Some(cause.into()),
        }
    }

    /// Whether the root could be processed
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Summary of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// No roots were submitted
    NoRoots,
    /// Every root failed to process
    AllFailed,
    /// At least one root was evaluated
    Completed {
        /// Roots that were evaluated
        evaluated: usize,
        /// Roots that failed
        failed: usize,
    },
}

/// Ordered reports of a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One entry per submitted root, in submission order
    pub entries: Vec<RootReport>,
}

impl BatchReport {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no roots were submitted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of roots that failed to process
    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_failed()).count()
    }

    /// Summarize the run
    pub fn outcome(&self) -> BatchOutcome {
        let failed = self.failed_count();
        if self.entries.is_empty() {
            BatchOutcome::NoRoots
        } else if failed == self.entries.len() {
            BatchOutcome::AllFailed
        } else {
            BatchOutcome::Completed {
                evaluated: self.entries.len() - failed,
                failed,
            }
        }
    }
}

/// Evaluate an already enumerated set of items as one root
pub fn evaluate_items(
    root: impl Into<String>,
    items: &[MeshItem],
    config: &DensityConfig,
) -> Result<RootReport, ConfigError> {
    config.validate()?;
    Ok(evaluate_root(root.into(), items, config))
}

fn evaluate_root(root: String, items: &[MeshItem], config: &DensityConfig) -> RootReport {
    let results: Vec<MeshEvalResult> = items.iter().map(|item| evaluate_mesh(item, config)).collect();
    let aggregate = aggregate(&results, config);

    if results.is_empty() {
        log::warn!("{}: no meshes found", root);
    } else if !aggregate.has_value {
        log::warn!("{}: no valid meshes out of {}", root, results.len());
    } else {
        log::debug!(
            "{}: {:.2} px/m over {}/{} meshes ({})",
            root,
            aggregate.overall_texel_density,
            aggregate.valid_mesh_count,
            aggregate.total_mesh_count,
            aggregate.overall_status
        );
    }

    RootReport {
        root,
        results,
        aggregate,
        failure: None,
    }
}

fn process_root<R, E>(id: &str, handle: &R, enumerator: &E, config: &DensityConfig, include_inactive: bool) -> RootReport
where
    E: MeshEnumerator<R> + ?Sized,
{
    match enumerator.enumerate_mesh_items(handle, include_inactive) {
        Ok(items) => evaluate_root(id.to_string(), &items, config),
        Err(err) => {
            log::error!("{}: failed to process root: {:#}", id, err);
            RootReport::failed(id, format!("{:#}", err))
        }
    }
}

fn finish(report: &BatchReport) {
    match report.outcome() {
        BatchOutcome::NoRoots => log::info!("Batch finished: no roots to evaluate"),
        BatchOutcome::AllFailed => log::error!("Batch finished: all {} root(s) failed", report.len()),
        BatchOutcome::Completed { evaluated, failed } => {
            log::info!("Batch finished: {} evaluated, {} failed", evaluated, failed)
        }
    }
}

/// Evaluate every root in order
pub fn run_batch<R, E>(
    roots: &[(String, R)],
    enumerator: &E,
    config: &DensityConfig,
    include_inactive: bool,
) -> Result<BatchReport, ConfigError>
where
    E: MeshEnumerator<R> + ?Sized,
{
    config.validate()?;

    let entries = roots
        .iter()
        .map(|(id, handle)| process_root(id, handle, enumerator, config, include_inactive))
        .collect();

    let report = BatchReport { entries };
    finish(&report);
    Ok(report)
}

/// Evaluate roots on the rayon pool; entries keep submission order
pub fn run_batch_parallel<R, E>(
    roots: &[(String, R)],
    enumerator: &E,
    config: &DensityConfig,
    include_inactive: bool,
) -> Result<BatchReport, ConfigError>
where
    R: Sync,
    E: MeshEnumerator<R> + Sync + ?Sized,
{
    config.validate()?;

    let entries = roots
        .par_iter()
        .map(|(id, handle)| process_root(id, handle, enumerator, config, include_inactive))
        .collect();

    let report = BatchReport { entries };
    finish(&report);
    Ok(report)
}
