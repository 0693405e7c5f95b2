//! Per-item generation pipelines.
//!
//! Every generator walks its work items in order: rewrite settings, write
//! the configuration tree, call the engine, and flush the task list once the
//! loop is done.
mod elastic;
mod npt;
mod pre_elastic;
mod report;

pub use elastic::run_elastic;
pub use npt::run_npt;
pub use pre_elastic::run_pre_elastic;

use crate::engine::{Engine, Grompp};
use crate::mdp::MdpBuffer;
use crate::settings::Settings;
use crate::tasks::TaskList;
use crate::util::display_path;
use anyhow::Result;
use report::FailureReport;
use std::path::{Path, PathBuf};

/// Engine access plus the failure report for one run.
pub(crate) struct Pipeline {
    engine: Engine,
    topology: PathBuf,
    failures: FailureReport,
}

impl Pipeline {
    pub(crate) fn new(settings: &Settings) -> Self {
        let engine = Engine::new(settings.gmx.clone(), settings.keep_backups);
        tracing::info!(
            engine = %engine.exe().display(),
            topology = %settings.topology.display(),
            walkers = settings.walkers,
            "pipeline ready"
        );
        Self {
            engine,
            topology: settings.topology.clone(),
            failures: FailureReport::new(settings.fail_fast),
        }
    }

    pub(crate) fn grompp(
        &mut self,
        item: &str,
        mdp: &Path,
        coordinates: &Path,
        output: &Path,
    ) -> Result<()> {
        let invocation = self.engine.grompp(&Grompp {
            mdp,
            coordinates,
            topology: &self.topology,
            output,
        })?;
        self.failures.record(item, invocation)
    }

    pub(crate) fn trjconv_box(
        &mut self,
        item: &str,
        input: &Path,
        structure: &Path,
        length: f64,
        output: &Path,
    ) -> Result<()> {
        let invocation = self.engine.trjconv_box(input, structure, length, output)?;
        self.failures.record(item, invocation)
    }

    pub(crate) fn finish(self) -> Result<()> {
        tracing::info!(
            failed = self.failures.failures().len(),
            "pipeline finished"
        );
        self.failures.finish()
    }
}

/// Apply `key = value` edits; absent keys are skipped.
pub(crate) fn apply_edits(mdp: &mut MdpBuffer, edits: &[(&str, &str)]) {
    for (key, value) in edits {
        if mdp.set(key, value) == 0 {
            tracing::debug!(key, "mdp key absent, left unchanged");
        }
    }
}

pub(crate) fn write_task_list(tasks: &TaskList, path: &Path) -> Result<()> {
    tasks.write(path)?;
    let cwd = std::env::current_dir().ok();
    println!(
        "wrote {} ({} items)",
        display_path(path, cwd.as_deref()),
        tasks.len()
    );
    Ok(())
}
