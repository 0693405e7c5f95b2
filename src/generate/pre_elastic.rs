//! NVT umbrella runs at the equilibrium box length of each NPT run.
use super::{apply_edits, write_task_list, Pipeline};
use crate::cli::PreElasticArgs;
use crate::mdp::MdpBuffer;
use crate::samples::SampleTable;
use crate::settings::Settings;
use crate::tasks::TaskList;
use crate::tree::{remove_first_entry, ConfigTree};
use crate::util::{ensure_dir, stems_with_extension};
use anyhow::{ensure, Context, Result};
use serde_json::json;

const SAMPLE_HEADER_ROWS: usize = 1;

const NVT_EDITS: &[(&str, &str)] = &[
    ("pcoupl", "No"),
    ("nstxout", "100000"),
    ("nstvout", "100000"),
    ("nstfout", "100000"),
    ("nstxtcout", "100000"),
    ("nstenergy", "100000"),
    ("gen-vel", "yes"),
];

pub fn run_pre_elastic(settings: &Settings, args: &PreElasticArgs) -> Result<()> {
    ensure!(
        args.percent > 0.0 && args.percent <= 1.0,
        "--percent must be within (0, 1] (got {})",
        args.percent
    );
    let template = ConfigTree::load(&settings.template_path(&args.template, "json"))?;
    let base = base_tree(template, settings.walkers, args.nproc, args.runtime)?;
    tracing::trace!(tree = %base.value(), "base configuration tree");
    let ids = stems_with_extension(&args.source, "dat")?;
    if ids.is_empty() {
        tracing::warn!(source = %args.source.display(), "no .dat files found");
    }

    ensure_dir(&args.output)?;
    let mut pipeline = Pipeline::new(settings);
    let mut tasks = TaskList::new();
    for id in ids {
        let source = |extension: &str| args.source.join(format!("{id}.{extension}"));

        let mut mdp = MdpBuffer::load(&source("mdp"))?;
        apply_edits(&mut mdp, NVT_EDITS);
        let mdp_path = args.output.join(format!("{id}.mdp"));
        mdp.write(&mdp_path)?;

        let samples = SampleTable::load(&source("dat"), SAMPLE_HEADER_ROWS)?;
        ensure!(!samples.is_empty(), "{id}.dat holds no samples");
        tracing::debug!(item = %id, rows = samples.len(), "samples loaded");
        let length = samples
            .mean_box_length_nm(args.percent)
            .with_context(|| format!("box length of {id}"))?;

        let init_gro = args.output.join(format!("{id}-init.gro"));
        pipeline.trjconv_box(&id, &source("gro"), &source("tpr"), length, &init_gro)?;
        pipeline.grompp(&id, &mdp_path, &init_gro, &args.output.join(format!("{id}.tpr")))?;
        for walker in 0..settings.walkers {
            let tpr_path = args.output.join(format!("{id}{walker}.tpr"));
            pipeline.grompp(&id, &mdp_path, &init_gro, &tpr_path)?;
        }

        item_tree(&base, &id, length)?.write(&args.output.join(format!("{id}.json")))?;
        tracing::info!(item = %id, box_length_nm = length, "pre-elastic item generated");
        tasks.push(id);
    }

    write_task_list(&tasks, &args.output.join(&settings.task_file))?;
    pipeline.finish()
}

/// Drivers per walker, and the box CV dropped along with its umbrella terms.
fn base_tree(
    mut tree: ConfigTree,
    walkers: usize,
    processors: u32,
    md_steps: u64,
) -> Result<ConfigTree> {
    tree.set_drivers(walkers, processors, md_steps);
    tree.remove_first_cv().context("drop the first CV of the template")?;
    ensure!(
        tree.cv_count() > 0,
        "template must define at least two CVs"
    );
    let method = tree.method_mut()?;
    remove_first_entry(method, "ksprings");
    remove_first_entry(method, "centers");
    Ok(tree)
}

fn item_tree(base: &ConfigTree, id: &str, length: f64) -> Result<ConfigTree> {
    let mut tree = base.clone();
    if !tree.set_observer_file(format!("{id}.chkpt")) {
        tracing::debug!(item = id, "template has no observers");
    }
    tree.set_input_file(format!("{id}.tpr"));
    // The restricted slab wraps the periodic boundary: 10% either side.
    let restriction = tree.restriction_mut(0)?;
    restriction.insert("min".to_string(), json!(0.9 * length));
    restriction.insert("max".to_string(), json!(0.1 * length));
    tree.method_mut()?
        .insert("file name".to_string(), json!(format!("{id}-umbrella.dat")));
    Ok(tree)
}
