//! Splay, twist and bend runs built from pre-elastic output.
//!
//! Every work item is written once per deformation mode, each mode in its
//! own directory with its own copy of the task list.
use super::{apply_edits, write_task_list, Pipeline};
use crate::cli::ElasticArgs;
use crate::gro::BoxVectors;
use crate::mdp::MdpBuffer;
use crate::settings::Settings;
use crate::tasks::TaskList;
use crate::tree::ConfigTree;
use crate::util::ensure_dir;
use anyhow::{ensure, Context, Result};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy)]
struct Mode {
    name: &'static str,
    director: [u8; 3],
    dimension: &'static str,
}

const MODES: [Mode; 3] = [
    Mode {
        name: "splay",
        director: [1, 0, 0],
        dimension: "x",
    },
    Mode {
        name: "twist",
        director: [0, 1, 0],
        dimension: "x",
    },
    Mode {
        name: "bend",
        director: [1, 0, 0],
        dimension: "z",
    },
];

const NVT_EDITS: &[(&str, &str)] = &[
    ("pcoupl", "No"),
    ("nstxout", "10000000"),
    ("nstvout", "10000000"),
    ("nstfout", "10000000"),
    ("nstxtcout", "10000000"),
    ("nstenergy", "1000000"),
    ("gen-vel", "No"),
];

pub fn run_elastic(settings: &Settings, args: &ElasticArgs) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&args.frac),
        "--frac must be within [0, 1] (got {})",
        args.frac
    );
    let template = ConfigTree::load(&settings.template_path(&args.template, "json"))?;
    let base = base_tree(template, settings.walkers, args.nproc, args.runtime)?;
    tracing::trace!(tree = %base.value(), "base configuration tree");
    let ids = TaskList::read(&args.source.join(&settings.task_file))?.sorted();
    if ids.is_empty() {
        tracing::warn!(source = %args.source.display(), "task list is empty");
    }

    let mode_dirs: Vec<PathBuf> = MODES.iter().map(|mode| args.output.join(mode.name)).collect();
    for dir in &mode_dirs {
        ensure_dir(dir)?;
    }

    let mut pipeline = Pipeline::new(settings);
    let mut tasks = TaskList::new();
    for id in ids.entries() {
        let source = |suffix: &str| args.source.join(format!("{id}{suffix}"));

        let mut mdp = MdpBuffer::load(&source(".mdp"))?;
        apply_edits(&mut mdp, NVT_EDITS);
        let vectors = BoxVectors::load(&source("-init.gro"))?;
        if !vectors.is_rectangular() {
            tracing::warn!(item = %id, "triclinic box, using the x component of the first vector");
        }
        let length = vectors.length_x();

        let mut tree = base.clone();
        if !tree.set_observer_file(format!("{id}.chkpt")) {
            tracing::debug!(item = %id, "template has no observers");
        }
        tree.set_input_file(format!("{id}.tpr"));

        for (mode, dir) in MODES.iter().zip(&mode_dirs) {
            let mdp_path = dir.join(format!("{id}.mdp"));
            mdp.write(&mdp_path)?;
            pipeline.grompp(id, &mdp_path, &source("0.gro"), &dir.join(format!("{id}.tpr")))?;
            for walker in 0..settings.walkers {
                pipeline.grompp(
                    id,
                    &mdp_path,
                    &source(&format!("{walker}.gro")),
                    &dir.join(format!("{id}{walker}.tpr")),
                )?;
            }
            configure_mode(&mut tree, mode, id, length, args.frac)
                .with_context(|| format!("configure {} tree for {id}", mode.name))?;
            tree.write(&dir.join(format!("{id}.json")))?;
        }
        tracing::info!(item = %id, box_length_nm = length, "elastic item generated");
        tasks.push(id.as_str());
    }

    for dir in &mode_dirs {
        write_task_list(&tasks, &dir.join(&settings.task_file))?;
    }
    pipeline.finish()
}

/// Drivers, the umbrella constraint, the basis-function method and its grid.
fn base_tree(
    mut tree: ConfigTree,
    walkers: usize,
    processors: u32,
    md_steps: u64,
) -> Result<ConfigTree> {
    ensure!(
        tree.cv_count() >= 2,
        "template must define a central and an edge CV"
    );
    tree.set_drivers(walkers, processors, md_steps);
    tree.set(
        "constraints",
        json!([{
            "type": "Umbrella",
            "ksprings": [0, 1e6],
            "centers": [0, 1.0],
            "log_frequency": 1000
        }]),
    );
    tree.set(
        "method",
        json!({
            "type": "Basis",
            "cycle_frequency": 10_000_000,
            "frequency": 1,
            "weight": 1.0,
            "CV_coefficients": [2],
            "CV_restraint_spring_constants": [0],
            "CV_restraint_minimums": [-0.52],
            "CV_restraint_maximums": [0.52],
            "tolerance": 1e-6,
            "convergence_exit": true
        }),
    );
    tree.set(
        "grid",
        json!({
            "lower": [-0.3],
            "upper": [0.3],
            "number_points": [100],
            "periodic": [false]
        }),
    );
    Ok(tree)
}

/// CV 0 restricts the central slab, CV 1 the slab straddling the boundary.
fn configure_mode(
    tree: &mut ConfigTree,
    mode: &Mode,
    id: &str,
    length: f64,
    frac: f64,
) -> Result<()> {
    tree.constraint_mut(0)?
        .insert("file_name".to_string(), json!(format!("{id}-umbrella.dat")));
    let method = tree.method_mut()?;
    method.insert("basis_filename".to_string(), json!(id));
    method.insert("coeff_filename".to_string(), json!(id));

    tree.cv_mut(0)?
        .insert("director".to_string(), json!(mode.director));
    let central = tree.restriction_mut(0)?;
    central.insert("dimension".to_string(), json!(mode.dimension));
    central.insert("min".to_string(), json!(0.5 * length * (1.0 - frac)));
    central.insert("max".to_string(), json!(0.5 * length * (1.0 + frac)));

    let edge = tree.restriction_mut(1)?;
    edge.insert("dimension".to_string(), json!(mode.dimension));
    edge.insert("min".to_string(), json!((1.0 - 0.5 * frac) * length));
    edge.insert("max".to_string(), json!(0.5 * frac * length));
    Ok(())
}
