//! Temperature sweep of NPT runs.
use super::{write_task_list, Pipeline};
use crate::cli::NptArgs;
use crate::mdp::MdpBuffer;
use crate::settings::Settings;
use crate::sweep::SweepRange;
use crate::tasks::TaskList;
use crate::util::{ensure_dir, format_number};
use anyhow::{ensure, Result};
use std::collections::HashSet;

const BAROSTAT: &str = "Parrinello-Rahman";

pub fn run_npt(settings: &Settings, args: &NptArgs) -> Result<()> {
    let range = SweepRange::new(args.tmin, args.tmax, args.dt)?;
    let coordinates = settings.template_path(&args.source, "gro");
    let mut template = MdpBuffer::load(&settings.template_path(&args.source, "mdp"))?;
    if let Some(reference) = template.get("ref-t") {
        tracing::debug!(reference, "template reference temperature");
    }
    if template.set("pcoupl", BAROSTAT) == 0 {
        tracing::warn!("template mdp has no pcoupl entry");
    }
    if range.is_empty() {
        tracing::warn!(tmin = args.tmin, tmax = args.tmax, "temperature range is empty");
    }
    let items: Vec<(f64, String)> = range.labelled(&args.prefix).collect();
    ensure_distinct_ids(&items)?;

    ensure_dir(&args.output)?;
    let mut pipeline = Pipeline::new(settings);
    let mut tasks = TaskList::new();
    for (temperature, id) in items {
        let mut mdp = template.clone();
        mdp.set("ref-t", format_number(temperature));
        let mdp_path = args.output.join(format!("{id}.mdp"));
        mdp.write(&mdp_path)?;
        let tpr_path = args.output.join(format!("{id}.tpr"));
        pipeline.grompp(&id, &mdp_path, &coordinates, &tpr_path)?;
        tracing::info!(item = %id, temperature, "npt item generated");
        tasks.push(id);
    }

    write_task_list(&tasks, &args.output.join(&settings.task_file))?;
    pipeline.finish()
}

/// Ids carry two decimals, so steps finer than that would reuse file names.
fn ensure_distinct_ids(items: &[(f64, String)]) -> Result<()> {
    let mut seen = HashSet::new();
    for (temperature, id) in items {
        ensure!(
            seen.insert(id.as_str()),
            "temperature {temperature} maps to item {id} already used by an earlier point; \
             use a step of at least 0.01"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_ids_are_rejected() {
        let fine = SweepRange::new(300.0, 300.004, 0.001).expect("valid range");
        let items: Vec<_> = fine.labelled("npt").collect();
        let err = ensure_distinct_ids(&items).expect_err("ids collide");
        assert!(err.to_string().contains("npt-300.00"), "{err}");

        let coarse = SweepRange::new(300.0, 301.0, 0.01).expect("valid range");
        let items: Vec<_> = coarse.labelled("npt").collect();
        ensure_distinct_ids(&items).expect("distinct ids");
    }
}
