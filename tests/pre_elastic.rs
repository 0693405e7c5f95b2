#![cfg(unix)]

mod common;

use common::{assert_close, assert_success, stderr, Workspace};

const NPT_MDP: &str = "\
integrator               = md
nstxout                  = 5000
nstenergy                = 5000
ref-t                    = 300.0
pcoupl                   = Parrinello-Rahman
gen-vel                  = no
";

// Column 1 is the box length in Angstrom; the trailing half averages 40.
const SAMPLES: &str = "\
step  box_x
0     10.0
1     10.0
2     40.0
3     40.0
";

fn pre_elastic_workspace(template: &str) -> Workspace {
    let workspace = Workspace::new();
    workspace.write("template/template.json", template);
    for id in ["npt-300.00", "npt-301.00"] {
        workspace.write(&format!("npt/{id}.mdp"), NPT_MDP);
        workspace.write(&format!("npt/{id}.dat"), SAMPLES);
        workspace.write(&format!("npt/{id}.gro"), "system\n0\n   4.0   4.0   4.0\n");
        workspace.write(&format!("npt/{id}.tpr"), "");
    }
    workspace
}

#[test]
fn builds_umbrella_runs_at_average_box_length() {
    let workspace = pre_elastic_workspace(r#"{"CVs":[{"restriction":{}},{"restriction":{}}]}"#);
    let output = workspace.run(&["--walkers", "2", "pre-elastic", "--percent", "0.5"]);
    assert_success(&output);

    assert_eq!(
        workspace.read("preelastic/args.list"),
        "npt-300.00\nnpt-301.00\n"
    );

    let tree = workspace.json("preelastic/npt-300.00.json");
    assert_eq!(tree["CVs"].as_array().map(Vec::len), Some(1));
    assert_close(&tree["CVs"][0]["restriction"]["min"], 3.6);
    assert_close(&tree["CVs"][0]["restriction"]["max"], 0.4);
    assert_eq!(tree["inputfile"], "npt-300.00.tpr");
    assert_eq!(tree["method"]["file name"], "npt-300.00-umbrella.dat");
    assert_eq!(tree["driver"].as_array().map(Vec::len), Some(2));
    assert_eq!(tree["driver"][1]["number processors"], 8);
    assert_eq!(tree["driver"][1]["MDSteps"], 100_000_000);
    assert_eq!(tree["driver"][1]["logfile"], "node-1");

    let mdp = workspace.read("preelastic/npt-300.00.mdp");
    assert!(mdp.contains("pcoupl                   = No\n"), "{mdp}");
    assert!(mdp.contains("gen-vel                  = yes\n"), "{mdp}");
    assert!(mdp.contains("nstxout                  = 100000\n"), "{mdp}");
    assert!(mdp.contains("ref-t                    = 300.0\n"), "{mdp}");

    let calls = workspace.calls();
    assert_eq!(calls.len(), 8, "calls: {calls:?}");
    assert_eq!(
        calls[0],
        "trjconv -f npt/npt-300.00.gro -s npt/npt-300.00.tpr -box 4.00000 4.00000 4.00000 \
         -o preelastic/npt-300.00-init.gro|group=0|backup=-1"
    );
    let outputs: Vec<&str> = calls[1..4]
        .iter()
        .map(|call| call.split(" -o ").nth(1).unwrap_or_default())
        .collect();
    assert_eq!(
        outputs,
        [
            "preelastic/npt-300.00.tpr|group=|backup=-1",
            "preelastic/npt-300.000.tpr|group=|backup=-1",
            "preelastic/npt-300.001.tpr|group=|backup=-1",
        ]
    );
    assert!(calls[1].contains("-c preelastic/npt-300.00-init.gro"));
}

#[test]
fn keeps_template_fields_and_trims_umbrella_terms() {
    let workspace = pre_elastic_workspace(
        r#"{
    "observers": [{"type": "JSON", "file name": "template.chkpt"}],
    "CVs": [{"type": "Box"}, {"type": "ParticlePosition", "restriction": {"dimension": "z"}}],
    "method": {"type": "Umbrella", "ksprings": [100, 200], "centers": [1.0, 2.0]},
    "extra": {"kept": true}
}"#,
    );
    let output = workspace.run(&["pre-elastic", "--nproc", "4", "--runtime", "1000"]);
    assert_success(&output);

    let tree = workspace.json("preelastic/npt-301.00.json");
    assert_eq!(tree["observers"][0]["file name"], "npt-301.00.chkpt");
    assert_eq!(tree["CVs"][0]["type"], "ParticlePosition");
    assert_eq!(tree["CVs"][0]["restriction"]["dimension"], "z");
    assert_eq!(tree["method"]["ksprings"], serde_json::json!([200]));
    assert_eq!(tree["method"]["centers"], serde_json::json!([2.0]));
    assert_eq!(tree["extra"]["kept"], true);
    assert_eq!(tree["driver"].as_array().map(Vec::len), Some(4));
    assert_eq!(tree["driver"][0]["number processors"], 4);

    let text = workspace.read("preelastic/npt-301.00.json");
    assert!(text.starts_with("{\n    \"observers\""), "{text}");
}

#[test]
fn template_without_enough_cvs_fails() {
    let workspace = pre_elastic_workspace(r#"{"CVs": []}"#);
    let output = workspace.run(&["pre-elastic"]);
    assert!(!output.status.success());
    assert!(workspace.calls().is_empty());
    assert!(stderr(&output).contains("CV"), "{}", stderr(&output));
}

#[test]
fn percent_outside_unit_interval_is_rejected() {
    let workspace = pre_elastic_workspace(r#"{"CVs":[{},{}]}"#);
    let output = workspace.run(&["pre-elastic", "--percent", "1.5"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--percent"), "{}", stderr(&output));
}
