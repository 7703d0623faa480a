use camino::Utf8PathBuf;
use stackblocks::GraphConfig;
use stackblocks::script::{ScriptRunner, ScriptStep, load_script};
use std::fs;
use tempfile::tempdir;

const SCRIPT: &str = r#"[
  { "op": "add", "name": "loop", "kind": "repeat", "at": { "x": 0, "y": 0 } },
  { "op": "add", "name": "step", "kind": "forward", "at": { "x": 200, "y": 200 } },
  { "op": "add", "name": "count", "kind": "number", "value": "4" },
  { "op": "connect", "parent": "loop", "dock": 1, "child": "count" },
  { "op": "connect", "parent": "loop", "dock": 2, "child": "step" },
  { "op": "clamp_body", "block": "loop", "delta": -1 },
  { "op": "clamp_body", "block": "loop", "delta": 1 },
  { "op": "relabel", "block": "count", "value": 8 },
  { "op": "undo" }
]"#;

#[test]
fn script_replays_and_records_rejections() {
    let dir = tempdir().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("edit.json")).expect("utf8 path");
    fs::write(&path, SCRIPT).expect("write script");

    let steps = load_script(&path).expect("load script");
    assert_eq!(steps.len(), 9);
    assert_eq!(steps[8], ScriptStep::Undo);

    let mut runner = ScriptRunner::new(GraphConfig::default());
    runner.run(&steps).expect("replay");

    // Shrinking a one-row body is refused but does not stop the script.
    assert_eq!(runner.rejected().len(), 1);
    assert_eq!(runner.rejected()[0].step, 5);

    let graph = runner.graph();
    let count = runner.id("count").expect("count");
    let looped = runner.id("loop").expect("loop");
    let step = runner.id("step").expect("step");
    // The relabel was undone, the body growth was not.
    assert_eq!(
        graph.block(count).expect("count").value(),
        Some(&stackblocks::BlockValue::Number(4.0))
    );
    assert_eq!(
        graph.block(looped).expect("loop").configuration().clamp_body_counts,
        vec![2]
    );
    assert_eq!(graph.block(step).expect("step").parent(), Some(looped));
    assert!(runner.history().can_redo());

    let snapshot = runner.snapshot(true);
    assert_eq!(snapshot.roots, vec!["loop".to_string()]);
    let json = serde_json::to_value(&snapshot).expect("serialize snapshot");
    assert_eq!(json["blocks"][0]["kind"], "repeat");
    assert_eq!(json["blocks"][0]["connections"][2], "step");
    assert!(json["events"].as_array().is_some_and(|e| !e.is_empty()));
}

#[test]
fn drag_steps_snap_and_cancel() {
    let steps: Vec<ScriptStep> = serde_json::from_str(
        r#"[
          { "op": "add", "name": "start", "kind": "start" },
          { "op": "add", "name": "step", "kind": "forward", "at": { "x": 0, "y": 300 } },
          { "op": "drag", "block": "step", "dx": 20, "dy": -260, "cancel": true },
          { "op": "drag", "block": "step", "dx": 22, "dy": -255, "snap": true },
          { "op": "toggle", "block": "start" }
        ]"#,
    )
    .expect("parse steps");

    let mut runner = ScriptRunner::new(GraphConfig::default());
    runner.run(&steps).expect("replay");
    assert!(runner.rejected().is_empty());

    let start = runner.id("start").expect("start");
    let step = runner.id("step").expect("step");
    let graph = runner.graph();
    assert_eq!(graph.block(step).expect("step").parent(), Some(start));
    assert!(!graph.block(step).expect("step").is_visible());
    assert!(graph.block(start).expect("start").is_collapsed());
}

#[test]
fn unknown_names_stop_the_script() {
    let steps = vec![ScriptStep::Toggle {
        block: "ghost".to_string(),
    }];
    let mut runner = ScriptRunner::new(GraphConfig::default());
    let err = runner.run(&steps).expect_err("unknown block");
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn config_file_sets_history_and_snap() {
    let dir = tempdir().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("graph.json")).expect("utf8 path");
    fs::write(&path, r#"{ "snap_radius": 5.0, "history_depth": 1 }"#).expect("write config");

    let config = GraphConfig::load(&path).expect("load config");
    assert_eq!(config.snap_radius, 5.0);
    assert_eq!(config.history_depth, 1);
    assert_eq!(config.scale, 1.0);

    fs::write(&path, r#"{ "scale": 0 }"#).expect("write config");
    assert!(GraphConfig::load(&path).is_err());
    fs::write(&path, r#"{ "snap_radius": -1.0 }"#).expect("write config");
    assert!(GraphConfig::load(&path).is_err());
    assert!(GraphConfig::load(&Utf8PathBuf::from("/nonexistent/graph.json")).is_err());
}
