//! Session-level scripted configuration, includes and dumps

use gconf_core::{CoreError, PostConfigAction};
use gconf_property::{Source, Value};
use gconf_test_utils::fixture_session;
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn miscased_key_is_stored_with_warning() {
    let mut session = fixture_session();
    session.create("MyAlg", "MyAlg1").unwrap();

    session.apply_option("MyAlg1.testproperty = 5", Source::CommandLine).unwrap();

    assert_eq!(session.value("MyAlg1", "TestProperty").unwrap(), &Value::Int(5));
    let warnings: Vec<&str> = session.catalog().diagnostics().warnings().collect();
    assert_eq!(
        warnings,
        vec!["Option 'testproperty' was requested for MyAlg1, but the correct spelling is 'TestProperty'"]
    );
}

#[test]
fn later_options_win_over_scripted_include() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("override.py"), "").unwrap();
    let job = dir.path().join("job.opts");
    fs::write(
        &job,
        "MessageSvc.OutputLevel = 123;\n#include \"override.py\"\nMessageSvc.OutputLevel = 123;\n",
    )
    .unwrap();

    let mut session = fixture_session();
    session.scripts_mut().register("override", |s, _| {
        s.create("MessageSvc", "MessageSvc")?;
        s.set("MessageSvc", "OutputLevel", 1)?;
        Ok(Vec::new())
    });
    session.import_options(&job).unwrap();

    assert_eq!(session.value("MessageSvc", "OutputLevel").unwrap(), &Value::Int(123));
}

#[test]
fn scripted_file_runs_once() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("tweaks.py");
    fs::write(&script, "").unwrap();

    let mut session = fixture_session();
    session.create("MyAlg", "Counter").unwrap();
    session.scripts_mut().register("tweaks.py", |s, _| {
        let n = s.value("Counter", "TestProperty")?.as_int().unwrap_or_default();
        s.set("Counter", "TestProperty", Value::Int(n + 1))?;
        Ok(Vec::new())
    });
    session.import_options(&script).unwrap();
    session.import_options(&script).unwrap();

    assert_eq!(session.value("Counter", "TestProperty").unwrap(), &Value::Int(1));
    let warnings: Vec<&str> = session.catalog().diagnostics().warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("Skip already included file "));
}

#[test]
fn function_token_must_return_configurables() {
    let mut session = fixture_session();
    session.scripts_mut().register("jobs:reco", |s, _| {
        let name = s.create("MyAlg", "Reco")?;
        Ok(vec![name])
    });
    session
        .scripts_mut()
        .register("jobs:broken", |_, _| Ok(vec!["Nowhere".to_string()]));

    assert_eq!(session.run_function("jobs:reco").unwrap(), vec!["Reco"]);
    let err = session.run_function("jobs:broken").unwrap_err();
    assert!(matches!(err, CoreError::NotConfigurable { name, .. } if name == "Nowhere"));
    assert!(matches!(
        session.run_function("jobs:missing"),
        Err(CoreError::UnknownScript(_))
    ));
}

#[test]
fn missing_include_is_a_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let job = dir.path().join("job.opts");
    fs::write(&job, "#include \"absent.opts\"\n").unwrap();

    let mut session = fixture_session();
    let err = session.import_options(&job).unwrap_err();

    assert!(err.is_missing_input(), "{err}");
}

#[test]
fn script_error_inside_include_keeps_its_kind() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("unknown.py"), "").unwrap();
    let job = dir.path().join("job.opts");
    fs::write(&job, "#include \"unknown.py\"\n").unwrap();

    let mut session = fixture_session();
    let err = session.import_options(&job).unwrap_err();

    assert!(matches!(err, CoreError::UnknownScript(_)), "{err:?}");
}

#[test]
fn snapshot_restores_catalog_and_actions() {
    let dir = tempfile::tempdir().unwrap();
    let pkl = dir.path().join("job.pkl");

    let mut session = fixture_session();
    session.create("MyAlg", "MyAlg1").unwrap();
    session.set("MyAlg1", "Inputs", Value::list(["a", "b"])).unwrap();
    session.append_post_config_action(PostConfigAction::set("MyAlg1", "TestProperty", 7));
    session.append_post_config_action(PostConfigAction::callback("opaque", |_| Ok(())));
    session.write_dump(&pkl, false).unwrap();

    let mut restored = fixture_session();
    restored.import_options(&pkl).unwrap();
    assert_eq!(
        restored.value("MyAlg1", "Inputs").unwrap(),
        &Value::list(["a", "b"])
    );
    assert_eq!(restored.post_actions().len(), 1);
    restored.run_post_config_actions().unwrap();
    assert_eq!(restored.value("MyAlg1", "TestProperty").unwrap(), &Value::Int(7));
}

#[test]
fn json_dump_reloads_into_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("job.json");

    let mut session = fixture_session();
    session.apply_option("MessageSvc.OutputLevel = 2", Source::CommandLine).unwrap();
    session.apply_option("Gen.Names = {\"x\"}", Source::CommandLine).unwrap();
    session.write_dump(&json, false).unwrap();

    let mut restored = fixture_session();
    restored.import_options(&json).unwrap();
    assert_eq!(restored.value("MessageSvc", "OutputLevel").unwrap(), &Value::Int(2));
    assert_eq!(restored.value("Gen", "Names").unwrap(), &Value::list(["x"]));
}

#[test]
fn component_database_adds_types() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("components.yaml");
    fs::write(
        &db,
        "components:\n  - type: Fitter\n    kind: Algorithm\n    properties:\n      - { name: Tolerance, type: double, default: \"0.01\" }\n",
    )
    .unwrap();

    let mut session = fixture_session();
    assert_eq!(session.load_component_db(&db).unwrap(), 1);
    session.create("Fitter", "Fit").unwrap();
    assert_eq!(session.value("Fit", "Tolerance").unwrap(), &Value::Float(0.01));
}

#[test]
fn purge_then_reload_matches_fresh_load() {
    let dir = tempfile::tempdir().unwrap();
    let job = dir.path().join("job.opts");
    fs::write(&job, "MyAlg1.TestProperty = 4;\nMyAlg1.Inputs += {\"z\"};\n").unwrap();

    let mut fresh = fixture_session();
    fresh.import_options(&job).unwrap();

    let mut session = fixture_session();
    session.import_options(&job).unwrap();
    session.purge();
    session.import_options(&job).unwrap();

    let flat = |s: &gconf_core::Session| gconf_options::flat_options(s.catalog(), true);
    assert_eq!(flat(&session), flat(&fresh));
}
