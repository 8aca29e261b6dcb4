//! ConfigurableUser ordering, enabling and property propagation

use gconf_core::{ConfigurableUser, CoreError, CoreResult, Dependency, Session};
use gconf_property::{ComponentKind, IntKind, Schema, Source, TypeSpec, Value};
use gconf_test_utils::fixture_session;
use pretty_assertions::assert_eq;

#[test]
fn queried_user_applies_first() {
    let mut session = fixture_session();
    session.create("Application", "Application").unwrap();
    session.create("CommonConf", "CommonConf").unwrap();
    session.set("CommonConf", "OutputLevel", 2).unwrap();
    session.set("Application", "EvtMax", 10).unwrap();

    session.apply_configurable_users().unwrap();

    assert_eq!(session.applied_users(), &["CommonConf", "Application"]);
    assert_eq!(session.value("MessageSvc", "OutputLevel").unwrap(), &Value::Int(2));
    assert_eq!(session.value("ApplicationMgr", "EvtMax").unwrap(), &Value::Int(10));
    assert_eq!(
        session.value("ApplicationMgr", "TopAlg").unwrap(),
        &Value::list(["MyAlg/MainAlg"])
    );
    assert_eq!(session.value("MainAlg", "OutputLevel").unwrap(), &Value::Int(2));
}

#[test]
fn implicit_dependency_is_skipped() {
    let mut session = fixture_session();
    session.create("Application", "Application").unwrap();

    session.apply_configurable_users().unwrap();

    assert_eq!(session.applied_users(), &["CommonConf", "Application"]);
    assert!(!session.configurable("CommonConf").unwrap().is_enabled());
    assert!(!session.catalog().contains("MessageSvc"));
}

#[test]
fn users_created_by_options_are_applied() {
    let mut session = fixture_session();
    session.apply_option("CommonConf.OutputLevel = 4", Source::CommandLine).unwrap();
    session.create("CommonConf", "CommonConf").unwrap();

    session.apply_configurable_users().unwrap();

    assert_eq!(session.value("MessageSvc", "OutputLevel").unwrap(), &Value::Int(4));
}

#[test]
fn second_apply_is_a_no_op() {
    let mut session = fixture_session();
    session.create("CommonConf", "CommonConf").unwrap();
    session.apply_configurable_users().unwrap();
    session.set("CommonConf", "OutputLevel", 6).unwrap();

    session.apply_configurable_users().unwrap();

    assert_eq!(session.applied_users(), &["CommonConf"]);
    assert_eq!(session.value("MessageSvc", "OutputLevel").unwrap(), &Value::Int(3));
}

#[test]
fn users_are_not_dumped() {
    let mut session = fixture_session();
    session.create("CommonConf", "CommonConf").unwrap();
    session.apply_configurable_users().unwrap();

    let names: Vec<String> = session
        .needed_configurables()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(names, vec!["MessageSvc"]);
}

struct Cyclic {
    own: &'static str,
    other: &'static str,
}

impl ConfigurableUser for Cyclic {
    fn schema(&self) -> Schema {
        Schema::new(self.own, ComponentKind::User)
    }

    fn queried(&self) -> Vec<String> {
        vec![self.other.to_string()]
    }

    fn apply(&self, _session: &mut Session, _name: &str) -> CoreResult<()> {
        Ok(())
    }
}

#[test]
fn dependency_loop_is_reported() {
    let mut session = fixture_session();
    session
        .register_user(Cyclic { own: "UserA", other: "UserB" })
        .unwrap();
    session
        .register_user(Cyclic { own: "UserB", other: "UserA" })
        .unwrap();
    session.create("UserA", "UserA").unwrap();

    let err = session.apply_configurable_users().unwrap_err();

    assert!(matches!(&err, CoreError::DependencyLoop(left) if left == &["UserA", "UserB"]));
    assert_eq!(
        err.to_string(),
        r#"Detected loop in the ConfigurableUser dependencies: ["UserA", "UserB"]"#
    );
}

struct Top;

impl ConfigurableUser for Top {
    fn schema(&self) -> Schema {
        Schema::new("Top", ComponentKind::User)
            .with_property("OutputLevel", TypeSpec::Int(IntKind::I32), 3)
            .unwrap()
    }

    fn used(&self) -> Vec<Dependency> {
        vec![
            Dependency::new("MyAlg").named("A1"),
            Dependency::new("MyAlg").named("A2"),
        ]
    }

    fn apply(&self, session: &mut Session, name: &str) -> CoreResult<()> {
        session.propagate_property(name, "OutputLevel", None)
    }
}

#[test]
fn set_property_is_propagated_with_warning() {
    let mut session = fixture_session();
    session.register_user(Top).unwrap();
    session.create("Top", "Top").unwrap();
    session.apply_option("Top.OutputLevel = 5", Source::CommandLine).unwrap();
    session.apply_option("A2.OutputLevel = 2", Source::CommandLine).unwrap();

    session.apply_configurable_users().unwrap();

    assert_eq!(session.value("A1", "OutputLevel").unwrap(), &Value::Int(5));
    assert_eq!(session.value("A2", "OutputLevel").unwrap(), &Value::Int(5));
    let warnings: Vec<&str> = session.catalog().diagnostics().warnings().collect();
    assert_eq!(
        warnings,
        vec!["Property 'OutputLevel' is set in both 'Top' and 'A2', using 'Top.OutputLevel'"]
    );
}

#[test]
fn unset_property_only_fills_unset_targets() {
    let mut session = fixture_session();
    session.register_user(Top).unwrap();
    session.create("Top", "Top").unwrap();
    session.apply_option("A2.OutputLevel = 2", Source::CommandLine).unwrap();

    session.apply_configurable_users().unwrap();

    assert_eq!(session.value("A2", "OutputLevel").unwrap(), &Value::Int(2));
    assert!(session.catalog().diagnostics().warnings().next().is_none());
}

#[test]
fn non_user_schema_is_rejected() {
    struct NotUser;
    impl ConfigurableUser for NotUser {
        fn schema(&self) -> Schema {
            Schema::new("Plain", ComponentKind::Algorithm)
        }
        fn apply(&self, _session: &mut Session, _name: &str) -> CoreResult<()> {
            Ok(())
        }
    }
    let mut session = fixture_session();
    assert!(matches!(
        session.register_user(NotUser),
        Err(CoreError::NotAUser(name)) if name == "Plain"
    ));
}

struct Layered {
    own: &'static str,
    uses: Option<&'static str>,
    queries: Option<&'static str>,
}

impl ConfigurableUser for Layered {
    fn schema(&self) -> Schema {
        Schema::new(self.own, ComponentKind::User)
            .with_property("Flag", TypeSpec::Bool, false)
            .unwrap()
    }

    fn used(&self) -> Vec<Dependency> {
        self.uses.map(Dependency::new).into_iter().collect()
    }

    fn queried(&self) -> Vec<String> {
        self.queries.map(str::to_string).into_iter().collect()
    }

    fn apply(&self, _session: &mut Session, _name: &str) -> CoreResult<()> {
        Ok(())
    }
}

#[test]
fn user_waits_for_its_modifier_wired_before_it() {
    let mut session = fixture_session();
    let layers = [
        Layered { own: "Outer", uses: Some("Inner"), queries: Some("Base") },
        Layered { own: "Inner", uses: None, queries: None },
        Layered { own: "Base", uses: None, queries: None },
    ];
    for layer in layers {
        session.register_user(layer).unwrap();
    }
    for name in ["Outer", "Inner", "Base"] {
        session
            .apply_option(&format!("{name}.Flag = true"), Source::CommandLine)
            .unwrap();
    }

    session.apply_configurable_users().unwrap();

    assert_eq!(session.applied_users(), &["Base", "Outer", "Inner"]);
}

struct Picky;

impl ConfigurableUser for Picky {
    fn schema(&self) -> Schema {
        Schema::new("Picky", ComponentKind::User)
            .with_property("Ready", TypeSpec::Bool, false)
            .unwrap()
    }

    fn apply(&self, session: &mut Session, name: &str) -> CoreResult<()> {
        if session.value(name, "Ready")? != &Value::Bool(true) {
            session.set(name, "Missing", 1)?;
        }
        Ok(())
    }
}

#[test]
fn failed_apply_can_be_retried() {
    let mut session = fixture_session();
    session.register_user(Picky).unwrap();
    session.create("CommonConf", "CommonConf").unwrap();
    session.create("Picky", "Picky").unwrap();

    assert!(session.apply_configurable_users().is_err());
    assert_eq!(session.applied_users(), &["CommonConf"]);

    session.set("Picky", "Ready", true).unwrap();
    session.apply_configurable_users().unwrap();
    assert_eq!(session.applied_users(), &["CommonConf", "Picky"]);
}
