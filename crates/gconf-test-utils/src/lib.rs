//! Testing utilities for the gconf workspace
//!
//! Fixture component types and a session preloaded with them.

#![allow(missing_docs)]

use gconf_core::{builtin_types, ConfigurableUser, CoreResult, Dependency, Session, APPLICATION_MGR, MESSAGE_SVC};
use gconf_options::SearchPath;
use gconf_property::{level, ComponentKind, HandleKind, IntKind, Schema, TypeSpec, Value};

fn int() -> TypeSpec {
    TypeSpec::Int(IntKind::I32)
}

pub fn my_alg() -> Schema {
    let mut schema = Schema::new("MyAlg", ComponentKind::Algorithm).with_doc("fixture algorithm");
    schema
        .declare("TestProperty", int(), Value::Int(0), "")
        .and_then(|s| s.declare("OutputLevel", int(), Value::Int(level::INFO.into()), ""))
        .and_then(|s| s.declare("Inputs", TypeSpec::sequence(TypeSpec::String), Value::List(Vec::new()), ""))
        .and_then(|s| {
            s.declare(
                "Tool",
                TypeSpec::handle(HandleKind::PublicTool, "IMyTool"),
                Value::from(""),
                "",
            )
        })
        .unwrap_or_else(|e| panic!("MyAlg fixture: {e}"));
    schema
}

pub fn my_tool() -> Schema {
    Schema::new("MyTool", ComponentKind::AlgTool)
        .with_property("Threshold", TypeSpec::Float, 0.5)
        .unwrap_or_else(|e| panic!("MyTool fixture: {e}"))
}

pub fn my_service() -> Schema {
    Schema::new("MyService", ComponentKind::Service)
        .with_property("Enabled", TypeSpec::Bool, true)
        .unwrap_or_else(|e| panic!("MyService fixture: {e}"))
}

/// Sets the message service verbosity
pub struct CommonConf;

impl ConfigurableUser for CommonConf {
    fn schema(&self) -> Schema {
        Schema::new("CommonConf", ComponentKind::User)
            .with_property("OutputLevel", int(), level::INFO)
            .unwrap_or_else(|e| panic!("CommonConf fixture: {e}"))
    }

    fn apply(&self, session: &mut Session, name: &str) -> CoreResult<()> {
        let level = session.value(name, "OutputLevel")?.clone();
        session.create(MESSAGE_SVC, MESSAGE_SVC)?;
        session.set(MESSAGE_SVC, "OutputLevel", level)
    }
}

/// Schedules `MyAlg/MainAlg` and reads `CommonConf`
pub struct Application;

impl ConfigurableUser for Application {
    fn schema(&self) -> Schema {
        Schema::new("Application", ComponentKind::User)
            .with_property("EvtMax", int(), -1)
            .unwrap_or_else(|e| panic!("Application fixture: {e}"))
    }

    fn used(&self) -> Vec<Dependency> {
        vec![Dependency::new("MyAlg").named("MainAlg")]
    }

    fn queried(&self) -> Vec<String> {
        vec!["CommonConf".to_string()]
    }

    fn apply(&self, session: &mut Session, name: &str) -> CoreResult<()> {
        let evt_max = session.value(name, "EvtMax")?.clone();
        let level = session.value("CommonConf", "OutputLevel")?.clone();
        session.create(APPLICATION_MGR, APPLICATION_MGR)?;
        session.set(APPLICATION_MGR, "EvtMax", evt_max)?;
        session.append(APPLICATION_MGR, "TopAlg", Value::list(["MyAlg/MainAlg"]))?;
        session.set("MainAlg", "OutputLevel", level)
    }
}

/// Session with the built-in and fixture types and an empty search path
pub fn fixture_session() -> Session {
    let mut types = builtin_types().unwrap_or_else(|e| panic!("built-in types: {e}"));
    for schema in [my_alg(), my_tool(), my_service()] {
        types.register(schema);
    }
    let mut session = Session::with_types(types, SearchPath::new());
    session
        .register_user(CommonConf)
        .and_then(|()| session.register_user(Application))
        .unwrap_or_else(|e| panic!("user fixtures: {e}"));
    session
}
