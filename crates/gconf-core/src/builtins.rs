//! Built-in component schemas

use crate::error::CoreResult;
use gconf_catalog::TypeRegistry;
use gconf_property::{level, ComponentKind, IntKind, PropertyResult, Schema, TypeSpec, Value};

/// Application manager type
pub const APPLICATION_MGR: &str = "ApplicationMgr";
/// Message service type
pub const MESSAGE_SVC: &str = "MessageSvc";
/// Event selector type
pub const EVENT_SELECTOR: &str = "EventSelector";

fn strings() -> TypeSpec {
    TypeSpec::sequence(TypeSpec::String)
}

fn int() -> TypeSpec {
    TypeSpec::Int(IntKind::I32)
}

fn application_mgr() -> PropertyResult<Schema> {
    let mut schema = Schema::new(APPLICATION_MGR, ComponentKind::Service)
        .with_doc("Top-level application steering");
    schema
        .declare("AppName", TypeSpec::String, "ApplicationMgr".into(), "application name")?
        .declare("AppVersion", TypeSpec::String, "".into(), "application version")?
        .declare("TopAlg", strings(), Value::List(Vec::new()), "top-level algorithms as Type/Name")?
        .declare("ExtSvc", strings(), Value::List(Vec::new()), "extra services to create")?
        .declare("EvtMax", int(), Value::Int(-1), "events to process, -1 for all")?
        .declare("EvtSel", TypeSpec::String, "".into(), "event selector input, NONE for none")?
        .declare("JobOptionsType", TypeSpec::String, "FILE".into(), "how the runtime reads options")?
        .declare("JobOptionsPath", TypeSpec::String, "".into(), "options file for the runtime")?
        .declare("PrintAlgsSequence", TypeSpec::Bool, false.into(), "print the algorithm tree at start")?
        .declare("OutputLevel", int(), Value::Int(i128::from(level::INFO)), "")?;
    Ok(schema)
}

fn message_svc() -> PropertyResult<Schema> {
    let mut schema = Schema::new(MESSAGE_SVC, ComponentKind::Service);
    schema
        .declare("OutputLevel", int(), Value::Int(i128::from(level::INFO)), "")?
        .declare("Format", TypeSpec::String, "% F%18W%S%7W%R%T %0W%M".into(), "")?
        .declare("useColors", TypeSpec::Bool, false.into(), "")?;
    Ok(schema)
}

fn tool_svc() -> PropertyResult<Schema> {
    Schema::new(gconf_catalog::TOOL_SVC, ComponentKind::Service).with_property(
        "OutputLevel",
        int(),
        level::INFO,
    )
}

fn event_selector() -> PropertyResult<Schema> {
    let mut schema = Schema::new(EVENT_SELECTOR, ComponentKind::Service);
    schema
        .declare("Input", strings(), Value::List(Vec::new()), "input data specifications")?
        .declare("FirstEvent", int(), Value::Int(0), "")?
        .declare("PrintFreq", int(), Value::Int(-1), "")?;
    Ok(schema)
}

/// Register every built-in schema
///
/// # Errors
/// Fails only if a built-in declaration is inconsistent.
pub fn register(types: &mut TypeRegistry) -> CoreResult<()> {
    for schema in [application_mgr()?, message_svc()?, tool_svc()?, event_selector()?] {
        types.register(schema);
    }
    gconf_flow::register(types)?;
    Ok(())
}

/// A registry holding only the built-in schemas
///
/// # Errors
/// Same as [`register`].
pub fn builtin_types() -> CoreResult<TypeRegistry> {
    let mut types = TypeRegistry::new();
    register(&mut types)?;
    Ok(types)
}
