//! Parse, freeze and dump scenarios for options text

use gconf_catalog::{Catalog, TypeRegistry};
use gconf_options::{
    default_formats, flat_options, import_options, CatalogHost, DumpInput, Interpreter, PyDumper,
    SearchPath, Snapshot,
};
use gconf_property::{ComponentKind, HandleKind, Schema, Source, TypeSpec, Value};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn types() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types.register(
        Schema::new("MyAlg", ComponentKind::Algorithm)
            .with_property(
                "Tool",
                TypeSpec::handle(HandleKind::PublicTool, "IMyTool"),
                "",
            )
            .unwrap(),
    );
    types.register(Schema::new("MyTool", ComponentKind::AlgTool));
    types
}

fn host() -> CatalogHost {
    CatalogHost::new(Catalog::new(types()), SearchPath::new())
}

fn run(host: &mut CatalogHost, text: &str) {
    Interpreter::new(Source::Options)
        .run_text(host, "test.opts", text, None)
        .unwrap();
}

fn py(catalog: &Catalog) -> String {
    PyDumper::render(&DumpInput::new(catalog))
}

#[test]
fn env_vars_kept_in_every_shape() {
    let mut host = host();
    run(
        &mut host,
        r#"
Alg.Prop1 = "$VAR1";
Alg.Prop2 = { "$VAR1", "$VAR2" };
Alg.Prop3 = ( "$VAR1", "$VAR2" );
Alg.Prop4 = { "$VAR1": "value", "key": "$VAR2" };
"#,
    );
    host.catalog.freeze().unwrap();
    assert_eq!(
        py(&host.catalog),
        concat!(
            r#"{"Alg": {"Prop1": "$VAR1", "Prop2": ["$VAR1", "$VAR2"], "#,
            r#""Prop3": ("$VAR1", "$VAR2"), "Prop4": {"$VAR1": "value", "key": "$VAR2"}}}"#,
            "\n"
        )
    );
}

#[test]
fn late_bound_reference_takes_final_value() {
    let mut host = host();
    run(
        &mut host,
        r#"
Alg.Prop = { "a" };
Alg.Prop = @Alg.RefProp;
Alg.RefProp = { "b" };
"#,
    );
    host.catalog.freeze().unwrap();
    assert_eq!(
        py(&host.catalog),
        "{\"Alg\": {\"Prop\": [\"b\"], \"RefProp\": [\"b\"]}}\n"
    );
}

#[test]
fn escaped_quotes_survive_every_format() {
    let mut host = host();
    run(
        &mut host,
        "Alg.Text = \"some \\\"text\\\"\";\nAlg.Lines = \"first\nsecond\";",
    );
    assert_eq!(
        host.catalog.value("Alg", "Text").unwrap(),
        &Value::String("some \"text\"".into())
    );

    let dir = tempfile::tempdir().unwrap();
    let formats = default_formats();
    for name in ["dump.opts", "dump.json", "dump.yaml"] {
        let path = dir.path().join(name);
        formats.write(&path, &DumpInput::new(&host.catalog)).unwrap();
        let mut reloaded = self::host();
        load(&mut reloaded, &path);
        assert_eq!(
            flat_options(&reloaded.catalog, false),
            flat_options(&host.catalog, false),
            "{name}"
        );
    }
}

fn load(host: &mut CatalogHost, path: &Path) {
    let text = fs::read_to_string(path).unwrap();
    match path.extension().and_then(|e| e.to_str()) {
        Some("opts") => {
            import_options(host, path).unwrap();
        }
        Some("json") => {
            gconf_options::JsonDumper::load(&mut host.catalog, &text).unwrap();
        }
        Some("yaml") => {
            gconf_options::YamlDumper::load(&mut host.catalog, &text).unwrap();
        }
        other => panic!("unexpected extension {other:?}"),
    }
}

#[test]
fn component_reference_serializes_as_type_slash_name() {
    let mut host = host();
    host.catalog.get_or_create("MyAlg", "Alg").unwrap();
    host.catalog.get_or_create("MyTool", "X").unwrap();
    host.catalog
        .set_handle("Alg", "Tool", "ToolSvc.X", Source::Script)
        .unwrap();
    let flat = flat_options(&host.catalog, false);
    assert_eq!(flat["Alg.Tool"], "\"MyTool/X\"");

    let bytes = Snapshot::capture(&host.catalog, &[]).encode().unwrap();
    let mut reloaded = Catalog::new(types());
    Snapshot::decode(&bytes).unwrap().restore(&mut reloaded).unwrap();
    let Value::Handle(reference) = reloaded.value("Alg", "Tool").unwrap().clone() else {
        panic!("handle expected");
    };
    assert_eq!(reference.full_name(), "MyTool/X");
    let live = reloaded.find_by_full_name(&reference.full_name()).unwrap();
    assert_eq!(live.name().to_string(), "ToolSvc.X");
}

#[test]
fn dump_of_load_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("job.opts");
    fs::write(
        &source,
        "B.List = [3, 1, 2];\nA.Map = { \"z\": 1, \"a\": 2 };\nA.Flag = false;\n",
    )
    .unwrap();
    let mut first = host();
    import_options(&mut first, &source).unwrap();
    let dumped = dir.path().join("dump.opts");
    default_formats()
        .write(&dumped, &DumpInput::new(&first.catalog))
        .unwrap();

    let mut second = host();
    import_options(&mut second, &dumped).unwrap();
    let again = dir.path().join("again.opts");
    default_formats()
        .write(&again, &DumpInput::new(&second.catalog))
        .unwrap();
    assert_eq!(fs::read(&dumped).unwrap(), fs::read(&again).unwrap());
    assert_eq!(
        fs::read_to_string(&dumped).unwrap(),
        "A.Flag = False;\nA.Map = {\"a\": 2, \"z\": 1};\nB.List = [3, 1, 2];\n"
    );
}

#[test]
fn purge_then_load_matches_fresh_load() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("job.opts");
    fs::write(&source, "A.X = 1;\nA.Y += {\"a\"};\n").unwrap();

    let mut fresh = host();
    import_options(&mut fresh, &source).unwrap();

    let mut reused = CatalogHost::new(Catalog::new(types()), SearchPath::new());
    run(&mut reused, "Other.Z = 2;");
    reused.catalog.purge();
    // new host clears include bookkeeping as a dropped session would
    let mut reused = CatalogHost::new(reused.catalog, SearchPath::new());
    import_options(&mut reused, &source).unwrap();
    assert_eq!(
        flat_options(&reused.catalog, true),
        flat_options(&fresh.catalog, true)
    );
}
