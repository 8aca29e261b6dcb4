//! Evaluation of parsed statements onto a catalog
//!
//! The [`Interpreter`] applies statements in textual order. Includes of
//! `.opts` files recurse; any other include is handed to the
//! [`OptionsHost`], which decides how scripted files are run.

use crate::ast::Statement;
use crate::error::{OptionsError, OptionsResult};
use crate::include::SearchPath;
use crate::parser::parse;
use crate::units::Units;
use gconf_catalog::Catalog;
use gconf_property::Source;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Label used for locations of command-line statements
pub const COMMAND_LINE: &str = "<command line>";

/// What the interpreter needs from its environment
pub trait OptionsHost {
    /// Catalog receiving assignments
    fn catalog(&mut self) -> &mut Catalog;

    /// Include directories
    fn search_path(&self) -> &SearchPath;

    /// Record `path` as included; `false` when it already was
    fn mark_included(&mut self, path: &Path) -> bool;

    /// Import an included file that is not options text
    ///
    /// # Errors
    /// The default rejects every such file.
    fn import_foreign(&mut self, path: &Path) -> OptionsResult<()> {
        Err(OptionsError::Unsupported(path.display().to_string()))
    }
}

/// Minimal host owning a catalog and its include bookkeeping
#[derive(Debug)]
pub struct CatalogHost {
    /// Target catalog
    pub catalog: Catalog,
    /// Include directories
    pub search_path: SearchPath,
    included: HashSet<PathBuf>,
}

impl CatalogHost {
    /// Wrap a catalog
    #[must_use]
    pub fn new(catalog: Catalog, search_path: SearchPath) -> Self {
        Self {
            catalog,
            search_path,
            included: HashSet::new(),
        }
    }
}

impl OptionsHost for CatalogHost {
    fn catalog(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    fn mark_included(&mut self, path: &Path) -> bool {
        self.included.insert(canonical(path))
    }
}

/// Absolute form of a path for include bookkeeping
#[must_use]
pub fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Check whether a path names options text rather than a script or dump
#[must_use]
pub fn is_options_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "opts")
}

/// Statement evaluator for one top-level read
#[derive(Debug)]
pub struct Interpreter {
    units: Units,
    source: Source,
    trace: bool,
    print_requested: bool,
    assignments: usize,
}

impl Interpreter {
    /// Interpreter tagging writes with `source`
    #[must_use]
    pub fn new(source: Source) -> Self {
        Self {
            units: Units::default(),
            source,
            trace: false,
            print_requested: false,
            assignments: 0,
        }
    }

    /// Units in scope
    #[inline]
    #[must_use]
    pub fn units(&self) -> &Units {
        &self.units
    }

    /// Mutable units, for predefinitions
    #[inline]
    pub fn units_mut(&mut self) -> &mut Units {
        &mut self.units
    }

    /// Number of assignments applied so far
    #[inline]
    #[must_use]
    pub fn assignments(&self) -> usize {
        self.assignments
    }

    /// Whether a `#printOptions` directive was seen
    #[inline]
    #[must_use]
    pub fn print_requested(&self) -> bool {
        self.print_requested
    }

    /// Read and apply an options file
    ///
    /// A file already included is skipped with a warning.
    ///
    /// # Errors
    /// Fails on I/O, syntax, evaluation or catalog errors.
    pub fn run_file<H: OptionsHost + ?Sized>(&mut self, host: &mut H, path: &Path) -> OptionsResult<()> {
        if !host.mark_included(path) {
            host.catalog()
                .diagnostics_mut()
                .warn(format!("Skip already included file {}", path.display()));
            return Ok(());
        }
        let text = fs::read_to_string(path).map_err(|e| OptionsError::io(path.display(), &e))?;
        tracing::debug!("reading options from {}", path.display());
        let dir = path.parent().map(Path::to_path_buf);
        self.run_text(host, &path.display().to_string(), &text, dir.as_deref())
    }

    /// Apply options text; `dir` anchors relative includes
    ///
    /// # Errors
    /// Fails on the first syntax, evaluation or catalog error.
    pub fn run_text<H: OptionsHost + ?Sized>(
        &mut self,
        host: &mut H,
        file: &str,
        text: &str,
        dir: Option<&Path>,
    ) -> OptionsResult<()> {
        for statement in parse(file, text)? {
            self.execute(host, statement, dir)?;
        }
        Ok(())
    }

    fn execute<H: OptionsHost + ?Sized>(
        &mut self,
        host: &mut H,
        statement: Statement,
        dir: Option<&Path>,
    ) -> OptionsResult<()> {
        match statement {
            Statement::Assign {
                component,
                property,
                op,
                value,
                location,
            } => {
                let value = value.evaluate(&self.units)?;
                if self.trace {
                    tracing::info!("{}: {}.{} {} {}", location, component, property, op, value);
                }
                let wrap = |source| OptionsError::Catalog {
                    location: location.clone(),
                    source,
                };
                let catalog = host.catalog();
                catalog.lookup_or_generic(&component).map_err(wrap)?;
                catalog
                    .assign(&component, &property, op, value, self.source)
                    .map_err(wrap)?;
                self.assignments += 1;
            }
            Statement::Include { path, .. } => {
                let resolved = host.search_path().resolve(&path, dir)?;
                if is_options_file(&resolved) {
                    self.run_file(host, &resolved)?;
                } else {
                    host.import_foreign(&resolved)?;
                }
            }
            Statement::Units { path, .. } => {
                let resolved = host.search_path().resolve(&path, dir)?;
                let text = fs::read_to_string(&resolved)
                    .map_err(|e| OptionsError::io(resolved.display(), &e))?;
                let count = self.units.load(&resolved.display().to_string(), &text)?;
                tracing::debug!("loaded {} units from {}", count, resolved.display());
            }
            Statement::PrintAssignments(on) => self.trace = on,
            Statement::PrintOptions => self.print_requested = true,
        }
        Ok(())
    }
}

/// Read an options file into the host's catalog
///
/// Logs the catalog when the file asks for `#printOptions`.
///
/// # Errors
/// Same as [`Interpreter::run_file`].
pub fn import_options<H: OptionsHost + ?Sized>(host: &mut H, path: &Path) -> OptionsResult<usize> {
    let mut interp = Interpreter::new(Source::Options);
    interp.run_file(host, path)?;
    if interp.print_requested() {
        log_catalog(host.catalog());
    }
    Ok(interp.assignments())
}

/// Apply one command-line statement; a missing trailing `;` is added
///
/// # Errors
/// Same as [`Interpreter::run_text`].
pub fn apply_statement<H: OptionsHost + ?Sized>(
    host: &mut H,
    text: &str,
    source: Source,
) -> OptionsResult<()> {
    let trimmed = text.trim_end();
    let text = if trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{trimmed};")
    };
    let mut interp = Interpreter::new(source);
    interp.run_text(host, COMMAND_LINE, &text, None)
}

fn log_catalog(catalog: &Catalog) {
    for conf in catalog.sorted() {
        for (key, property) in conf.sorted_properties() {
            tracing::info!("{}.{} = {};", conf.name(), key, property.value());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gconf_catalog::TypeRegistry;
    use gconf_property::{ComponentKind, IntKind, Schema, TypeSpec, Value};
    use std::fs;

    fn host() -> CatalogHost {
        let mut types = TypeRegistry::new();
        types.register(
            Schema::new("MessageSvc", ComponentKind::Service)
                .with_property("OutputLevel", TypeSpec::Int(IntKind::I32), 3)
                .unwrap(),
        );
        CatalogHost::new(Catalog::new(types), SearchPath::new())
    }

    #[test]
    fn test_assignments_applied_in_order() {
        let mut host = host();
        let mut interp = Interpreter::new(Source::Options);
        interp
            .run_text(
                &mut host,
                "t.opts",
                "Alg.L = {1}; Alg.L += {2, 3}; Alg.L -= {1}; MessageSvc.OutputLevel = 5;",
                None,
            )
            .unwrap();
        assert_eq!(interp.assignments(), 4);
        assert_eq!(host.catalog.value("Alg", "L").unwrap(), &Value::list([2, 3]));
        assert_eq!(
            host.catalog.value("MessageSvc", "OutputLevel").unwrap(),
            &Value::Int(5)
        );
        assert!(!host.catalog.get("MessageSvc").unwrap().is_generic());
    }

    #[test]
    fn test_dollar_strings_kept_verbatim() {
        let mut host = host();
        apply_statement(&mut host, "Alg.Prop1 = \"$VAR1\"", Source::CommandLine).unwrap();
        assert_eq!(
            host.catalog.value("Alg", "Prop1").unwrap(),
            &Value::String("$VAR1".into())
        );
    }

    #[test]
    fn test_catalog_error_carries_location() {
        let mut host = host();
        let err = apply_statement(&mut host, "MessageSvc.OutputLevel = \"loud\";", Source::CommandLine)
            .unwrap_err();
        assert!(matches!(err, OptionsError::Catalog { .. }));
        assert!(err.to_string().starts_with("<command line>(1,1): "));
    }

    #[test]
    fn test_include_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("common.opts"), "Alg.L += {1};").unwrap();
        fs::write(
            dir.path().join("main.opts"),
            "#include \"common.opts\"\n#include \"common.opts\"\nAlg.X = 1;",
        )
        .unwrap();
        let mut host = host();
        let n = import_options(&mut host, &dir.path().join("main.opts")).unwrap();
        assert_eq!(n, 2);
        assert_eq!(host.catalog.value("Alg", "L").unwrap(), &Value::list([1]));
        let warnings: Vec<&str> = host.catalog.diagnostics().warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Skip already included file"));
    }

    #[test]
    fn test_foreign_include_rejected_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("conf.py"), "").unwrap();
        fs::write(dir.path().join("main.opts"), "#include \"conf.py\"").unwrap();
        let mut host = host();
        let err = import_options(&mut host, &dir.path().join("main.opts")).unwrap_err();
        assert!(matches!(err, OptionsError::Unsupported(_)));
    }

    #[test]
    fn test_units_directive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("units.opts"), "1 km = 1000000;").unwrap();
        fs::write(dir.path().join("main.opts"), "#units \"units.opts\"\nAlg.D = 2*km;").unwrap();
        let mut host = host();
        import_options(&mut host, &dir.path().join("main.opts")).unwrap();
        assert_eq!(host.catalog.value("Alg", "D").unwrap(), &Value::Float(2.0e6));
    }

    #[test]
    fn test_missing_include() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.opts"), "#include \"absent.opts\"").unwrap();
        let mut host = host();
        let err = import_options(&mut host, &dir.path().join("main.opts")).unwrap_err();
        assert!(err.is_not_found());
    }
}
