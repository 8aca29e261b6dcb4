//! Configuration session
//!
//! A [`Session`] owns everything one configuration run touches: the catalog
//! and its type registry, registered scripts and ConfigurableUser types, the
//! post-config chain and the include bookkeeping. Dropping the session (or
//! calling [`Session::purge`]) discards all of it.

use crate::action::{PostConfigAction, PostConfigChain};
use crate::builtins;
use crate::component_db::ComponentDb;
use crate::error::{CoreError, CoreResult};
use crate::script::ScriptRegistry;
use crate::user::{ConfigurableUser, UserLinks};
use gconf_catalog::{AssignOp, Catalog, Configurable, QualifiedName, TypeRegistry};
use gconf_flow::FlowNode;
use gconf_options::{
    apply_statement, canonical, default_formats, ActionRecord, DumpInput, JsonDumper,
    OptionsError, OptionsHost, OptionsResult, SearchPath, Snapshot, YamlDumper,
};
use gconf_property::{ComponentKind, Schema, Source, Value};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One configuration run
pub struct Session {
    catalog: Catalog,
    scripts: ScriptRegistry,
    pub(crate) users: IndexMap<String, Arc<dyn ConfigurableUser>>,
    pub(crate) links: IndexMap<String, UserLinks>,
    pub(crate) applied: Vec<String>,
    pub(crate) users_applied: bool,
    post_actions: PostConfigChain,
    search_path: SearchPath,
    included: HashSet<PathBuf>,
    stashed: Option<CoreError>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("configurables", &self.catalog.len())
            .field("users", &self.users.keys().collect::<Vec<_>>())
            .field("post_actions", &self.post_actions.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session with the built-in types and the search path from the
    /// environment
    ///
    /// # Errors
    /// Fails only if a built-in schema is inconsistent.
    pub fn new() -> CoreResult<Self> {
        Ok(Self::with_types(builtins::builtin_types()?, SearchPath::from_env()))
    }

    /// Session over an explicit type registry
    #[must_use]
    pub fn with_types(types: TypeRegistry, search_path: SearchPath) -> Self {
        Self {
            catalog: Catalog::new(types),
            scripts: ScriptRegistry::new(),
            users: IndexMap::new(),
            links: IndexMap::new(),
            applied: Vec::new(),
            users_applied: false,
            post_actions: PostConfigChain::new(),
            search_path,
            included: HashSet::new(),
            stashed: None,
        }
    }

    /// The catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Mutable catalog
    #[inline]
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Registered scripts
    #[inline]
    #[must_use]
    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    /// Mutable script registry
    #[inline]
    pub fn scripts_mut(&mut self) -> &mut ScriptRegistry {
        &mut self.scripts
    }

    /// Include search path
    #[inline]
    #[must_use]
    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Replace the include search path
    pub fn set_search_path(&mut self, search_path: SearchPath) {
        self.search_path = search_path;
    }

    /// Pending post-config actions
    #[inline]
    #[must_use]
    pub fn post_actions(&self) -> &PostConfigChain {
        &self.post_actions
    }

    /// User-level instances in the order their apply step ran
    #[inline]
    #[must_use]
    pub fn applied_users(&self) -> &[String] {
        &self.applied
    }

    /// Add or replace a component type
    pub fn register_type(&mut self, schema: Schema) {
        self.catalog.types_mut().register(schema);
    }

    /// Add a user-level type with its apply action
    ///
    /// # Errors
    /// Fails when the schema is not of kind `User`.
    pub fn register_user<U: ConfigurableUser + 'static>(&mut self, user: U) -> CoreResult<()> {
        let schema = user.schema();
        if schema.kind() != ComponentKind::User {
            return Err(CoreError::NotAUser(schema.type_name().to_string()));
        }
        let type_name = schema.type_name().to_string();
        self.register_type(schema);
        self.users.insert(type_name, Arc::new(user));
        Ok(())
    }

    /// Register the types of a component database file
    ///
    /// # Errors
    /// Fails on unreadable or invalid databases.
    pub fn load_component_db(&mut self, path: &Path) -> CoreResult<usize> {
        let db = ComponentDb::load(path)?;
        let count = db.register_into(self.catalog.types_mut(), &path.display().to_string())?;
        tracing::debug!("registered {} types from {}", count, path.display());
        Ok(count)
    }

    /// Find or create a configurable of `type_name` called `name`
    ///
    /// User-level instances created here are enabled, including ones created
    /// earlier as implicit dependencies.
    ///
    /// # Errors
    /// Fails on unknown types and name clashes with another type.
    pub fn create(&mut self, type_name: &str, name: &str) -> CoreResult<String> {
        let (qn, created) = self.catalog.ensure(type_name, name)?;
        let key = qn.to_string();
        if self.users.contains_key(type_name) {
            if let Some(conf) = self.catalog.lookup_mut(&key) {
                conf.set_enabled(true);
            }
            if created {
                self.wire_user(&key, type_name)?;
            }
        }
        Ok(key)
    }

    /// Configurable by qualified name
    ///
    /// # Errors
    /// Fails when it does not exist.
    pub fn configurable(&self, name: &str) -> CoreResult<&Configurable> {
        Ok(self.catalog.get(name)?)
    }

    /// Scripted assignment
    ///
    /// # Errors
    /// Fails on unknown keys (generic configurables included) and type
    /// mismatches.
    pub fn set(&mut self, component: &str, key: &str, value: impl Into<Value>) -> CoreResult<()> {
        Ok(self.catalog.set(component, key, value, Source::Script)?)
    }

    /// Scripted append
    ///
    /// # Errors
    /// Same as [`Session::set`], plus appends to scalars.
    pub fn append(&mut self, component: &str, key: &str, delta: impl Into<Value>) -> CoreResult<()> {
        Ok(self.catalog.append(component, key, delta, Source::Script)?)
    }

    /// Current value of a property
    ///
    /// # Errors
    /// Fails on unknown components or keys.
    pub fn value(&self, component: &str, key: &str) -> CoreResult<&Value> {
        Ok(self.catalog.value(component, key)?)
    }

    /// Create or return a private tool of `parent`
    ///
    /// # Errors
    /// See [`Catalog::add_tool`].
    pub fn add_tool(&mut self, parent: &str, type_name: &str, leaf: &str) -> CoreResult<QualifiedName> {
        Ok(self.catalog.add_tool(parent, type_name, leaf)?)
    }

    /// Build the sequencers of a control-flow expression
    ///
    /// # Errors
    /// Fails when a leaf is not an algorithm or membership would loop.
    pub fn materialize(&mut self, node: &FlowNode) -> CoreResult<QualifiedName> {
        Ok(gconf_flow::materialize(&mut self.catalog, node)?)
    }

    /// Queue a post-config action; an equal one moves to the end
    pub fn append_post_config_action(&mut self, action: PostConfigAction) {
        self.post_actions.append(action);
    }

    /// Drop a queued post-config action
    pub fn remove_post_config_action(&mut self, action: &PostConfigAction) -> bool {
        self.post_actions.remove(action)
    }

    /// Run the queued post-config actions in order
    ///
    /// Actions queued while running are run in turn.
    ///
    /// # Errors
    /// The first failing action aborts the chain.
    pub fn run_post_config_actions(&mut self) -> CoreResult<usize> {
        let mut count = 0;
        loop {
            let actions = self.post_actions.take();
            if actions.is_empty() {
                return Ok(count);
            }
            for action in actions {
                tracing::debug!("post-config action {}", action.label());
                self.run_action(&action).map_err(|e| CoreError::PostAction {
                    label: action.label(),
                    source: Box::new(e),
                })?;
                count += 1;
            }
        }
    }

    fn run_action(&mut self, action: &PostConfigAction) -> CoreResult<()> {
        match action {
            PostConfigAction::SetProperty {
                component,
                property,
                value,
            } => self.assign_textual(component, property, AssignOp::Set, value.clone()),
            PostConfigAction::Append {
                component,
                property,
                value,
            } => self.assign_textual(component, property, AssignOp::Append, value.clone()),
            PostConfigAction::InvokeNamed { name, args } => {
                let script = self
                    .scripts
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CoreError::UnknownScript(name.clone()))?;
                script.call(self, args).map(|_| ())
            }
            PostConfigAction::Statement(text) => self.apply_option(text, Source::CommandLine),
            PostConfigAction::Callback { body, .. } => body(self),
        }
    }

    fn assign_textual(&mut self, component: &str, key: &str, op: AssignOp, value: Value) -> CoreResult<()> {
        self.catalog.lookup_or_generic(component)?;
        self.catalog
            .assign(component, key, op, value, Source::PostAction)?;
        Ok(())
    }

    /// Apply one options statement, as given with `--option`
    ///
    /// # Errors
    /// Fails on syntax errors and rejected assignments.
    pub fn apply_option(&mut self, text: &str, source: Source) -> CoreResult<()> {
        apply_statement(self, text, source).map_err(|e| self.lift(e))
    }

    /// Import a source chosen by extension
    ///
    /// `.opts` is parsed, `.py` runs the matching script, `.pkl`, `.json`,
    /// `.yaml` and `.yml` restore dumps. Relative paths are looked up on the
    /// search path.
    ///
    /// # Errors
    /// Fails on missing files, unsupported extensions and load errors.
    pub fn import_options(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let resolved = self
            .search_path
            .resolve(&path.display().to_string(), None)
            .map_err(|_| CoreError::MissingFile(path.display().to_string()))?;
        self.import_resolved(&resolved)
    }

    fn import_resolved(&mut self, path: &Path) -> CoreResult<()> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension {
            "opts" => {
                gconf_options::import_options(self, path).map_err(|e| self.lift(e))?;
                Ok(())
            }
            "py" => self.run_script_file(path),
            "pkl" => {
                let bytes = fs::read(path).map_err(|e| CoreError::io(path.display(), &e))?;
                let actions = Snapshot::decode(&bytes)?.restore(&mut self.catalog)?;
                for record in actions {
                    self.post_actions.append(record.into());
                }
                Ok(())
            }
            "json" | "yaml" | "yml" => {
                let text = fs::read_to_string(path).map_err(|e| CoreError::io(path.display(), &e))?;
                if extension == "json" {
                    JsonDumper::load(&mut self.catalog, &text)?;
                } else {
                    YamlDumper::load(&mut self.catalog, &text)?;
                }
                Ok(())
            }
            _ => Err(CoreError::UnsupportedSource(path.display().to_string())),
        }
    }

    fn run_script_file(&mut self, path: &Path) -> CoreResult<()> {
        if !self.included.insert(canonical(path)) {
            self.catalog
                .diagnostics_mut()
                .warn(format!("Skip already included file {}", path.display()));
            return Ok(());
        }
        let script = self
            .scripts
            .for_file(path)
            .cloned()
            .ok_or_else(|| CoreError::UnknownScript(path.display().to_string()))?;
        tracing::debug!("running script {} for {}", script.name(), path.display());
        script.call(self, &[])?;
        Ok(())
    }

    /// Run a `module:function` token; the returned names must be live
    ///
    /// # Errors
    /// Fails on unknown scripts, script errors and unknown returned names.
    pub fn run_function(&mut self, token: &str) -> CoreResult<Vec<String>> {
        let script = self
            .scripts
            .get(token)
            .cloned()
            .ok_or_else(|| CoreError::UnknownScript(token.to_string()))?;
        let names = script.call(self, &[])?;
        for name in &names {
            if !self.catalog.contains(name) {
                return Err(CoreError::NotConfigurable {
                    script: token.to_string(),
                    name: name.clone(),
                });
            }
        }
        Ok(names)
    }

    fn lift(&mut self, err: OptionsError) -> CoreError {
        match (err, self.stashed.take()) {
            (OptionsError::Host(_), Some(original)) => original,
            (err, _) => err.into(),
        }
    }

    /// Resolve late-bound references and make the catalog read-only
    ///
    /// # Errors
    /// Fails on unresolved or circular references.
    pub fn freeze(&mut self) -> CoreResult<()> {
        Ok(self.catalog.freeze()?)
    }

    /// Serializable records of the queued actions
    #[must_use]
    pub fn action_records(&self) -> Vec<ActionRecord> {
        self.post_actions.records()
    }

    /// Write a dump chosen by the extension of `path`
    ///
    /// # Errors
    /// Fails on unknown formats and write errors.
    pub fn write_dump(&self, path: &Path, all: bool) -> CoreResult<()> {
        let records = self.action_records();
        let input = DumpInput::new(&self.catalog)
            .with_all(all)
            .with_actions(&records);
        default_formats().write(path, &input)?;
        Ok(())
    }

    /// Configurables the runtime needs
    #[must_use]
    pub fn needed_configurables(&self) -> Vec<&Configurable> {
        self.catalog.needed()
    }

    /// Drop every configurable and all run state; types and scripts stay
    pub fn purge(&mut self) {
        self.catalog.purge();
        self.links.clear();
        self.applied.clear();
        self.users_applied = false;
        self.post_actions = PostConfigChain::new();
        self.included.clear();
        self.stashed = None;
    }
}

impl OptionsHost for Session {
    fn catalog(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    fn mark_included(&mut self, path: &Path) -> bool {
        self.included.insert(canonical(path))
    }

    fn import_foreign(&mut self, path: &Path) -> OptionsResult<()> {
        self.import_resolved(path).map_err(|e| {
            let message = e.to_string();
            self.stashed = Some(e);
            OptionsError::Host(message)
        })
    }
}
