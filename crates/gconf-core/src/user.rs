//! ConfigurableUser resolution
//!
//! A [`ConfigurableUser`] is a user-level configurable whose apply action
//! derives concrete configuration from its own properties. Declared
//! dependencies order the applies:
//! - a user applies before the configurables it *uses* (it modifies them)
//! - a user applies after the configurables it *queries* (it reads them)
//!
//! Dependencies that do not exist yet are created disabled: their apply is
//! skipped unless user code creates them explicitly.

use crate::error::{CoreError, CoreResult};
use crate::session::Session;
use gconf_catalog::Lifecycle;
use gconf_property::{Schema, Source};

/// How a used dependency is named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyName {
    /// Instance named after its type
    Default,
    /// Explicit instance name
    Named(String),
    /// `<user>_<Type>`
    Private,
}

/// A configurable modified by a user's apply action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Configurable type
    pub type_name: String,
    /// Instance naming
    pub name: DependencyName,
}

impl Dependency {
    /// Default-named instance of `type_name`
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: DependencyName::Default,
        }
    }

    /// Explicitly named instance
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = DependencyName::Named(name.into());
        self
    }

    /// Instance private to the user
    #[must_use]
    pub fn private(mut self) -> Self {
        self.name = DependencyName::Private;
        self
    }

    pub(crate) fn instance_name(&self, user: &str) -> String {
        match &self.name {
            DependencyName::Default => self.type_name.clone(),
            DependencyName::Named(name) => name.clone(),
            DependencyName::Private => format!("{user}_{}", self.type_name),
        }
    }
}

/// User-level configurable type
pub trait ConfigurableUser: Send + Sync {
    /// Schema of the type; its kind must be `User`
    fn schema(&self) -> Schema;

    /// Configurables this type modifies in [`apply`](Self::apply)
    fn used(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// User-level types this type reads in [`apply`](Self::apply)
    fn queried(&self) -> Vec<String> {
        Vec::new()
    }

    /// Turn the high-level properties of instance `name` into low-level
    /// configuration
    ///
    /// # Errors
    /// Any error is fatal for the run.
    fn apply(&self, session: &mut Session, name: &str) -> CoreResult<()>;
}

/// Dependency edges of one user-level instance
#[derive(Debug, Clone, Default)]
pub(crate) struct UserLinks {
    /// Users that must apply before this one
    pub(crate) users: Vec<String>,
    /// Instances this one modifies
    pub(crate) used: Vec<String>,
    /// Declared dependencies have been created and linked
    pub(crate) wired: bool,
}

impl Session {
    /// Apply every user-level configurable once, in dependency order
    ///
    /// Users created during an apply join the pending set. Once every user
    /// has applied, further calls are no-ops. After a failure, a new call
    /// resumes with the users that have not applied yet.
    ///
    /// # Errors
    /// Fails on dependency loops and on failing apply actions.
    pub fn apply_configurable_users(&mut self) -> CoreResult<()> {
        if self.users_applied {
            return Ok(());
        }
        self.users_applied = true;
        let result = self.apply_pending_users();
        self.users_applied = result.is_ok();
        result
    }

    fn apply_pending_users(&mut self) -> CoreResult<()> {
        let mut done: Vec<String> = self.applied.clone();
        loop {
            let unwired: Vec<(String, String)> = self
                .catalog()
                .iter()
                .filter(|c| c.is_user() && !self.links.get(&c.name().to_string()).is_some_and(|l| l.wired))
                .map(|c| (c.name().to_string(), c.type_name().to_string()))
                .collect();
            for (name, type_name) in unwired {
                if self.users.contains_key(&type_name) {
                    self.wire_user(&name, &type_name)?;
                }
            }
            let pending: Vec<String> = self
                .catalog()
                .iter()
                .filter(|c| c.is_user())
                .map(|c| c.name().to_string())
                .filter(|n| !done.contains(n))
                .collect();
            if pending.is_empty() {
                return Ok(());
            }
            let mut applied_any = false;
            for name in pending {
                let blocked = self
                    .links
                    .get(&name)
                    .is_some_and(|l| !l.users.is_empty());
                if blocked {
                    continue;
                }
                applied_any = true;
                self.apply_one(&name)?;
                done.push(name);
            }
            if !applied_any {
                let mut left: Vec<String> = self
                    .catalog()
                    .iter()
                    .filter(|c| c.is_user())
                    .map(|c| c.name().to_string())
                    .filter(|n| !done.contains(n))
                    .collect();
                left.sort();
                return Err(CoreError::DependencyLoop(left));
            }
        }
    }

    fn apply_one(&mut self, name: &str) -> CoreResult<()> {
        let conf = self.catalog().get(name)?;
        let enabled = conf.is_enabled();
        let type_name = conf.type_name().to_string();
        if enabled {
            tracing::info!("applying configuration of {}", name);
            let user = self
                .users
                .get(&type_name)
                .cloned()
                .ok_or_else(|| CoreError::NotAUser(type_name.clone()))?;
            user.apply(self, name).map_err(|e| CoreError::Apply {
                name: name.to_string(),
                source: Box::new(e),
            })?;
            if let Some(conf) = self.catalog_mut().lookup_mut(name) {
                conf.set_state(Lifecycle::Applied);
            }
        } else {
            tracing::info!("skipping configuration of {}", name);
        }
        self.applied.push(name.to_string());
        let used = self
            .links
            .get(name)
            .map(|l| l.used.clone())
            .unwrap_or_default();
        for other in used {
            if let Some(links) = self.links.get_mut(&other) {
                links.users.retain(|u| u != name);
            }
        }
        Ok(())
    }

    /// Wire the declared dependencies of a freshly created user instance
    pub(crate) fn wire_user(&mut self, name: &str, type_name: &str) -> CoreResult<()> {
        let user = self
            .users
            .get(type_name)
            .cloned()
            .ok_or_else(|| CoreError::NotAUser(type_name.to_string()))?;
        self.links.entry(name.to_string()).or_default().wired = true;
        for dependency in user.used() {
            let instance = dependency.instance_name(name);
            let target = self.create_dependency(&dependency.type_name, &instance)?;
            self.add_active_use(name, &target);
        }
        for queried in user.queried() {
            if !self.users.contains_key(&queried) {
                return Err(CoreError::PassiveUse {
                    user: name.to_string(),
                    other: queried,
                });
            }
            let target = self.create_dependency(&queried, &queried)?;
            self.add_active_use(&target, name);
        }
        Ok(())
    }

    fn create_dependency(&mut self, type_name: &str, name: &str) -> CoreResult<String> {
        let (qn, created) = self.catalog_mut().ensure(type_name, name)?;
        let key = qn.to_string();
        if created && self.users.contains_key(type_name) {
            if let Some(conf) = self.catalog_mut().lookup_mut(&key) {
                conf.set_enabled(false);
            }
            self.wire_user(&key, type_name)?;
        }
        Ok(key)
    }

    /// `user` modifies `other`, so `user` applies first
    fn add_active_use(&mut self, user: &str, other: &str) {
        self.links
            .entry(user.to_string())
            .or_default()
            .used
            .push(other.to_string());
        self.links
            .entry(other.to_string())
            .or_default()
            .users
            .push(user.to_string());
    }

    /// Instance used by `user` under `name`, enabled for apply
    ///
    /// # Errors
    /// Fails when `user` does not use such an instance.
    pub fn used_instance(&mut self, user: &str, name: &str) -> CoreResult<String> {
        let found = self
            .links
            .get(user)
            .and_then(|l| l.used.iter().find(|u| u.as_str() == name))
            .cloned()
            .ok_or_else(|| CoreError::Catalog(gconf_catalog::CatalogError::NotFound(name.to_string())))?;
        if let Some(conf) = self.catalog_mut().lookup_mut(&found) {
            if conf.is_user() {
                conf.set_enabled(true);
            }
        }
        Ok(found)
    }

    /// Copy property `key` of `from` onto the configurables it uses, or onto
    /// `others` when given
    ///
    /// A value set on `from` overwrites the targets, warning when a target
    /// also had it set. An unset value only fills targets that are unset.
    /// Targets without the property are ignored.
    ///
    /// # Errors
    /// Fails when `from` lacks the property or a target rejects the value.
    pub fn propagate_property(&mut self, from: &str, key: &str, others: Option<&[String]>) -> CoreResult<()> {
        let property = self
            .catalog()
            .get(from)?
            .property(key)
            .cloned()
            .ok_or_else(|| gconf_catalog::CatalogError::UnknownProperty {
                component: from.to_string(),
                property: key.to_string(),
                suggestion: None,
            })?;
        let targets: Vec<String> = match others {
            Some(list) => list.to_vec(),
            None => self.links.get(from).map(|l| l.used.clone()).unwrap_or_default(),
        };
        for target in targets {
            let Some(other) = self.catalog().lookup(&target).and_then(|c| c.property(key)) else {
                continue;
            };
            let other_set = other.is_overridden();
            if property.is_overridden() {
                if other_set {
                    self.catalog_mut().diagnostics_mut().warn(format!(
                        "Property '{key}' is set in both '{from}' and '{target}', using '{from}.{key}'"
                    ));
                }
            } else if other_set {
                continue;
            }
            self.catalog_mut()
                .set(&target, key, property.value().clone(), Source::Script)?;
        }
        Ok(())
    }
}
