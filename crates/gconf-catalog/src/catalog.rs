//! The configurable catalog
//!
//! [`Catalog`] maps each qualified name to exactly one [`Configurable`] and is
//! the only path through which properties are written. It owns the
//! [`TypeRegistry`] consulted on typed construction and a [`Diagnostics`]
//! sink for non-fatal warnings.

use crate::configurable::{Configurable, Lifecycle};
use crate::diagnostic::Diagnostics;
use crate::error::{CatalogError, CatalogResult};
use crate::name::{QualifiedName, TOOL_SVC};
use crate::registry::TypeRegistry;
use crate::resolve;
use gconf_property::{
    ComponentKind, ComponentRef, HandleKind, KeyMatch, Property, Schema, Source, TypeSpec, Value,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How an assignment combines with the current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    /// `=`: replace
    Set,
    /// `+=`: append or merge
    Append,
    /// `-=`: remove by value
    Remove,
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Set => "=",
            Self::Append => "+=",
            Self::Remove => "-=",
        })
    }
}

/// Warning text for a mis-cased property key
#[must_use]
pub fn spelling_warning(requested: &str, component: &str, correct: &str) -> String {
    format!(
        "Option '{requested}' was requested for {component}, but the correct spelling is '{correct}'"
    )
}

/// Set of live configurables keyed by qualified name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: TypeRegistry,
    pub(crate) entries: IndexMap<String, Configurable>,
    frozen: bool,
    diagnostics: Diagnostics,
}

impl Catalog {
    /// Create an empty catalog over a type registry
    #[must_use]
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            types,
            entries: IndexMap::new(),
            frozen: false,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Type registry
    #[inline]
    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Mutable type registry
    #[inline]
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Recorded diagnostics
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Mutable diagnostics sink
    #[inline]
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Whether the catalog has been frozen
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_mutable(&self, what: &str) -> CatalogResult<()> {
        if self.frozen {
            Err(CatalogError::Frozen(what.to_string()))
        } else {
            Ok(())
        }
    }

    /// Where a component of `kind` called `name` lives
    ///
    /// Undotted tool names are placed under the tool service.
    ///
    /// # Errors
    /// Fails on malformed names.
    pub fn default_location(kind: ComponentKind, name: &str) -> CatalogResult<QualifiedName> {
        let qn: QualifiedName = name.parse()?;
        if kind == ComponentKind::AlgTool && qn.len() == 1 {
            QualifiedName::single(TOOL_SVC)?.child(name)
        } else {
            Ok(qn)
        }
    }

    /// Find or create a typed configurable, reporting whether it was created
    ///
    /// # Errors
    /// Fails on unknown types, type mismatch with a live instance, or when a
    /// generic instance cannot be promoted to the type.
    pub fn ensure(&mut self, type_name: &str, name: &str) -> CatalogResult<(QualifiedName, bool)> {
        let schema = self.types.resolve_type(type_name)?;
        let qn = Self::default_location(schema.kind(), name)?;
        self.ensure_at(schema, qn)
    }

    /// Find or create a typed configurable
    ///
    /// Creating `T("X")` twice returns the same instance.
    ///
    /// # Errors
    /// Same as [`Catalog::ensure`].
    pub fn get_or_create(&mut self, type_name: &str, name: &str) -> CatalogResult<&mut Configurable> {
        let (qn, _) = self.ensure(type_name, name)?;
        let key = qn.to_string();
        self.entries.get_mut(&key).ok_or(CatalogError::NotFound(key))
    }

    fn ensure_at(
        &mut self,
        schema: Arc<Schema>,
        qn: QualifiedName,
    ) -> CatalogResult<(QualifiedName, bool)> {
        let key = qn.to_string();
        let existing = self
            .entries
            .get(&key)
            .map(|c| (c.is_generic(), c.type_name().to_string()));
        match existing {
            Some((true, _)) => {
                self.ensure_mutable(&key)?;
                self.promote(&key, &schema)?;
                Ok((qn, false))
            }
            Some((false, existing)) if existing != schema.type_name() => {
                Err(CatalogError::TypeMismatch {
                    name: key,
                    existing,
                    requested: schema.type_name().to_string(),
                })
            }
            Some(_) => Ok((qn, false)),
            None => {
                self.ensure_mutable(&key)?;
                tracing::debug!("creating {}/{}", schema.type_name(), key);
                self.entries
                    .insert(key, Configurable::typed(qn.clone(), schema));
                Ok((qn, true))
            }
        }
    }

    /// Replace a generic instance by a typed one, re-validating its values
    fn promote(&mut self, key: &str, schema: &Arc<Schema>) -> CatalogResult<()> {
        let generic = self
            .entries
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))?;
        let mut typed = Configurable::typed(generic.name.clone(), Arc::clone(schema));
        typed.tools = generic.tools;
        typed.state = generic.state;
        for (requested, property) in generic.properties {
            let canonical = match schema.resolve_key(&requested) {
                KeyMatch::Exact(name) => name.to_string(),
                KeyMatch::CaseInsensitive(name) => {
                    self.diagnostics
                        .warn(spelling_warning(&requested, key, name));
                    name.to_string()
                }
                KeyMatch::Unknown(suggestion) => {
                    return Err(CatalogError::UnknownProperty {
                        component: key.to_string(),
                        property: requested,
                        suggestion: suggestion.map(str::to_string),
                    })
                }
            };
            if let Some(slot) = typed.property_mut(&canonical) {
                slot.set(property.value().clone(), property.source())
                    .map_err(|shape| CatalogError::property(key, shape.for_property(&canonical)))?;
            }
        }
        tracing::debug!("promoted generic {} to {}", key, schema.type_name());
        self.entries.insert(key.to_string(), typed);
        Ok(())
    }

    /// Find a configurable for options text, creating a generic one if needed
    ///
    /// A missing top-level name that matches a registered non-tool type (or a
    /// `ToolSvc.<Type>` public tool) is created typed.
    ///
    /// # Errors
    /// Fails on malformed names or after freeze.
    pub fn lookup_or_generic(&mut self, name: &str) -> CatalogResult<&mut Configurable> {
        if !self.entries.contains_key(name) {
            self.ensure_mutable(name)?;
            let qn: QualifiedName = name.parse()?;
            let schema = self.types.get(qn.leaf()).cloned().filter(|s| {
                if s.kind() == ComponentKind::AlgTool {
                    qn.is_public_tool()
                } else {
                    qn.len() == 1
                }
            });
            let conf = match schema {
                Some(schema) => Configurable::typed(qn, schema),
                None => {
                    tracing::debug!("creating generic configurable {}", name);
                    Configurable::generic(qn, "")
                }
            };
            self.entries.insert(name.to_string(), conf);
        }
        self.entries
            .get_mut(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// Add a restored or externally built configurable
    ///
    /// # Errors
    /// Fails when the name is taken or the catalog is frozen.
    pub fn insert(&mut self, conf: Configurable) -> CatalogResult<()> {
        let key = conf.name().to_string();
        self.ensure_mutable(&key)?;
        if self.entries.contains_key(&key) {
            return Err(CatalogError::AlreadyExists(key));
        }
        self.entries.insert(key, conf);
        Ok(())
    }

    /// Configurable by qualified name
    #[inline]
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Configurable> {
        self.entries.get(name)
    }

    /// Configurable by qualified name, or an error
    ///
    /// # Errors
    /// Returns [`CatalogError::NotFound`].
    pub fn get(&self, name: &str) -> CatalogResult<&Configurable> {
        self.entries
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// Mutable access for lifecycle bookkeeping
    #[inline]
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Configurable> {
        self.entries.get_mut(name)
    }

    /// Check if a qualified name is present
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of configurables
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Qualified names in creation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Configurables in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Configurable> {
        self.entries.values()
    }

    /// Configurables sorted by qualified name
    #[must_use]
    pub fn sorted(&self) -> Vec<&Configurable> {
        let mut out: Vec<&Configurable> = self.entries.values().collect();
        out.sort_by(|a, b| a.name().to_string().cmp(&b.name().to_string()));
        out
    }

    /// Configurables the runtime needs: everything except user-level ones
    #[must_use]
    pub fn needed(&self) -> Vec<&Configurable> {
        self.sorted().into_iter().filter(|c| !c.is_user()).collect()
    }

    /// Find a configurable from its serialized `Type/Name` reference
    #[must_use]
    pub fn find_by_full_name(&self, full_name: &str) -> Option<&Configurable> {
        let r = ComponentRef::parse(full_name);
        let type_ok = |c: &&Configurable| c.type_name().is_empty() || c.type_name() == r.type_name;
        self.entries
            .get(&r.name)
            .filter(type_ok)
            .or_else(|| {
                self.entries
                    .get(&format!("{TOOL_SVC}.{}", r.name))
                    .filter(type_ok)
            })
            .or_else(|| {
                self.entries
                    .values()
                    .find(|c| c.leaf() == r.name && c.type_name() == r.type_name)
            })
    }

    fn canonical_key(&mut self, component: &str, key: &str, source: Source) -> CatalogResult<String> {
        let conf = self.get(component)?;
        let Some(schema) = conf.schema().cloned() else {
            if conf.property(key).is_some() || source.is_textual() {
                return Ok(key.to_string());
            }
            return Err(CatalogError::UnknownProperty {
                component: component.to_string(),
                property: key.to_string(),
                suggestion: None,
            });
        };
        match schema.resolve_key(key) {
            KeyMatch::Exact(name) => Ok(name.to_string()),
            KeyMatch::CaseInsensitive(name) => {
                let name = name.to_string();
                self.diagnostics
                    .warn(spelling_warning(key, component, &name));
                Ok(name)
            }
            KeyMatch::Unknown(suggestion) => Err(CatalogError::UnknownProperty {
                component: component.to_string(),
                property: key.to_string(),
                suggestion: suggestion.map(str::to_string),
            }),
        }
    }

    /// Apply one assignment; returns the number of elements touched
    ///
    /// `Remove` reports how many elements were dropped and warns when none
    /// matched.
    ///
    /// # Errors
    /// Fails on unknown components, unknown keys on typed configurables (or
    /// on generic ones from scripted sources), type mismatch, self
    /// references, and after freeze.
    pub fn assign(
        &mut self,
        component: &str,
        key: &str,
        op: AssignOp,
        value: Value,
        source: Source,
    ) -> CatalogResult<usize> {
        self.ensure_mutable(&format!("{component}.{key}"))?;
        let canonical = self.canonical_key(component, key, source)?;
        if let Value::Ref(r) = &value {
            if r.component == component && r.property == canonical {
                return Err(CatalogError::SelfReference {
                    component: component.to_string(),
                    property: canonical,
                });
            }
        }
        let conf = self
            .entries
            .get_mut(component)
            .ok_or_else(|| CatalogError::NotFound(component.to_string()))?;
        let wrap = |e| CatalogError::property(component, e);

        let Some(slot) = conf.property_mut(&canonical) else {
            // Only generic configurables reach here
            return match op {
                AssignOp::Set => {
                    conf.insert_property(canonical, Property::generic(value, source));
                    Ok(1)
                }
                AssignOp::Append => {
                    let value = match value {
                        v @ (Value::List(_) | Value::Set(_) | Value::Map(_)) => v,
                        Value::Tuple(items) => Value::List(items),
                        single => Value::List(vec![single]),
                    };
                    conf.insert_property(canonical, Property::generic(value, source));
                    Ok(1)
                }
                AssignOp::Remove => {
                    self.diagnostics.warn(format!(
                        "Nothing removed from property {component}.{canonical}"
                    ));
                    Ok(0)
                }
            };
        };

        match op {
            AssignOp::Set => {
                slot.set(value, source)
                    .map_err(|shape| wrap(shape.for_property(&canonical)))?;
                Ok(1)
            }
            AssignOp::Append => {
                slot.append(&canonical, value, source).map_err(wrap)?;
                Ok(1)
            }
            AssignOp::Remove => {
                let removed = slot.remove(&canonical, &value, source).map_err(wrap)?;
                if removed == 0 {
                    self.diagnostics.warn(format!(
                        "Nothing removed from property {component}.{canonical}"
                    ));
                }
                Ok(removed)
            }
        }
    }

    /// Replace a property value
    ///
    /// # Errors
    /// Same as [`Catalog::assign`].
    pub fn set(
        &mut self,
        component: &str,
        key: &str,
        value: impl Into<Value>,
        source: Source,
    ) -> CatalogResult<()> {
        self.assign(component, key, AssignOp::Set, value.into(), source)
            .map(|_| ())
    }

    /// Append to a collection property
    ///
    /// # Errors
    /// Same as [`Catalog::assign`].
    pub fn append(
        &mut self,
        component: &str,
        key: &str,
        delta: impl Into<Value>,
        source: Source,
    ) -> CatalogResult<()> {
        self.assign(component, key, AssignOp::Append, delta.into(), source)
            .map(|_| ())
    }

    /// Current value of a property, accepting mis-cased keys without warning
    ///
    /// # Errors
    /// Fails on unknown components or keys.
    pub fn value(&self, component: &str, key: &str) -> CatalogResult<&Value> {
        let conf = self.get(component)?;
        conf.property(key)
            .or_else(|| {
                conf.properties()
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, p)| p)
            })
            .map(Property::value)
            .ok_or_else(|| CatalogError::UnknownProperty {
                component: component.to_string(),
                property: key.to_string(),
                suggestion: None,
            })
    }

    /// Store a reference to a live configurable in a handle property
    ///
    /// A private-tool handle given a tool owned elsewhere receives a copy of
    /// it under `owner`.
    ///
    /// # Errors
    /// Fails when the property is not a component handle or either side is
    /// missing.
    pub fn set_handle(
        &mut self,
        owner: &str,
        key: &str,
        target: &str,
        source: Source,
    ) -> CatalogResult<()> {
        let canonical = self.canonical_key(owner, key, source)?;
        let spec = self
            .get(owner)?
            .property(&canonical)
            .map(|p| p.spec().clone());
        let Some(TypeSpec::Handle(handle)) = spec.filter(|s| matches!(s, TypeSpec::Handle(h) if h.is_component())) else {
            return Err(CatalogError::NotAHandle {
                component: owner.to_string(),
                property: canonical,
            });
        };
        let target_conf = self.get(target)?;
        let owner_qn: QualifiedName = owner.parse()?;
        let mut reference = target_conf.component_ref();
        if handle.kind == HandleKind::PrivateTool
            && target_conf.name().parent().as_ref() != Some(&owner_qn)
        {
            let leaf = target_conf.leaf().to_string();
            let local = owner_qn.child(&leaf)?;
            if !self.contains(&local.to_string()) {
                self.clone_configurable(target, &local.to_string())?;
            }
            if let Some(parent) = self.entries.get_mut(owner) {
                parent.tools.insert(leaf, local.clone());
            }
            reference = self.get(&local.to_string())?.component_ref();
        }
        self.set(owner, &canonical, Value::Handle(reference), source)
    }

    /// Create or return a private tool `<parent>.<leaf>` of `type_name`
    ///
    /// With `ToolSvc` as parent the tool is public. When the parent declares
    /// a handle property named `leaf`, it is bound to the new tool.
    ///
    /// # Errors
    /// Fails when the type is not a tool, the parent is missing, or names
    /// clash.
    pub fn add_tool(&mut self, parent: &str, type_name: &str, leaf: &str) -> CatalogResult<QualifiedName> {
        self.ensure_mutable(parent)?;
        let schema = self.types.resolve_type(type_name)?;
        if schema.kind() != ComponentKind::AlgTool {
            return Err(CatalogError::NotATool {
                name: leaf.to_string(),
                type_name: type_name.to_string(),
            });
        }
        if parent != TOOL_SVC {
            self.get(parent)?;
        }
        let parent_qn: QualifiedName = parent.parse()?;
        let (qn, _) = self.ensure_at(schema, parent_qn.child(leaf)?)?;
        if let Some(owner) = self.entries.get_mut(parent) {
            owner.tools.insert(leaf.to_string(), qn.clone());
            let binds = owner
                .schema()
                .and_then(|s| s.descriptor(leaf))
                .is_some_and(|d| matches!(&d.spec, TypeSpec::Handle(h) if h.is_component()));
            if binds {
                self.set_handle(parent, leaf, &qn.to_string(), Source::Script)?;
            }
        }
        Ok(qn)
    }

    /// Deep-copy a configurable, and its private tools, under a new name
    ///
    /// # Errors
    /// Fails when the source is missing or the new name is taken.
    pub fn clone_configurable(&mut self, source: &str, new_name: &str) -> CatalogResult<QualifiedName> {
        self.ensure_mutable(new_name)?;
        let original = self.get(source)?.clone();
        let new_qn: QualifiedName = new_name.parse()?;
        let key = new_qn.to_string();
        if self.entries.contains_key(&key) {
            return Err(CatalogError::AlreadyExists(key));
        }
        let mut copy = original.clone();
        copy.name = new_qn.clone();
        copy.state = Lifecycle::Fresh;
        copy.tools.clear();
        self.entries.insert(key.clone(), copy);
        for (leaf, tool) in original.tools {
            let child = new_qn.child(&leaf)?;
            let child = self.clone_configurable(&tool.to_string(), &child.to_string())?;
            if let Some(conf) = self.entries.get_mut(&key) {
                conf.tools.insert(leaf, child);
            }
        }
        Ok(new_qn)
    }

    /// Resolve a component handle, instantiating a default target if absent
    ///
    /// Private tools resolve to `<owner>.<leaf>`, public tools to
    /// `ToolSvc.<leaf>`. Returns `None` for an empty handle.
    ///
    /// # Errors
    /// Fails when the property is not a component handle or the target type
    /// is unknown.
    pub fn resolve_handle(&mut self, owner: &str, key: &str) -> CatalogResult<Option<QualifiedName>> {
        let conf = self.get(owner)?;
        let not_a_handle = || CatalogError::NotAHandle {
            component: owner.to_string(),
            property: key.to_string(),
        };
        let property = conf.property(key).ok_or_else(not_a_handle)?;
        let TypeSpec::Handle(handle) = property.spec() else {
            return Err(not_a_handle());
        };
        if !handle.is_component() {
            return Err(not_a_handle());
        }
        let kind = handle.kind.clone();
        let reference = match property.value() {
            Value::Handle(r) => r.clone(),
            Value::String(s) => ComponentRef::parse(s),
            _ => return Err(not_a_handle()),
        };
        if reference.is_empty() {
            return Ok(None);
        }
        let owner_qn = conf.name().clone();
        let location = match kind {
            HandleKind::PrivateTool => owner_qn.child(&reference.name)?,
            HandleKind::PublicTool if !reference.name.contains('.') => {
                QualifiedName::single(TOOL_SVC)?.child(&reference.name)?
            }
            _ => reference.name.parse()?,
        };
        let location_key = location.to_string();
        if !self.contains(&location_key) {
            let schema = self.types.resolve_type(&reference.type_name)?;
            self.ensure_at(schema, location.clone())?;
            tracing::debug!("instantiated {} for {}.{}", location_key, owner, key);
            if kind == HandleKind::PrivateTool {
                if let Some(parent) = self.entries.get_mut(owner) {
                    parent.tools.insert(reference.name.clone(), location.clone());
                }
            }
        }
        if let Some(target) = self.entries.get_mut(&location_key) {
            if target.state == Lifecycle::Fresh {
                target.state = Lifecycle::Queried;
            }
        }
        Ok(Some(location))
    }

    /// Resolve every `@ref` and make the catalog read-only
    ///
    /// Calling it again is a no-op.
    ///
    /// # Errors
    /// Fails on unresolved, self-referencing, or circular references, and
    /// when a resolved value does not fit its property type.
    pub fn freeze(&mut self) -> CatalogResult<()> {
        if self.frozen {
            return Ok(());
        }
        let resolved = resolve::resolve_references(self)?;
        if resolved > 0 {
            tracing::debug!("resolved {} late-bound references", resolved);
        }
        self.frozen = true;
        Ok(())
    }

    /// Remove every configurable, returning them marked as purged
    ///
    /// The type registry is kept; diagnostics are cleared.
    pub fn purge(&mut self) -> Vec<Configurable> {
        self.frozen = false;
        self.diagnostics.clear();
        self.entries
            .drain(..)
            .map(|(_, mut c)| {
                c.state = Lifecycle::Purged;
                c
            })
            .collect()
    }
}
