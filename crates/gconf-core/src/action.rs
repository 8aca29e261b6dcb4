//! Post-config action chain
//!
//! Actions run in registration order after scripted options and before the
//! ConfigurableUser apply. Appending an action equal to one already queued
//! moves it to the end.

use crate::error::CoreResult;
use crate::session::Session;
use gconf_options::ActionRecord;
use gconf_property::Value;
use std::fmt;
use std::sync::Arc;

/// Opaque script callback; never captured in dumps
pub type CallbackFn = dyn Fn(&mut Session) -> CoreResult<()> + Send + Sync;

/// One pending post-config action
#[derive(Clone)]
pub enum PostConfigAction {
    /// Replace a property value
    SetProperty {
        /// Qualified component name
        component: String,
        /// Property key
        property: String,
        /// New value
        value: Value,
    },
    /// Append to a collection property
    Append {
        /// Qualified component name
        component: String,
        /// Property key
        property: String,
        /// Delta
        value: Value,
    },
    /// Call a registered script
    InvokeNamed {
        /// Script name
        name: String,
        /// Positional arguments
        args: Vec<Value>,
    },
    /// Options statement, as given with `--option`
    Statement(String),
    /// Script-only callback
    Callback {
        /// Name used in logs
        label: String,
        /// Body
        body: Arc<CallbackFn>,
    },
}

impl PostConfigAction {
    /// Action setting `component.property`
    pub fn set(component: impl Into<String>, property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::SetProperty {
            component: component.into(),
            property: property.into(),
            value: value.into(),
        }
    }

    /// Action appending to `component.property`
    pub fn append(component: impl Into<String>, property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Append {
            component: component.into(),
            property: property.into(),
            value: value.into(),
        }
    }

    /// Action calling a registered script
    pub fn invoke(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self::InvokeNamed {
            name: name.into(),
            args,
        }
    }

    /// Action wrapping a closure
    pub fn callback<F>(label: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Session) -> CoreResult<()> + Send + Sync + 'static,
    {
        Self::Callback {
            label: label.into(),
            body: Arc::new(body),
        }
    }

    /// Short description for diagnostics
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::SetProperty {
                component,
                property,
                value,
            } => format!("{component}.{property} = {value}"),
            Self::Append {
                component,
                property,
                value,
            } => format!("{component}.{property} += {value}"),
            Self::InvokeNamed { name, .. } => format!("{name}()"),
            Self::Statement(text) => text.clone(),
            Self::Callback { label, .. } => label.clone(),
        }
    }

    /// Serializable form; `None` for callbacks
    #[must_use]
    pub fn to_record(&self) -> Option<ActionRecord> {
        Some(match self {
            Self::SetProperty {
                component,
                property,
                value,
            } => ActionRecord::SetProperty {
                component: component.clone(),
                property: property.clone(),
                value: value.clone(),
            },
            Self::Append {
                component,
                property,
                value,
            } => ActionRecord::Append {
                component: component.clone(),
                property: property.clone(),
                value: value.clone(),
            },
            Self::InvokeNamed { name, args } => ActionRecord::Invoke {
                name: name.clone(),
                args: args.clone(),
            },
            Self::Statement(text) => ActionRecord::Statement(text.clone()),
            Self::Callback { .. } => return None,
        })
    }
}

impl From<ActionRecord> for PostConfigAction {
    fn from(record: ActionRecord) -> Self {
        match record {
            ActionRecord::SetProperty {
                component,
                property,
                value,
            } => Self::SetProperty {
                component,
                property,
                value,
            },
            ActionRecord::Append {
                component,
                property,
                value,
            } => Self::Append {
                component,
                property,
                value,
            },
            ActionRecord::Invoke { name, args } => Self::InvokeNamed { name, args },
            ActionRecord::Statement(text) => Self::Statement(text),
        }
    }
}

impl PartialEq for PostConfigAction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Callback { body: a, .. }, Self::Callback { body: b, .. }) => Arc::ptr_eq(a, b),
            (Self::Callback { .. }, _) | (_, Self::Callback { .. }) => false,
            _ => self.to_record() == other.to_record(),
        }
    }
}

impl fmt::Debug for PostConfigAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PostConfigAction").field(&self.label()).finish()
    }
}

/// FIFO of pending actions
#[derive(Debug, Clone, Default)]
pub struct PostConfigChain {
    actions: Vec<PostConfigAction>,
}

impl PostConfigChain {
    /// Empty chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action; an equal queued action is moved to the end
    pub fn append(&mut self, action: PostConfigAction) {
        self.actions.retain(|a| a != &action);
        self.actions.push(action);
    }

    /// Drop an equal queued action; returns whether one was found
    pub fn remove(&mut self, action: &PostConfigAction) -> bool {
        let before = self.actions.len();
        self.actions.retain(|a| a != action);
        self.actions.len() != before
    }

    /// Take every queued action, leaving the chain empty
    pub fn take(&mut self) -> Vec<PostConfigAction> {
        std::mem::take(&mut self.actions)
    }

    /// Queued actions in order
    #[inline]
    #[must_use]
    pub fn actions(&self) -> &[PostConfigAction] {
        &self.actions
    }

    /// Serializable records of the queued actions, callbacks skipped
    #[must_use]
    pub fn records(&self) -> Vec<ActionRecord> {
        self.actions.iter().filter_map(PostConfigAction::to_record).collect()
    }

    /// Number of queued actions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check for an empty chain
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_moves_duplicate_to_end() {
        let mut chain = PostConfigChain::new();
        chain.append(PostConfigAction::set("A", "X", 1));
        chain.append(PostConfigAction::invoke("tweak", vec![]));
        chain.append(PostConfigAction::set("A", "X", 1));
        let labels: Vec<String> = chain.actions().iter().map(PostConfigAction::label).collect();
        assert_eq!(labels, vec!["tweak()", "A.X = 1"]);
    }

    #[test]
    fn test_remove() {
        let mut chain = PostConfigChain::new();
        let action = PostConfigAction::append("A", "L", Value::list([1]));
        chain.append(action.clone());
        assert!(chain.remove(&action));
        assert!(!chain.remove(&action));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_callbacks_compare_by_identity_and_skip_records() {
        let first = PostConfigAction::callback("cb", |_| Ok(()));
        let other = PostConfigAction::callback("cb", |_| Ok(()));
        assert_eq!(first, first.clone());
        assert_ne!(first, other);

        let mut chain = PostConfigChain::new();
        chain.append(first);
        chain.append(PostConfigAction::Statement("A.X = 2;".into()));
        assert_eq!(chain.records(), vec![ActionRecord::Statement("A.X = 2;".into())]);
    }

    #[test]
    fn test_record_conversion() {
        let action = PostConfigAction::invoke("fix", vec![Value::Int(3)]);
        let record = action.to_record().unwrap();
        assert_eq!(PostConfigAction::from(record), action);
    }
}
