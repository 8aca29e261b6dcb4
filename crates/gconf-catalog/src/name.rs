//! Qualified configurable names
//!
//! Provides [`QualifiedName`], the dotted ownership path of a configurable.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Name of the shared tool service owning public tools
pub const TOOL_SVC: &str = "ToolSvc";

/// Dotted ownership path of a configurable
///
/// # Examples
/// - `MyAlg` → top-level component
/// - `ToolSvc.Public` → public tool
/// - `ToolSvc.Public.Private` → private tool of a public tool
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualifiedName(Vec<String>);

impl QualifiedName {
    /// Create a single-segment name
    ///
    /// # Errors
    /// Fails when the segment is empty or holds forbidden characters.
    pub fn single(segment: impl Into<String>) -> Result<Self, CatalogError> {
        let segment = segment.into();
        validate_segment(&segment)?;
        Ok(Self(vec![segment]))
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a qualified name has at least one segment
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Owner name, if this is an owned component
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// Short leaf name
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Name of an owned component
    ///
    /// # Errors
    /// Fails when the leaf is not a valid segment.
    pub fn child(&self, leaf: &str) -> Result<Self, CatalogError> {
        validate_segment(leaf)?;
        let mut new = self.clone();
        new.0.push(leaf.to_string());
        Ok(new)
    }

    /// Check whether this name is owned directly or indirectly by `other`
    #[must_use]
    pub fn is_descendant_of(&self, other: &Self) -> bool {
        self.0.len() > other.0.len() && self.0[..other.0.len()] == other.0[..]
    }

    /// Check whether this is a public tool location
    #[must_use]
    pub fn is_public_tool(&self) -> bool {
        self.0.len() == 2 && self.0[0] == TOOL_SVC
    }

    /// Same leaf under a different owner
    #[must_use]
    pub fn reparent(&self, from: &Self, to: &Self) -> Option<Self> {
        if !self.is_descendant_of(from) && self != from {
            return None;
        }
        let mut segments = to.0.clone();
        segments.extend_from_slice(&self.0[from.0.len()..]);
        Some(Self(segments))
    }
}

fn validate_segment(segment: &str) -> Result<(), CatalogError> {
    let bad = segment.is_empty()
        || segment
            .chars()
            .any(|c| c == '.' || c == '/' || c == '"' || c == '\'' || c.is_whitespace());
    if bad {
        Err(CatalogError::InvalidName(segment.to_string()))
    } else {
        Ok(())
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for QualifiedName {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        for segment in &segments {
            validate_segment(segment).map_err(|_| CatalogError::InvalidName(s.to_string()))?;
        }
        Ok(Self(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let name: QualifiedName = "ToolSvc.Public.Private".parse().unwrap();
        assert_eq!(name.len(), 3);
        assert_eq!(name.leaf(), "Private");
        assert_eq!(name.to_string(), "ToolSvc.Public.Private");
        assert_eq!(name.parent().unwrap().to_string(), "ToolSvc.Public");
    }

    #[test]
    fn test_invalid_names() {
        assert!("".parse::<QualifiedName>().is_err());
        assert!("a..b".parse::<QualifiedName>().is_err());
        assert!("My Alg".parse::<QualifiedName>().is_err());
        assert!("Type/Name".parse::<QualifiedName>().is_err());
    }

    #[test]
    fn test_namespaced_segment_allowed() {
        let name: QualifiedName = "Gaudi::Examples::Counter".parse().unwrap();
        assert_eq!(name.len(), 1);
    }

    #[test]
    fn test_child_and_descendant() {
        let parent: QualifiedName = "MyAlg".parse().unwrap();
        let child = parent.child("Tool").unwrap();
        assert!(child.is_descendant_of(&parent));
        assert!(!parent.is_descendant_of(&child));
        assert!(parent.child("a.b").is_err());
    }

    #[test]
    fn test_public_tool_location() {
        assert!("ToolSvc.X".parse::<QualifiedName>().unwrap().is_public_tool());
        assert!(!"MyAlg.X".parse::<QualifiedName>().unwrap().is_public_tool());
    }

    #[test]
    fn test_reparent() {
        let from: QualifiedName = "A".parse().unwrap();
        let to: QualifiedName = "B".parse().unwrap();
        let tool: QualifiedName = "A.T.U".parse().unwrap();
        assert_eq!(tool.reparent(&from, &to).unwrap().to_string(), "B.T.U");
        let other: QualifiedName = "C.T".parse().unwrap();
        assert!(other.reparent(&from, &to).is_none());
    }
}
