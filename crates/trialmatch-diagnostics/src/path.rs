//! Locations of nodes inside a rule expression tree
//!
//! Configuration errors are raised while a criterion tree is turned into
//! evaluators, long after the criterion text is gone. A [`RulePath`] names
//! the offending node by the chain of rules leading to it, e.g.
//! `AND > OR#1 > HAS_TUMOR_STAGE_X#0`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// One step in a [`RulePath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    /// Rule name at this node
    pub rule: String,
    /// Position among the parent's parameters; `None` for the root
    pub index: Option<usize>,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}#{}", self.rule, index),
            None => write!(f, "{}", self.rule),
        }
    }
}

/// Path from the root of a criterion tree to one of its nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RulePath {
    segments: SmallVec<[PathSegment; 6]>,
}

impl RulePath {
    /// Path of a root node
    pub fn root(rule: impl Into<String>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(PathSegment {
            rule: rule.into(),
            index: None,
        });
        Self { segments }
    }

    /// Path of the `index`-th parameter of this node
    pub fn child(&self, index: usize, rule: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment {
            rule: rule.into(),
            index: Some(index),
        });
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Depth of the addressed node; the root has depth 1
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Rule name of the addressed node
    pub fn leaf_rule(&self) -> Option<&str> {
        self.segments.last().map(|s| s.rule.as_str())
    }
}

impl fmt::Display for RulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
