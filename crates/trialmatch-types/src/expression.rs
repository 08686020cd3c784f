//! Criterion trees
//!
//! A [`RuleExpression`] is a rule applied to an ordered parameter list.
//! Parameters are either raw text tokens (decoded later by the input
//! resolver) or nested expressions (for composite rules).
//!
//! The `Display` form is the criterion text syntax accepted by the parser:
//!
//! ```text
//! AND(IS_AT_LEAST_X_YEARS_OLD[18], OR(HAS_TUMOR_STAGE_X[III], HAS_TUMOR_STAGE_X[IV]))
//! ```

use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One parameter of a rule expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    /// Untyped text token, e.g. `"18"` or `"BRAF;KRAS"`
    Token(String),
    /// Nested criterion
    Function(RuleExpression),
}

impl Parameter {
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token),
            Self::Function(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&RuleExpression> {
        match self {
            Self::Function(expression) => Some(expression),
            Self::Token(_) => None,
        }
    }
}

impl From<&str> for Parameter {
    fn from(token: &str) -> Self {
        Self::Token(token.to_string())
    }
}

impl From<String> for Parameter {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

impl From<RuleExpression> for Parameter {
    fn from(expression: RuleExpression) -> Self {
        Self::Function(expression)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => f.write_str(token),
            Self::Function(expression) => write!(f, "{}", expression),
        }
    }
}

/// A rule applied to its parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleExpression {
    pub rule: Rule,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl RuleExpression {
    pub fn new(rule: Rule, parameters: Vec<Parameter>) -> Self {
        Self { rule, parameters }
    }

    /// Leaf expression from text tokens
    pub fn leaf<I, T>(rule: Rule, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(
            rule,
            tokens.into_iter().map(|t| Parameter::Token(t.into())).collect(),
        )
    }

    /// Composite expression over sub-criteria
    pub fn composite(rule: Rule, children: impl IntoIterator<Item = RuleExpression>) -> Self {
        Self::new(rule, children.into_iter().map(Parameter::Function).collect())
    }

    /// Nested expressions among the parameters
    pub fn children(&self) -> impl Iterator<Item = &RuleExpression> {
        self.parameters.iter().filter_map(Parameter::as_function)
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + self.children().map(RuleExpression::node_count).sum::<usize>()
    }

    /// Length of the longest root-to-leaf chain
    pub fn depth(&self) -> usize {
        1 + self.children().map(RuleExpression::depth).max().unwrap_or(0)
    }

    /// Every rule used in the tree, in pre-order
    pub fn rules(&self) -> Vec<Rule> {
        let mut rules = vec![self.rule];
        for child in self.children() {
            rules.extend(child.rules());
        }
        rules
    }
}

impl fmt::Display for RuleExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule.name())?;
        let Some(first) = self.parameters.first() else {
            return Ok(());
        };
        let (open, close) = match first {
            Parameter::Function(_) => ('(', ')'),
            Parameter::Token(_) => ('[', ']'),
        };
        write!(f, "{}", open)?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", parameter)?;
        }
        write!(f, "{}", close)
    }
}
