//! Evaluation results and their explanations
//!
//! An [`Evaluation`] is the verdict of one criterion for one patient. It is
//! immutable: combinators in the evaluation crate build new values from the
//! evaluations of sub-criteria rather than editing them.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Six-valued verdict of a criterion
///
/// Declaration order is the base ordering used for OR:
/// `FAIL < NOT_EVALUATED < NOT_IMPLEMENTED < UNDETERMINED < WARN < PASS`.
/// AND uses its own precedence, see [`EvaluationResult::and_rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationResult {
    /// Patient does not meet the criterion
    Fail,
    /// Criterion cannot be evaluated automatically (e.g. informed consent)
    NotEvaluated,
    /// Evaluation logic does not exist yet
    NotImplemented,
    /// Data required to decide is missing or ambiguous
    Undetermined,
    /// Criterion is probably met but needs manual review
    Warn,
    /// Patient meets the criterion
    Pass,
}

impl EvaluationResult {
    pub const ALL: [EvaluationResult; 6] = [
        Self::Fail,
        Self::NotEvaluated,
        Self::NotImplemented,
        Self::Undetermined,
        Self::Warn,
        Self::Pass,
    ];

    /// Position on the AND precedence table; the lowest rank wins.
    ///
    /// `FAIL < UNDETERMINED < NOT_EVALUATED < NOT_IMPLEMENTED < WARN < PASS`
    pub const fn and_rank(self) -> u8 {
        match self {
            Self::Fail => 0,
            Self::Undetermined => 1,
            Self::NotEvaluated => 2,
            Self::NotImplemented => 3,
            Self::Warn => 4,
            Self::Pass => 5,
        }
    }

    /// Position on the OR precedence table; the highest rank wins.
    pub const fn or_rank(self) -> u8 {
        self as u8
    }

    /// UNDETERMINED, NOT_EVALUATED and NOT_IMPLEMENTED carry no verdict
    pub const fn is_uninformative(self) -> bool {
        matches!(self, Self::Undetermined | Self::NotEvaluated | Self::NotImplemented)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fail => "FAIL",
            Self::NotEvaluated => "NOT_EVALUATED",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::Undetermined => "UNDETERMINED",
            Self::Warn => "WARN",
            Self::Pass => "PASS",
        }
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of a criterion together with the messages explaining it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    result: EvaluationResult,
    recoverable: bool,
    specific_messages: IndexSet<String>,
    general_messages: IndexSet<String>,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    inclusion_events: IndexSet<String>,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    exclusion_events: IndexSet<String>,
}

impl Evaluation {
    fn with_messages(
        result: EvaluationResult,
        recoverable: bool,
        specific: impl Into<String>,
        general: impl Into<String>,
    ) -> Self {
        EvaluationBuilder::new(result)
            .recoverable(recoverable)
            .specific(specific)
            .general(general)
            .build()
    }

    pub fn pass(specific: impl Into<String>, general: impl Into<String>) -> Self {
        Self::with_messages(EvaluationResult::Pass, false, specific, general)
    }

    pub fn warn(specific: impl Into<String>, general: impl Into<String>) -> Self {
        Self::with_messages(EvaluationResult::Warn, false, specific, general)
    }

    pub fn fail(specific: impl Into<String>, general: impl Into<String>) -> Self {
        Self::with_messages(EvaluationResult::Fail, false, specific, general)
    }

    /// A FAIL that further data or review could still overturn
    pub fn recoverable_fail(specific: impl Into<String>, general: impl Into<String>) -> Self {
        Self::with_messages(EvaluationResult::Fail, true, specific, general)
    }

    pub fn undetermined(specific: impl Into<String>, general: impl Into<String>) -> Self {
        Self::with_messages(EvaluationResult::Undetermined, true, specific, general)
    }

    pub fn not_evaluated(specific: impl Into<String>, general: impl Into<String>) -> Self {
        Self::with_messages(EvaluationResult::NotEvaluated, true, specific, general)
    }

    pub fn not_implemented(specific: impl Into<String>, general: impl Into<String>) -> Self {
        Self::with_messages(EvaluationResult::NotImplemented, true, specific, general)
    }

    pub fn result(&self) -> EvaluationResult {
        self.result
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn specific_messages(&self) -> &IndexSet<String> {
        &self.specific_messages
    }

    pub fn general_messages(&self) -> &IndexSet<String> {
        &self.general_messages
    }

    pub fn inclusion_events(&self) -> &IndexSet<String> {
        &self.inclusion_events
    }

    pub fn exclusion_events(&self) -> &IndexSet<String> {
        &self.exclusion_events
    }

    /// Same explanation under a different verdict
    pub fn with_result(self, result: EvaluationResult) -> Self {
        Self { result, ..self }
    }

    /// Same evaluation with inclusion and exclusion events exchanged
    pub fn with_swapped_events(self) -> Self {
        Self {
            inclusion_events: self.exclusion_events,
            exclusion_events: self.inclusion_events,
            ..self
        }
    }

    /// Union of the messages and events of `parts` under a new verdict
    pub fn combine<'a>(
        result: EvaluationResult,
        recoverable: bool,
        parts: impl IntoIterator<Item = &'a Evaluation>,
    ) -> Self {
        let mut builder = EvaluationBuilder::new(result).recoverable(recoverable);
        for part in parts {
            builder = builder.absorb(part);
        }
        builder.build()
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.result)?;
        if !self.specific_messages.is_empty() {
            let messages: Vec<&str> = self.specific_messages.iter().map(String::as_str).collect();
            write!(f, ": {}", messages.join("; "))?;
        }
        Ok(())
    }
}

/// Builder for evaluations with several messages or molecular events
#[derive(Debug, Clone)]
pub struct EvaluationBuilder {
    result: EvaluationResult,
    recoverable: bool,
    specific_messages: IndexSet<String>,
    general_messages: IndexSet<String>,
    inclusion_events: IndexSet<String>,
    exclusion_events: IndexSet<String>,
}

impl EvaluationBuilder {
    pub fn new(result: EvaluationResult) -> Self {
        Self {
            result,
            recoverable: false,
            specific_messages: IndexSet::new(),
            general_messages: IndexSet::new(),
            inclusion_events: IndexSet::new(),
            exclusion_events: IndexSet::new(),
        }
    }

    pub fn recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Add a patient-specific message; empty messages are dropped
    pub fn specific(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.is_empty() {
            self.specific_messages.insert(message);
        }
        self
    }

    /// Add a message suitable for summaries; empty messages are dropped
    pub fn general(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.is_empty() {
            self.general_messages.insert(message);
        }
        self
    }

    pub fn inclusion_event(mut self, event: impl Into<String>) -> Self {
        self.inclusion_events.insert(event.into());
        self
    }

    pub fn exclusion_event(mut self, event: impl Into<String>) -> Self {
        self.exclusion_events.insert(event.into());
        self
    }

    /// Take over all messages and events of another evaluation
    pub fn absorb(mut self, other: &Evaluation) -> Self {
        self.specific_messages.extend(other.specific_messages.iter().cloned());
        self.general_messages.extend(other.general_messages.iter().cloned());
        self.inclusion_events.extend(other.inclusion_events.iter().cloned());
        self.exclusion_events.extend(other.exclusion_events.iter().cloned());
        self
    }

    pub fn build(self) -> Evaluation {
        Evaluation {
            result: self.result,
            recoverable: self.recoverable,
            specific_messages: self.specific_messages,
            general_messages: self.general_messages,
            inclusion_events: self.inclusion_events,
            exclusion_events: self.exclusion_events,
        }
    }
}
