//! Step records of the fixpoint iterations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The analysis a step belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Terminating,
    Nullable,
    Reachable,
    Unit,
    Useless,
}

impl Phase {
    /// The prefix of the iteration labels emitted in this phase.
    pub fn label(self) -> &'static str {
        match self {
            Self::Terminating => "TERM",
            Self::Nullable => "NULL",
            Self::Reachable => "REACH",
            Self::Unit => "UNIT",
            Self::Useless => "USELESS",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminating => f.write_str("terminating"),
            Self::Nullable => f.write_str("nullable"),
            Self::Reachable => f.write_str("reachable"),
            Self::Unit => f.write_str("unit"),
            Self::Useless => f.write_str("useless"),
        }
    }
}

/// A single record of the trace.
///
/// Steps are value snapshots; nothing in them refers back to the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub phase: Phase,
    /// The iteration label, e.g. `TERM_2`.
    pub iteration: String,
    /// The admitted variables after this step, in set notation.
    pub variables: String,
    /// The rule or production that caused the change.
    pub explanation: String,
    /// The variables newly admitted by this step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_variables: Vec<String>,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}  ({})", self.iteration, self.variables, self.explanation)?;
        if !self.new_variables.is_empty() {
            write!(f, " [+{}]", self.new_variables.join(", "))?;
        }
        Ok(())
    }
}

/// The ordered sequence of steps produced by one analysis.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    steps: Vec<Step>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Append the steps of another trace after the steps of this one.
    pub fn append(&mut self, other: Trace) {
        self.steps.extend(other.steps);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps[..]
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

impl IntoIterator for Trace {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// A computed value along with the trace that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Traced<T> {
    pub value: T,
    pub trace: Trace,
}

/// Accumulates the steps of one analysis, numbering the iterations.
#[derive(Debug)]
pub(crate) struct Recorder {
    phase: Phase,
    label: String,
    next: usize,
    trace: Trace,
}

impl Recorder {
    pub(crate) fn new(phase: Phase) -> Self {
        Self::with_label(phase, phase.label())
    }

    pub(crate) fn with_label(phase: Phase, label: impl Into<String>) -> Self {
        Self {
            phase,
            label: label.into(),
            next: 1,
            trace: Trace::new(),
        }
    }

    /// The label the next recorded step will carry.
    pub(crate) fn current_label(&self) -> String {
        format!("{}_{}", self.label, self.next)
    }

    pub(crate) fn record(
        &mut self,
        variables: String,
        explanation: String,
        new_variables: Vec<String>,
    ) {
        let iteration = self.current_label();
        tracing::trace!("{}: {} ({})", iteration, variables, explanation);
        self.trace.push(Step {
            phase: self.phase,
            iteration,
            variables,
            explanation,
            new_variables,
        });
        self.next += 1;
    }

    pub(crate) fn finish(self) -> Trace {
        self.trace
    }
}
