//! The operation boundary consumed by the presentation layer.

use crate::{
    analysis,
    grammar::{Grammar, GrammarError, StructuredGrammar},
    reduce::{self, ReduceError},
    trace::Step,
    types::Map,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The analyses offered by a `Session`.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Terminating,
    Nullable,
    Reachable,
    Unit,
    Useless,
}

impl Algorithm {
    pub const ALL: [Self; 5] = [
        Self::Terminating,
        Self::Nullable,
        Self::Reachable,
        Self::Unit,
        Self::Useless,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Terminating => "terminating",
            Self::Nullable => "nullable",
            Self::Reachable => "reachable",
            Self::Unit => "unit",
            Self::Useless => "useless",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Terminating => "Terminating variables",
            Self::Nullable => "Nullable variables",
            Self::Reachable => "Reachable variables",
            Self::Unit => "Unit closures",
            Self::Useless => "Grammar without useless variables",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_owned()))
    }
}

/// The result of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    /// A set of variables, sorted.
    Set {
        title: String,
        values: Vec<String>,
        steps: Vec<Step>,
    },
    /// A set of variables per variable, both sorted.
    Mapping {
        title: String,
        values: Map<String, Vec<String>>,
        steps: Vec<Step>,
    },
    /// A derived grammar.
    Grammar {
        title: String,
        value: StructuredGrammar,
        steps: Vec<Step>,
    },
}

impl Outcome {
    pub fn title(&self) -> &str {
        match self {
            Self::Set { title, .. } | Self::Mapping { title, .. } | Self::Grammar { title, .. } => {
                title.as_str()
            }
        }
    }

    pub fn steps(&self) -> &[Step] {
        match self {
            Self::Set { steps, .. } | Self::Mapping { steps, .. } | Self::Grammar { steps, .. } => {
                &steps[..]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("malformed grammar: {}", _0)]
    Malformed(#[from] GrammarError),

    #[error("no grammar loaded; load a grammar first")]
    NoGrammarLoaded,

    #[error("the grammar generates no string: the start symbol `{start}' is not terminating")]
    EmptyLanguage { start: String },

    #[error("unknown algorithm: `{}'", _0)]
    UnknownAlgorithm(String),
}

impl From<ReduceError> for Error {
    fn from(err: ReduceError) -> Self {
        match err {
            ReduceError::EmptyLanguage { start } => Self::EmptyLanguage { start },
            ReduceError::Grammar(err) => Self::Malformed(err),
        }
    }
}

/// The tagged success/error value returned across the boundary.
///
/// The fields of the success payload are flattened next to the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response<T> {
    Success(T),
    Error { message: String },
}

impl<T> From<Result<T, Error>> for Response<T> {
    fn from(res: Result<T, Error>) -> Self {
        match res {
            Ok(payload) => Self::Success(payload),
            Err(err) => Self::Error {
                message: err.to_string(),
            },
        }
    }
}

/// The success payload of `Session::load_grammar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loaded {
    pub message: String,
    pub data: StructuredGrammar,
}

impl From<StructuredGrammar> for Loaded {
    fn from(data: StructuredGrammar) -> Self {
        Self {
            message: "grammar loaded successfully".into(),
            data,
        }
    }
}

/// The success payload of `Session::run_algorithm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Computed {
    pub result: Outcome,
}

impl From<Outcome> for Computed {
    fn from(result: Outcome) -> Self {
        Self { result }
    }
}

/// Owns the loaded grammar and the outcomes computed for it.
#[derive(Debug, Default)]
pub struct Session {
    grammar: Option<Grammar>,
    cache: Map<Algorithm, Outcome>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grammar(&self) -> Option<&Grammar> {
        self.grammar.as_ref()
    }

    /// Replace the loaded grammar with the one parsed from `text`.
    ///
    /// On failure the previously loaded grammar is kept.
    pub fn load(&mut self, text: &str) -> Result<StructuredGrammar, Error> {
        let grammar: Grammar = text.parse().map_err(|err| {
            tracing::debug!("rejected grammar: {}", err);
            Error::Malformed(err)
        })?;
        let structured = grammar.to_structured();
        tracing::debug!(
            "loaded grammar: {} variables, {} terminals",
            structured.variables.len(),
            structured.terminals.len()
        );
        self.grammar = Some(grammar);
        self.cache.clear();
        Ok(structured)
    }

    /// Run the specified analysis against the loaded grammar.
    pub fn run(&mut self, algorithm: Algorithm) -> Result<Outcome, Error> {
        let grammar = self.grammar.as_ref().ok_or(Error::NoGrammarLoaded)?;
        if let Some(outcome) = self.cache.get(&algorithm) {
            tracing::trace!("reuse the outcome of {}", algorithm);
            return Ok(outcome.clone());
        }

        tracing::debug!("run {}", algorithm);
        let outcome = compute(grammar, algorithm)?;
        self.cache.insert(algorithm, outcome.clone());
        Ok(outcome)
    }

    /// `LoadGrammar(text)`
    pub fn load_grammar(&mut self, text: &str) -> Response<Loaded> {
        self.load(text).map(Loaded::from).into()
    }

    /// `RunAlgorithm(name)`
    pub fn run_algorithm(&mut self, name: &str) -> Response<Computed> {
        name.parse::<Algorithm>()
            .and_then(|algorithm| self.run(algorithm))
            .map(Computed::from)
            .into()
    }
}

fn compute(g: &Grammar, algorithm: Algorithm) -> Result<Outcome, Error> {
    let title = algorithm.title().to_owned();
    let outcome = match algorithm {
        Algorithm::Terminating | Algorithm::Nullable | Algorithm::Reachable => {
            let res = match algorithm {
                Algorithm::Terminating => analysis::terminating(g),
                Algorithm::Nullable => analysis::nullable(g),
                _ => analysis::reachable(g),
            };
            Outcome::Set {
                title,
                values: g.names(&res.value).into_iter().map(str::to_owned).collect(),
                steps: res.trace.into_steps(),
            }
        }

        Algorithm::Unit => {
            let res = analysis::unit_closures(g);
            Outcome::Mapping {
                title,
                values: res
                    .value
                    .iter()
                    .map(|(id, closure)| {
                        let closure: Vec<String> =
                            g.names(closure).into_iter().map(str::to_owned).collect();
                        (g.nonterminal(*id).to_owned(), closure)
                    })
                    .collect(),
                steps: res.trace.into_steps(),
            }
        }

        Algorithm::Useless => {
            let res = reduce::eliminate_useless(g)?;
            Outcome::Grammar {
                title,
                value: res.value.to_structured(),
                steps: res.trace.into_steps(),
            }
        }
    };
    Ok(outcome)
}
