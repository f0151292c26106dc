//! Simplification analyses of context-free grammars, traced step by step.

pub mod analysis;
pub mod grammar;
pub mod reduce;
pub mod session;
pub mod trace;
pub mod types;
pub mod util;

pub use crate::{
    grammar::{Grammar, GrammarError, StructuredGrammar},
    session::{Algorithm, Computed, Error, Loaded, Outcome, Response, Session},
    trace::{Step, Trace},
};
