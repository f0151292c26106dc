//! Elimination of useless variables.

use crate::{
    analysis,
    grammar::{Grammar, GrammarError, NonterminalSet},
    trace::{Phase, Step, Traced},
    util::set_notation,
};

#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    #[error("the grammar generates no string: the start symbol `{start}' is not terminating")]
    EmptyLanguage { start: String },

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Remove the variables that are not both terminating and reachable.
///
/// The non-terminating variables are removed first and the reachable set is
/// computed over what remains; the other way around may keep variables that
/// are only reachable through removed productions.
#[tracing::instrument(skip_all)]
pub fn eliminate_useless(g: &Grammar) -> Result<Traced<Grammar>, ReduceError> {
    let terminating = analysis::terminating(g);
    let mut trace = terminating.trace;

    let start = g.start_symbol();
    if !terminating.value.contains(start) {
        return Err(ReduceError::EmptyLanguage {
            start: g.nonterminal(start).to_owned(),
        });
    }

    let intermediate = restrict(g, &terminating.value)?;

    let removed: Vec<&str> = g
        .nonterminals()
        .filter_map(|(id, name)| (!terminating.value.contains(id)).then_some(name))
        .collect();
    trace.push(Step {
        phase: Phase::Useless,
        iteration: "TERM → REACH".into(),
        variables: set_notation(g.names(&terminating.value)),
        explanation: if removed.is_empty() {
            "every variable is terminating".into()
        } else {
            format!(
                "removed non-terminating variables {}",
                set_notation(removed.iter().copied())
            )
        },
        new_variables: vec![],
    });

    let reachable = analysis::reachable(&intermediate);
    trace.append(reachable.trace);

    let reduced = restrict(&intermediate, &reachable.value)?;
    tracing::debug!(
        "{} of {} variables are useful",
        reachable.value.len(),
        g.nonterminals().count()
    );

    Ok(Traced {
        value: reduced,
        trace,
    })
}

/// Build the grammar consisting of the specified variables and the
/// alternatives using only them besides terminal symbols.
fn restrict(g: &Grammar, keep: &NonterminalSet) -> Result<Grammar, GrammarError> {
    Grammar::define(|def| {
        def.start_symbol(g.nonterminal(g.start_symbol()));
        for (left, productions) in g.rules() {
            if !keep.contains(left) {
                continue;
            }
            for production in productions {
                if production.nonterminals().all(|n| keep.contains(n)) {
                    def.rule(
                        g.nonterminal(left),
                        production.right().iter().map(|s| g.symbol(*s)),
                    )?;
                }
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(source: &str) -> Grammar {
        source.parse().unwrap()
    }

    #[test]
    fn keeps_useful_grammar_unchanged() {
        let g = grammar("S -> A B | b\nA -> a | λ\nB -> b");
        let reduced = eliminate_useless(&g).unwrap();
        assert_eq!(reduced.value, g);
        assert_eq!(reduced.value.to_structured(), g.to_structured());
    }

    #[test]
    fn drops_unreachable_variable() {
        let g = grammar("S -> a\nX -> b");
        let reduced = eliminate_useless(&g).unwrap().value;
        let structured = reduced.to_structured();
        assert_eq!(structured.variables, ["S"]);
        assert_eq!(structured.terminals, ["a"]);
        assert!(!structured.productions.contains_key("X"));
    }

    #[test]
    fn drops_non_terminating_variable_and_its_uses() {
        let g = grammar("S -> a | A b\nA -> A a");
        let reduced = eliminate_useless(&g).unwrap().value;
        assert_eq!(reduced.to_string(), "S -> a\n");
    }

    #[test]
    fn start_symbol_not_terminating() {
        let g = grammar("S -> A\nA -> A\nB -> b");
        let err = eliminate_useless(&g).unwrap_err();
        assert!(matches!(err, ReduceError::EmptyLanguage { ref start } if start == "S"));
        assert!(err.to_string().contains("generates no string"));
    }

    #[test]
    fn reachability_follows_termination() {
        // B is reachable only through A, which never terminates.
        let g = grammar("S -> a | A B\nA -> A a\nB -> b");

        // computing both sets on the original grammar keeps B.
        let t = analysis::terminating(&g).value;
        let mut naive = analysis::reachable(&g).value;
        naive.difference_with(&{
            let mut non_terminating: NonterminalSet = g.nonterminals().map(|(id, _)| id).collect();
            non_terminating.difference_with(&t);
            non_terminating
        });
        assert_eq!(g.names(&naive), ["B", "S"]);

        let reduced = eliminate_useless(&g).unwrap().value;
        assert_eq!(reduced.to_structured().variables, ["S"]);
    }

    #[test]
    fn trace_concatenates_both_passes() {
        let g = grammar("S -> a | A B\nA -> A a\nB -> b\nX -> x");
        let reduced = eliminate_useless(&g).unwrap();
        let phases: Vec<_> = reduced.trace.iter().map(|s| s.phase).collect();
        let marker = phases
            .iter()
            .position(|p| *p == Phase::Useless)
            .unwrap();
        assert!(phases[..marker].iter().all(|p| *p == Phase::Terminating));
        assert!(phases[marker + 1..].iter().all(|p| *p == Phase::Reachable));
        assert_eq!(phases.iter().filter(|p| **p == Phase::Useless).count(), 1);

        let step = &reduced.trace.steps()[marker];
        assert_eq!(step.variables, "{B, S, X}");
        assert_eq!(step.explanation, "removed non-terminating variables {A}");
        assert_eq!(reduced.value.to_string(), "S -> a\n");
    }

    #[test]
    fn original_grammar_is_untouched() {
        let g = grammar("S -> a\nX -> b");
        let before = g.clone();
        let _ = eliminate_useless(&g).unwrap();
        assert_eq!(g, before);
    }
}
