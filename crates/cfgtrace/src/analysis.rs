//! Fixpoint analyses over the nonterminal symbols of a grammar.
//!
//! Every analysis grows a set of admitted variables until a pass adds
//! nothing. Candidates are always examined in ascending lexicographic order
//! of their names, so the emitted traces are reproducible.

use crate::{
    grammar::{Grammar, NonterminalID, NonterminalSet, Production, SymbolID},
    trace::{Phase, Recorder, Traced},
    types::Map,
    util::set_notation,
};

/// Calculate the set of variables deriving some string of terminal symbols.
///
/// Pass `i` admits the variables having an alternative over the terminal
/// symbols and the variables admitted until pass `i - 1`.
#[tracing::instrument(skip_all)]
pub fn terminating(g: &Grammar) -> Traced<NonterminalSet> {
    least_fixpoint(
        g,
        Phase::Terminating,
        |pass| match pass {
            1 => "alternatives over terminal symbols".into(),
            n => format!("alternatives over terminal symbols and TERM_{}", n - 1),
        },
        |symbol, admitted| match symbol {
            SymbolID::T(..) => true,
            SymbolID::N(n) => admitted.contains(n),
        },
    )
}

/// Calculate the set of variables deriving the empty string.
#[tracing::instrument(skip_all)]
pub fn nullable(g: &Grammar) -> Traced<NonterminalSet> {
    least_fixpoint(
        g,
        Phase::Nullable,
        |pass| match pass {
            1 => "productions A -> λ".into(),
            n => format!("alternatives over NULL_{}", n - 1),
        },
        |symbol, admitted| match symbol {
            SymbolID::T(..) => false,
            SymbolID::N(n) => admitted.contains(n),
        },
    )
}

fn least_fixpoint<D, F>(g: &Grammar, phase: Phase, describe: D, admits: F) -> Traced<NonterminalSet>
where
    D: Fn(usize) -> String,
    F: Fn(SymbolID, &NonterminalSet) -> bool,
{
    let mut recorder = Recorder::new(phase);
    let mut admitted = NonterminalSet::default();

    for pass in 1.. {
        // 前のパスで確定した集合のみを参照する
        let mut licensed: Vec<(NonterminalID, &Production)> = vec![];
        for (id, _) in g.nonterminals() {
            if admitted.contains(id) {
                continue;
            }
            let found = g
                .productions(id)
                .iter()
                .find(|p| p.right().iter().all(|s| admits(*s, &admitted)));
            if let Some(production) = found {
                licensed.push((id, production));
            }
        }

        // the first pass is recorded even when it admits nothing.
        if licensed.is_empty() && pass > 1 {
            break;
        }

        for (id, _) in &licensed {
            admitted.insert(*id);
        }

        let explanation = if licensed.is_empty() {
            format!("{}: none", describe(pass))
        } else {
            let rules: Vec<String> = licensed
                .iter()
                .map(|(id, p)| g.display_rule(*id, p).to_string())
                .collect();
            format!("{}: {}", describe(pass), rules.join(", "))
        };
        recorder.record(
            set_notation(g.names(&admitted)),
            explanation,
            licensed
                .iter()
                .map(|(id, _)| g.nonterminal(*id).to_owned())
                .collect(),
        );

        if licensed.is_empty() {
            break;
        }
    }

    tracing::debug!("{} variables: {}", phase, set_notation(g.names(&admitted)));
    Traced {
        value: admitted,
        trace: recorder.finish(),
    }
}

/// Calculate the set of variables reachable from the start symbol.
#[tracing::instrument(skip_all)]
pub fn reachable(g: &Grammar) -> Traced<NonterminalSet> {
    let mut recorder = Recorder::new(Phase::Reachable);
    let start = g.start_symbol();
    let mut reached: NonterminalSet = Some(start).into_iter().collect();
    let mut expanded = NonterminalSet::default();

    recorder.record(
        set_notation(g.names(&reached)),
        "start symbol".into(),
        vec![g.nonterminal(start).to_owned()],
    );

    loop {
        let current = match reached.iter().find(|id| !expanded.contains(*id)) {
            Some(id) => id,
            None => break,
        };
        expanded.insert(current);

        let mut exposed = NonterminalSet::default();
        for production in g.productions(current) {
            for symbol in production.nonterminals() {
                if reached.insert(symbol) {
                    exposed.insert(symbol);
                }
            }
        }

        let explanation = if exposed.is_empty() {
            format!("expanded {}: no new variables", g.nonterminal(current))
        } else {
            format!(
                "expanded {}",
                g.display_rules(current, g.productions(current))
            )
        };
        recorder.record(
            set_notation(g.names(&reached)),
            explanation,
            exposed.iter().map(|id| g.nonterminal(id).to_owned()).collect(),
        );
    }

    tracing::debug!("reachable variables: {}", set_notation(g.names(&reached)));
    Traced {
        value: reached,
        trace: recorder.finish(),
    }
}

/// Calculate the set of variables derivable from `variable` using
/// unit productions only.
///
/// The variable itself is always a member of its closure.
#[tracing::instrument(skip(g))]
pub fn unit_closure(g: &Grammar, variable: NonterminalID) -> Traced<NonterminalSet> {
    let name = g.nonterminal(variable);
    let mut recorder = Recorder::with_label(Phase::Unit, format!("UNIT({})", name));
    let mut closure: NonterminalSet = Some(variable).into_iter().collect();
    let mut expanded = NonterminalSet::default();

    recorder.record(
        set_notation(g.names(&closure)),
        format!("zero-length chain {} ⇒* {}", name, name),
        vec![name.to_owned()],
    );

    loop {
        let current = match closure.iter().find(|id| !expanded.contains(*id)) {
            Some(id) => id,
            None => break,
        };
        expanded.insert(current);

        for production in g.productions(current) {
            let target = match production.unit() {
                Some(target) => target,
                None => continue,
            };
            if closure.insert(target) {
                recorder.record(
                    set_notation(g.names(&closure)),
                    format!("unit production {}", g.display_rule(current, production)),
                    vec![g.nonterminal(target).to_owned()],
                );
            }
        }
    }

    Traced {
        value: closure,
        trace: recorder.finish(),
    }
}

/// Calculate the unit closure of every variable, in ascending order.
#[tracing::instrument(skip_all)]
pub fn unit_closures(g: &Grammar) -> Traced<Map<NonterminalID, NonterminalSet>> {
    let mut closures = Map::default();
    let mut trace = crate::trace::Trace::new();
    for (id, _) in g.nonterminals() {
        let closure = unit_closure(g, id);
        trace.append(closure.trace);
        closures.insert(id, closure.value);
    }
    Traced {
        value: closures,
        trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(source: &str) -> Grammar {
        source.parse().unwrap()
    }

    fn names(g: &Grammar, set: &NonterminalSet) -> Vec<String> {
        g.names(set).into_iter().map(str::to_owned).collect()
    }

    fn id(g: &Grammar, name: &str) -> NonterminalID {
        g.find_nonterminal(name).unwrap()
    }

    #[test]
    fn terminating_with_trace() {
        let g = grammar("S -> A B | b\nA -> a | λ\nB -> b");
        let res = terminating(&g);
        assert_eq!(names(&g, &res.value), ["A", "B", "S"]);

        // every variable has a terminal alternative: one pass suffices.
        let steps = res.trace.steps();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].iteration, "TERM_1");
        assert_eq!(steps[0].variables, "{A, B, S}");
        assert_eq!(steps[0].new_variables, ["A", "B", "S"]);
        assert_eq!(
            steps[0].explanation,
            "alternatives over terminal symbols: A -> a, B -> b, S -> b"
        );
    }

    #[test]
    fn terminating_needs_several_passes() {
        let g = grammar("S -> A x\nA -> B\nB -> b\nC -> C c");
        let res = terminating(&g);
        assert_eq!(names(&g, &res.value), ["A", "B", "S"]);

        let labels: Vec<_> = res.trace.iter().map(|s| s.iteration.as_str()).collect();
        assert_eq!(labels, ["TERM_1", "TERM_2", "TERM_3"]);
        let admitted: Vec<_> = res.trace.iter().map(|s| s.new_variables.clone()).collect();
        assert_eq!(admitted, [vec!["B"], vec!["A"], vec!["S"]]);
        assert_eq!(
            res.trace.steps()[2].explanation,
            "alternatives over terminal symbols and TERM_2: S -> A x"
        );
    }

    #[test]
    fn terminating_records_empty_first_pass() {
        let g = grammar("S -> A\nA -> A");
        let res = terminating(&g);
        assert!(res.value.is_empty());
        assert_eq!(res.trace.len(), 1);
        assert_eq!(res.trace.steps()[0].variables, "∅");
        assert!(res.trace.steps()[0].new_variables.is_empty());
    }

    #[test]
    fn nullable_with_trace() {
        let g = grammar("S -> A B | b\nA -> a | λ\nB -> b");
        let res = nullable(&g);
        assert_eq!(names(&g, &res.value), ["A"]);
        assert_eq!(res.trace.len(), 1);
        assert_eq!(res.trace.steps()[0].explanation, "productions A -> λ: A -> λ");
    }

    #[test]
    fn nullable_through_nullable_variables() {
        let g = grammar("S -> A B | a S\nA -> λ | a\nB -> A A\nC -> A c");
        let res = nullable(&g);
        // C needs a terminal symbol, hence never nullable.
        assert_eq!(names(&g, &res.value), ["A", "B", "S"]);
        let labels: Vec<_> = res.trace.iter().map(|s| s.iteration.as_str()).collect();
        assert_eq!(labels, ["NULL_1", "NULL_2", "NULL_3"]);
    }

    #[test]
    fn reachable_with_trace() {
        let g = grammar("S -> a B\nB -> A | b\nA -> a\nX -> S");
        let res = reachable(&g);
        assert_eq!(names(&g, &res.value), ["A", "B", "S"]);

        let steps = res.trace.steps();
        assert_eq!(steps[0].iteration, "REACH_1");
        assert_eq!(steps[0].variables, "{S}");
        assert_eq!(steps[1].explanation, "expanded S -> a B");
        assert_eq!(steps[1].new_variables, ["B"]);
        // B is the smallest unexpanded variable after S.
        assert_eq!(steps[2].explanation, "expanded B -> A | b");
        assert_eq!(steps[3].explanation, "expanded A: no new variables");
        assert_eq!(steps.len(), 4);
    }

    #[test]
    fn reachable_expands_in_ascending_order() {
        let g = grammar("S -> C B\nB -> A\nC -> c\nA -> a");
        let res = reachable(&g);
        let order: Vec<_> = res.trace.iter().map(|s| s.explanation.clone()).collect();
        assert_eq!(
            order,
            [
                "start symbol",
                "expanded S -> C B",
                "expanded B -> A",
                "expanded A: no new variables",
                "expanded C: no new variables",
            ]
        );
    }

    #[test]
    fn unit_closure_follows_chains() {
        let g = grammar("S -> A\nA -> B\nB -> b");
        let res = unit_closure(&g, id(&g, "S"));
        assert_eq!(names(&g, &res.value), ["A", "B", "S"]);
        let explanations: Vec<_> = res.trace.iter().map(|s| s.explanation.as_str()).collect();
        assert_eq!(
            explanations,
            [
                "zero-length chain S ⇒* S",
                "unit production S -> A",
                "unit production A -> B",
            ]
        );
        assert_eq!(res.trace.steps()[2].iteration, "UNIT(S)_3");

        let res = unit_closure(&g, id(&g, "B"));
        assert_eq!(names(&g, &res.value), ["B"]);
        assert_eq!(res.trace.len(), 1);
    }

    #[test]
    fn unit_closure_ignores_non_unit_alternatives() {
        let g = grammar("S -> A a | B\nA -> S\nB -> b | λ");
        let res = unit_closure(&g, id(&g, "A"));
        assert_eq!(names(&g, &res.value), ["A", "B", "S"]);
        let res = unit_closure(&g, id(&g, "B"));
        assert_eq!(names(&g, &res.value), ["B"]);
    }

    #[test]
    fn unit_closures_of_every_variable() {
        let g = grammar("S -> A\nA -> B | S\nB -> b");
        let res = unit_closures(&g);
        let closures: Vec<(String, Vec<String>)> = res
            .value
            .iter()
            .map(|(id, set)| (g.nonterminal(*id).to_owned(), names(&g, set)))
            .collect();
        assert_eq!(
            closures,
            [
                ("A".to_owned(), vec!["A".to_owned(), "B".into(), "S".into()]),
                ("B".to_owned(), vec!["B".to_owned()]),
                ("S".to_owned(), vec!["A".to_owned(), "B".into(), "S".into()]),
            ]
        );
        assert!(res.trace.steps()[0].iteration.starts_with("UNIT(A)"));
    }
}
