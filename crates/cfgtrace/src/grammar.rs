//! Grammar types.

use crate::{
    types::{Map, Set},
    util::display_fn,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The glyph used to render the empty string.
pub const EMPTY_MARKER: &str = "λ";

/// Spellings accepted on input for the empty string.
const EMPTY_MARKER_ALIASES: &[&str] = &[EMPTY_MARKER, "ε", "epsilon"];

/// Return whether the specified token denotes the empty string.
pub fn is_empty_marker(token: &str) -> bool {
    EMPTY_MARKER_ALIASES.contains(&token)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}

impl NonterminalID {
    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

/// A set of nonterminal symbols.
///
/// Nonterminal IDs are assigned in lexicographic order of their names,
/// so iteration always yields the members in that order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NonterminalSet {
    inner: bit_set::BitSet,
}

impl NonterminalSet {
    pub fn contains(&self, id: NonterminalID) -> bool {
        self.inner.contains(id.into_raw().into())
    }
    pub fn insert(&mut self, id: NonterminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }
    pub fn difference_with(&mut self, other: &Self) {
        self.inner.difference_with(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = NonterminalID> + '_ {
        self.inner.iter().map(|raw| {
            // members are only ever inserted from `NonterminalID`.
            NonterminalID::new(raw as u16)
        })
    }
}

impl FromIterator<NonterminalID> for NonterminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = NonterminalID>,
    {
        Self {
            inner: iter.into_iter().map(|n| n.into_raw().into()).collect(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

/// An alternative on the right-hand side of a production rule.
///
/// The empty sequence stands for the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    right: Vec<SymbolID>,
}

impl Production {
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    /// Return whether this alternative is the empty string.
    pub fn is_empty(&self) -> bool {
        self.right.is_empty()
    }

    /// Return the target nonterminal if this alternative is a unit production.
    pub fn unit(&self) -> Option<NonterminalID> {
        match self.right[..] {
            [SymbolID::N(n)] => Some(n),
            _ => None,
        }
    }

    /// Iterate over the nonterminal symbols occurring in this alternative.
    pub fn nonterminals(&self) -> impl Iterator<Item = NonterminalID> + '_ {
        self.right.iter().filter_map(|symbol| match symbol {
            SymbolID::N(n) => Some(*n),
            SymbolID::T(..) => None,
        })
    }

    // `"R1 R2 R3"` or `"λ"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            if self.right.is_empty() {
                return f.write_str(EMPTY_MARKER);
            }
            for (i, symbol) in self.right.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                f.write_str(g.symbol(*symbol))?;
            }
            Ok(())
        })
    }
}

/// A context-free grammar.
///
/// Once constructed the grammar is immutable; the analyses only read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    terminals: Vec<String>,
    nonterminals: Vec<String>,
    rules: Map<NonterminalID, Vec<Production>>,
    start_symbol: NonterminalID,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (left, productions) in self.rules() {
            writeln!(f, "{}", self.display_rules(left, productions))?;
        }
        Ok(())
    }
}

impl FromStr for Grammar {
    type Err = GrammarError;

    /// Parse a grammar from text, one rule per line. Blank lines are ignored.
    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Grammar::define(|g| {
            let mut defined = false;
            for (i, line) in source.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                parse_line(g, i + 1, line)?;
                defined = true;
            }
            if !defined {
                return Err(GrammarError::NoRules);
            }
            Ok(())
        })
    }
}

impl Grammar {
    /// Construct a grammar from an ordered sequence of non-empty rule lines.
    ///
    /// Line numbers reported in errors count from 1 over the supplied lines.
    pub fn from_lines<I>(lines: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Grammar::define(|g| {
            let mut defined = false;
            for (i, line) in lines.into_iter().enumerate() {
                parse_line(g, i + 1, line.as_ref().trim())?;
                defined = true;
            }
            if !defined {
                return Err(GrammarError::NoRules);
            }
            Ok(())
        })
    }

    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef::default();
        f(&mut def)?;
        def.end()
    }

    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    /// Iterate over the terminal symbols, in lexicographic order.
    pub fn terminals(&self) -> impl Iterator<Item = (TerminalID, &str)> + '_ {
        self.terminals
            .iter()
            .enumerate()
            .map(|(i, name)| (TerminalID::new(i as u16), name.as_str()))
    }

    /// Iterate over the nonterminal symbols, in lexicographic order.
    pub fn nonterminals(&self) -> impl Iterator<Item = (NonterminalID, &str)> + '_ {
        self.nonterminals
            .iter()
            .enumerate()
            .map(|(i, name)| (NonterminalID::new(i as u16), name.as_str()))
    }

    pub fn terminal(&self, id: TerminalID) -> &str {
        &self.terminals[usize::from(id.into_raw())]
    }

    pub fn nonterminal(&self, id: NonterminalID) -> &str {
        &self.nonterminals[usize::from(id.into_raw())]
    }

    pub fn symbol(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminal(t),
            SymbolID::N(n) => self.nonterminal(n),
        }
    }

    /// Look up a nonterminal symbol by its name.
    pub fn find_nonterminal(&self, name: &str) -> Option<NonterminalID> {
        self.nonterminals
            .binary_search_by(|probe| probe.as_str().cmp(name))
            .ok()
            .map(|i| NonterminalID::new(i as u16))
    }

    /// Return the alternatives of the specified nonterminal symbol.
    pub fn productions(&self, id: NonterminalID) -> &[Production] {
        self.rules.get(&id).map_or(&[], |p| &p[..])
    }

    /// Iterate over the production rules, in the order their left-hand sides
    /// first appeared in the definition.
    pub fn rules(&self) -> impl Iterator<Item = (NonterminalID, &[Production])> + '_ {
        self.rules.iter().map(|(left, p)| (*left, &p[..]))
    }

    /// Collect the names of the members of the specified set.
    pub fn names<'g>(&'g self, set: &NonterminalSet) -> Vec<&'g str> {
        set.iter().map(|id| self.nonterminal(id)).collect()
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display_rule<'g>(
        &'g self,
        left: NonterminalID,
        production: &'g Production,
    ) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(
                f,
                "{} -> {}",
                self.nonterminal(left),
                production.display(self)
            )
        })
    }

    // `"LHS -> A1 | A2 | A3"`
    pub fn display_rules<'g>(
        &'g self,
        left: NonterminalID,
        productions: &'g [Production],
    ) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ->", self.nonterminal(left))?;
            for (i, production) in productions.iter().enumerate() {
                if i > 0 {
                    write!(f, " |")?;
                }
                write!(f, " {}", production.display(self))?;
            }
            Ok(())
        })
    }

    /// Take a plain structural snapshot of this grammar.
    pub fn to_structured(&self) -> StructuredGrammar {
        StructuredGrammar {
            start: self.nonterminal(self.start_symbol).to_owned(),
            variables: self.nonterminals.clone(),
            terminals: self.terminals.clone(),
            productions: self
                .rules()
                .map(|(left, productions)| {
                    let alternatives = productions
                        .iter()
                        .map(|p| p.display(self).to_string())
                        .collect();
                    (self.nonterminal(left).to_owned(), alternatives)
                })
                .collect(),
        }
    }
}

/// The structural snapshot of a grammar handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredGrammar {
    pub start: String,
    pub variables: Vec<String>,
    pub terminals: Vec<String>,
    pub productions: Map<String, Vec<String>>,
}

// LHS -> ALT1 | ALT2 | ...
fn parse_line(g: &mut GrammarDef, line_no: usize, line: &str) -> Result<(), GrammarError> {
    let line = line.replace('→', "->");
    let mut parts = line.split("->");
    let left = parts.next().unwrap_or_default();
    let right = parts
        .next()
        .ok_or(GrammarError::MissingSeparator { line: line_no })?;
    if parts.next().is_some() {
        return Err(GrammarError::MultipleSeparators { line: line_no });
    }

    let mut tokens = left.split_whitespace();
    let left = match (tokens.next(), tokens.next()) {
        (Some(name), None) if !is_empty_marker(name) => name,
        _ => {
            return Err(GrammarError::InvalidLeftHand {
                line: line_no,
                found: left.trim().to_owned(),
            })
        }
    };

    for (i, alternative) in right.split('|').enumerate() {
        let symbols: Vec<&str> = alternative.split_whitespace().collect();
        match symbols[..] {
            [] => {
                return Err(GrammarError::EmptyAlternative {
                    line: line_no,
                    index: i + 1,
                })
            }
            [symbol] if is_empty_marker(symbol) => g.rule(left, None::<&str>)?,
            _ if symbols.iter().any(|s| is_empty_marker(s)) => {
                return Err(GrammarError::MisplacedEmptyMarker { line: line_no })
            }
            _ => g.rule(left, &symbols)?,
        }
    }

    Ok(())
}

/// The contextural values for building a `Grammar`.
///
/// Symbols are declared by name; whether a name is a nonterminal or a
/// terminal symbol is decided once all rules are known.
#[derive(Debug, Default)]
pub struct GrammarDef {
    rules: Map<String, Vec<Vec<String>>>,
    start: Option<String>,
}

impl GrammarDef {
    /// Specify a production rule into this grammar.
    ///
    /// An empty `right` denotes the empty string.
    pub fn rule<I>(&mut self, left: &str, right: I) -> Result<(), GrammarError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        verify_name(left)?;
        let mut symbols = vec![];
        for symbol in right {
            let symbol = symbol.as_ref();
            verify_name(symbol)?;
            symbols.push(symbol.to_owned());
        }
        self.rules.entry(left.to_owned()).or_default().push(symbols);
        Ok(())
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, name: &str) {
        self.start.replace(name.to_owned());
    }

    fn end(self) -> Result<Grammar, GrammarError> {
        // 指定されていない場合は最初に登録されたnonterminal symbolを用いる
        let start = match self.start {
            Some(start) => start,
            None => self
                .rules
                .keys()
                .next()
                .cloned()
                .ok_or(GrammarError::NoRules)?,
        };
        if !self.rules.contains_key(&start) {
            return Err(GrammarError::UnknownStartSymbol { name: start });
        }

        let mut nonterminals: Vec<String> = self.rules.keys().cloned().collect();
        nonterminals.sort();
        let mut terminals: Vec<String> = self
            .rules
            .values()
            .flatten()
            .flatten()
            .filter(|symbol| !self.rules.contains_key(*symbol))
            .cloned()
            .collect::<Set<_>>()
            .into_iter()
            .collect();
        terminals.sort();

        if u16::try_from(nonterminals.len()).is_err() || u16::try_from(terminals.len()).is_err() {
            return Err(GrammarError::TooManySymbols);
        }

        let mut ids: Map<&str, SymbolID> = Map::default();
        for (i, name) in nonterminals.iter().enumerate() {
            ids.insert(name.as_str(), SymbolID::N(NonterminalID::new(i as u16)));
        }
        for (i, name) in terminals.iter().enumerate() {
            ids.insert(name.as_str(), SymbolID::T(TerminalID::new(i as u16)));
        }
        let nonterminal_id = |name: &str| match ids.get(name) {
            Some(SymbolID::N(n)) => *n,
            _ => unreachable!("every left-hand side is a nonterminal symbol"),
        };

        let mut rules: Map<NonterminalID, Vec<Production>> = Map::default();
        for (left, alternatives) in &self.rules {
            let productions = alternatives
                .iter()
                .map(|right| Production {
                    right: right.iter().map(|symbol| ids[symbol.as_str()]).collect(),
                })
                .collect();
            rules.insert(nonterminal_id(left.as_str()), productions);
        }
        let start_symbol = nonterminal_id(start.as_str());

        Ok(Grammar {
            terminals,
            nonterminals,
            rules,
            start_symbol,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("no production rules were given")]
    NoRules,

    #[error("line {line}: missing `->' separator")]
    MissingSeparator { line: usize },

    #[error("line {line}: more than one `->' separator")]
    MultipleSeparators { line: usize },

    #[error("line {line}: the left-hand side must be a single symbol, found `{found}'")]
    InvalidLeftHand { line: usize, found: String },

    #[error("line {line}: alternative #{index} is empty (write `λ' for the empty string)")]
    EmptyAlternative { line: usize, index: usize },

    #[error("line {line}: `λ' must stand alone in an alternative")]
    MisplacedEmptyMarker { line: usize },

    #[error("invalid symbol name: `{name}'")]
    InvalidSymbol { name: String },

    #[error("the start symbol `{name}' has no production rule")]
    UnknownStartSymbol { name: String },

    #[error("too many symbols in grammar")]
    TooManySymbols,
}

fn verify_name(name: &str) -> Result<(), GrammarError> {
    let valid = !name.is_empty()
        && !name.chars().any(|ch| ch.is_whitespace() || ch == '|')
        && !name.contains("->")
        && !is_empty_marker(name);
    if valid {
        Ok(())
    } else {
        Err(GrammarError::InvalidSymbol {
            name: name.to_owned(),
        })
    }
}
