//! LR(1) items, the closure/GOTO engine, and the canonical automaton.

use crate::first_sets::FirstSets;
use crate::grammar::{Grammar, ProductionId, Symbol};
use crate::lexer::TokenKind;
use crate::types::Map;
use crate::util::display_fn;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// An LR(1) item: a production, a dot position, and a lookahead terminal.
///
/// `dot == right.len()` marks a reduce-ready item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub production: ProductionId,
    pub dot: usize,
    pub lookahead: TokenKind,
}

impl Item {
    pub fn display<'g>(&self, grammar: &'g Grammar) -> impl fmt::Display + 'g {
        let item = *self;
        display_fn(move |f| {
            let production = grammar.production(item.production);
            write!(
                f,
                "[{}, {}]",
                production.display_dotted(item.dot),
                item.lookahead
            )
        })
    }
}

/// A deduplicated set of items in canonical (sorted) form.
///
/// The ordered representation makes value equality and hashing structural,
/// which is what both automaton-state deduplication and the closure/GOTO
/// memo caches key on.
pub type ItemSet = BTreeSet<Item>;

/// Closure and GOTO over item sets, with owned memo caches.
///
/// The caches are write-once-per-key and live for one table construction;
/// closure is called with many repeated sets while the automaton explores,
/// and GOTO with repeated `(set, symbol)` pairs during table synthesis.
#[derive(Debug)]
pub struct ClosureEngine<'g> {
    grammar: &'g Grammar,
    first_sets: FirstSets<'g>,
    closures: Map<ItemSet, ItemSet>,
    gotos: Map<(ItemSet, Symbol), ItemSet>,
}

impl<'g> ClosureEngine<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            first_sets: FirstSets::new(grammar),
            closures: Map::default(),
            gotos: Map::default(),
        }
    }

    /// Breadth-first closure: for every `[A -> α · B β, a]` with `B` a
    /// nonterminal, add `[B -> · γ, b]` for every production `B -> γ` and
    /// every `b` in `First(β a)`, mapping the epsilon marker to `Eof`.
    pub fn closure(&mut self, items: &ItemSet) -> ItemSet {
        if let Some(hit) = self.closures.get(items) {
            return hit.clone();
        }

        let grammar = self.grammar;
        let mut result = items.clone();
        let mut queue: VecDeque<Item> = items.iter().copied().collect();
        while let Some(item) = queue.pop_front() {
            let production = grammar.production(item.production);
            // Terminal after the dot, or dot at the end: nothing to expand.
            let Some(Symbol::Nonterminal(next)) = production.right().get(item.dot) else {
                continue;
            };

            // First(β a): the rest of the right-hand side with the current
            // lookahead appended.
            let mut beta: Vec<Symbol> = production.right()[item.dot + 1..].to_vec();
            beta.push(Symbol::Terminal(item.lookahead));
            let first = self.first_sets.first(&beta);

            for &id in grammar.productions_of(next) {
                for &kind in &first {
                    let lookahead = match kind {
                        TokenKind::Epsilon => TokenKind::Eof,
                        kind => kind,
                    };
                    let added = Item {
                        production: id,
                        dot: 0,
                        lookahead,
                    };
                    if result.insert(added) {
                        queue.push_back(added);
                    }
                }
            }
        }

        self.closures.insert(items.clone(), result.clone());
        result
    }

    /// GOTO: advance the dot over `symbol` in every applicable item, then
    /// close the result.
    pub fn goto(&mut self, items: &ItemSet, symbol: &Symbol) -> ItemSet {
        let key = (items.clone(), symbol.clone());
        if let Some(hit) = self.gotos.get(&key) {
            return hit.clone();
        }

        let grammar = self.grammar;
        let mut moved = ItemSet::new();
        for item in items {
            let production = grammar.production(item.production);
            if production.right().get(item.dot) == Some(symbol) {
                moved.insert(Item {
                    dot: item.dot + 1,
                    ..*item
                });
            }
        }
        let result = if moved.is_empty() {
            moved
        } else {
            self.closure(&moved)
        };

        self.gotos.insert(key, result.clone());
        result
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateId {
    raw: u32,
}

impl StateId {
    pub const START: Self = Self::new(0);

    const fn new(raw: u32) -> Self {
        Self { raw }
    }

    pub(crate) fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// One automaton state: its (closed) item set and its outgoing edges.
#[derive(Debug, PartialEq)]
pub struct State {
    item_set: ItemSet,
    edges: Map<Symbol, StateId>,
}

impl State {
    pub fn item_set(&self) -> &ItemSet {
        &self.item_set
    }

    pub fn edges(&self) -> impl Iterator<Item = (&Symbol, StateId)> + '_ {
        self.edges.iter().map(|(symbol, &target)| (symbol, target))
    }

    pub fn edge(&self, symbol: &Symbol) -> Option<StateId> {
        self.edges.get(symbol).copied()
    }
}

/// The canonical LR(1) collection: every reachable item set, deduplicated
/// by value equality, in breadth-first discovery order.
///
/// State 0 is `closure({[S' -> · S, $]})`. Numbering is stable from run to
/// run because GOTO exploration walks the grammar's symbols in their
/// deterministic first-seen order.
#[derive(Debug, PartialEq)]
pub struct Automaton {
    states: Vec<State>,
}

impl Automaton {
    pub fn generate(grammar: &Grammar) -> Self {
        let mut engine = ClosureEngine::new(grammar);
        let automaton = Self::generate_with(grammar, &mut engine);
        tracing::debug!(states = automaton.states.len(), "automaton generated");
        automaton
    }

    pub fn generate_with(grammar: &Grammar, engine: &mut ClosureEngine<'_>) -> Self {
        let mut seed = ItemSet::new();
        seed.insert(Item {
            production: ProductionId::ACCEPT,
            dot: 0,
            lookahead: TokenKind::Eof,
        });
        let start = engine.closure(&seed);

        let mut states = vec![State {
            item_set: start.clone(),
            edges: Map::default(),
        }];
        let mut index: Map<ItemSet, StateId> = Map::default();
        index.insert(start, StateId::START);

        let mut queue = VecDeque::from([StateId::START]);
        while let Some(current) = queue.pop_front() {
            for symbol in grammar.symbols() {
                let target_set = engine.goto(&states[current.index()].item_set, symbol);
                if target_set.is_empty() {
                    continue;
                }
                let target = match index.get(&target_set) {
                    Some(&existing) => existing,
                    None => {
                        let id = StateId::new(states.len() as u32);
                        states.push(State {
                            item_set: target_set.clone(),
                            edges: Map::default(),
                        });
                        index.insert(target_set, id);
                        queue.push_back(id);
                        id
                    }
                };
                states[current.index()]
                    .edges
                    .insert(symbol.clone(), target);
            }
        }

        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| (StateId::new(index as u32), state))
    }

    pub fn display<'g>(&'g self, grammar: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (id, state) in self.states() {
                writeln!(f, "#### state {:02}", id)?;
                for item in &state.item_set {
                    writeln!(f, "- {}", item.display(grammar))?;
                }
                for (symbol, target) in state.edges() {
                    writeln!(f, "  {} => {:02}", symbol, target)?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ProductionBuilder;

    fn expr_grammar() -> Grammar {
        let productions = ProductionBuilder::new()
            .auto_import()
            .add("1[0,2]", "E -> E + T")
            .unwrap()
            .add("0", "E -> T")
            .unwrap()
            .add("1[0,2]", "T -> T * F")
            .unwrap()
            .add("0", "T -> F")
            .unwrap()
            .add("1", "F -> ( E )")
            .unwrap()
            .add("0", "F -> id")
            .unwrap()
            .build();
        Grammar::new("E", productions).unwrap()
    }

    fn start_set(engine: &mut ClosureEngine<'_>) -> ItemSet {
        let mut seed = ItemSet::new();
        seed.insert(Item {
            production: ProductionId::ACCEPT,
            dot: 0,
            lookahead: TokenKind::Eof,
        });
        engine.closure(&seed)
    }

    #[test]
    fn closure_expands_nonterminals_after_the_dot() {
        let grammar = expr_grammar();
        let mut engine = ClosureEngine::new(&grammar);
        let start = start_set(&mut engine);

        // Every production of E, T and F appears with the dot at 0.
        for (id, production) in grammar.productions() {
            assert!(
                start.iter().any(|item| item.production == id && item.dot == 0),
                "missing closure item for `{}'",
                production,
            );
        }
        // [E -> · E + T, +] from First($)={$} and First(+ T $)={+}.
        assert!(start.contains(&Item {
            production: grammar.productions_of("E")[0],
            dot: 0,
            lookahead: TokenKind::Plus,
        }));
    }

    #[test]
    fn closure_is_idempotent() {
        let grammar = expr_grammar();
        let mut engine = ClosureEngine::new(&grammar);
        let start = start_set(&mut engine);
        assert_eq!(engine.closure(&start), start);
    }

    #[test]
    fn goto_is_deterministic() {
        let grammar = expr_grammar();
        let mut engine = ClosureEngine::new(&grammar);
        let start = start_set(&mut engine);

        let symbol = Symbol::Nonterminal("E".to_owned());
        let first = engine.goto(&start, &symbol);
        let second = engine.goto(&start, &symbol);
        assert!(!first.is_empty());
        assert_eq!(first, second);

        // A fresh engine computes the same value.
        let mut other = ClosureEngine::new(&grammar);
        let other_start = start_set(&mut other);
        assert_eq!(other.goto(&other_start, &symbol), first);
    }

    #[test]
    fn goto_on_unrelated_symbol_is_empty() {
        let grammar = expr_grammar();
        let mut engine = ClosureEngine::new(&grammar);
        let start = start_set(&mut engine);
        assert!(engine
            .goto(&start, &Symbol::Terminal(TokenKind::RParen))
            .is_empty());
    }

    #[test]
    fn automaton_is_stable_across_runs() {
        let grammar = expr_grammar();
        let first = Automaton::generate(&grammar);
        let second = Automaton::generate(&grammar);
        assert_eq!(first, second);
        // The canonical collection for this grammar is well known to have
        // more states than the LR(0) skeleton's 12.
        assert!(first.len() >= 12, "only {} states", first.len());
    }

    #[test]
    fn state_zero_is_the_start_closure() {
        let grammar = expr_grammar();
        let mut engine = ClosureEngine::new(&grammar);
        let start = start_set(&mut engine);

        let automaton = Automaton::generate(&grammar);
        assert_eq!(automaton.state(StateId::START).item_set(), &start);
    }
}
