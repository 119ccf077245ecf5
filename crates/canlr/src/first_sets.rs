//! FIRST-set computation over symbol strings.

use crate::grammar::{Grammar, Symbol};
use crate::lexer::TokenKind;
use crate::types::{Map, Set};

/// Computes `First(symbols)` for arbitrary symbol strings, memoized per
/// distinct input sequence.
///
/// `TokenKind::Epsilon` is a member of the result exactly when the whole
/// sequence is nullable. Recursion through nonterminals is guarded by
/// "currently expanding" sets, so left-recursive and mutually recursive
/// grammars terminate; a nonterminal already being expanded contributes
/// nothing further. This is a conservative approximation, not an iteration
/// to fixpoint.
#[derive(Debug)]
pub struct FirstSets<'g> {
    grammar: &'g Grammar,
    cache: Map<Vec<Symbol>, Set<TokenKind>>,
}

impl<'g> FirstSets<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            cache: Map::default(),
        }
    }

    /// `First(symbols)`.
    pub fn first(&mut self, symbols: &[Symbol]) -> Set<TokenKind> {
        if let Some(hit) = self.cache.get(symbols) {
            return hit.clone();
        }

        let mut result = Set::default();
        let mut in_first = Set::default();
        let mut in_null = Set::default();
        self.collect(symbols, &mut result, &mut in_first, &mut in_null);

        self.cache.insert(symbols.to_vec(), result.clone());
        result
    }

    fn collect(
        &self,
        symbols: &[Symbol],
        result: &mut Set<TokenKind>,
        in_first: &mut Set<String>,
        in_null: &mut Set<String>,
    ) {
        let mut nullable_so_far = true;
        for symbol in symbols {
            nullable_so_far = false;
            match symbol {
                Symbol::Terminal(kind) => {
                    result.insert(*kind);
                }
                Symbol::Nonterminal(name) if !in_first.contains(name.as_str()) => {
                    for &id in self.grammar.productions_of(name) {
                        in_first.insert(name.clone());
                        self.collect(self.grammar.production(id).right(), result, in_first, in_null);
                        in_first.swap_remove(name.as_str());
                    }
                }
                // Already expanding this nonterminal: nothing new to add.
                Symbol::Nonterminal(..) => {}
            }
            // Epsilon survives only if every symbol of the sequence turns
            // out to be nullable; strip it and re-add at the end.
            result.swap_remove(&TokenKind::Epsilon);
            if self.nullable(std::slice::from_ref(symbol), in_null) {
                nullable_so_far = true;
            } else {
                break;
            }
        }
        if nullable_so_far {
            result.insert(TokenKind::Epsilon);
        }
    }

    fn nullable(&self, symbols: &[Symbol], in_null: &mut Set<String>) -> bool {
        for symbol in symbols {
            match symbol {
                Symbol::Terminal(TokenKind::Epsilon) => {}
                Symbol::Terminal(..) => return false,
                Symbol::Nonterminal(name) if !in_null.contains(name.as_str()) => {
                    let mut any = false;
                    for &id in self.grammar.productions_of(name) {
                        in_null.insert(name.clone());
                        let nullable = self.nullable(self.grammar.production(id).right(), in_null);
                        in_null.swap_remove(name.as_str());
                        if nullable {
                            any = true;
                            break;
                        }
                    }
                    if !any {
                        return false;
                    }
                }
                // Recursion guard: assume non-nullable while expanding.
                Symbol::Nonterminal(..) => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ProductionBuilder;
    use TokenKind::*;

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

    // E  -> T E2        E2 -> + T E2 | e
    // T  -> F T2        T2 -> * F T2 | e
    // F  -> ( E ) | id
    fn nullable_grammar() -> Grammar {
        let productions = ProductionBuilder::new()
            .auto_import()
            .add("0[1]", "E -> T E2")
            .unwrap()
            .add("0[1,2]", "E2 -> + T E2")
            .unwrap()
            .add_alts("E2 |> e")
            .unwrap()
            .add("0[1]", "T -> F T2")
            .unwrap()
            .add("0[1,2]", "T2 -> * F T2")
            .unwrap()
            .add_alts("T2 |> e")
            .unwrap()
            .add("1", "F -> ( E )")
            .unwrap()
            .add_alts("F |> id")
            .unwrap()
            .build();
        Grammar::new("E", productions).unwrap()
    }

    fn nt(name: &str) -> Symbol {
        Symbol::Nonterminal(name.to_owned())
    }

    #[test]
    fn first_of_left_recursive_nonterminals() {
        let grammar = expr_grammar();
        let mut first_sets = FirstSets::new(&grammar);

        for name in ["E", "T", "F"] {
            let first = first_sets.first(&[nt(name)]);
            assert_eq!(
                first,
                Set::from_iter([LParen, Ident]),
                "First({})",
                name
            );
        }
    }

    #[test]
    fn first_of_terminal_led_sequence() {
        let grammar = expr_grammar();
        let mut first_sets = FirstSets::new(&grammar);

        let first = first_sets.first(&[Symbol::Terminal(Plus), nt("T")]);
        assert_eq!(first, Set::from_iter([Plus]));
    }

    #[test]
    fn epsilon_marks_nullable_sequences() {
        let grammar = nullable_grammar();
        let mut first_sets = FirstSets::new(&grammar);

        let first = first_sets.first(&[nt("E2")]);
        assert_eq!(first, Set::from_iter([Plus, Epsilon]));

        // E2 T2 is nullable as a whole.
        let first = first_sets.first(&[nt("E2"), nt("T2")]);
        assert_eq!(first, Set::from_iter([Plus, Star, Epsilon]));

        // A non-nullable tail strips the marker.
        let first = first_sets.first(&[nt("E2"), Symbol::Terminal(Ident)]);
        assert_eq!(first, Set::from_iter([Plus, Ident]));
    }

    #[test]
    fn results_are_memoized_per_sequence() {
        let grammar = expr_grammar();
        let mut first_sets = FirstSets::new(&grammar);

        let seq = [nt("E"), Symbol::Terminal(Eof)];
        let a = first_sets.first(&seq);
        let b = first_sets.first(&seq);
        assert_eq!(a, b);
        assert_eq!(first_sets.cache.len(), 1);
    }
}
