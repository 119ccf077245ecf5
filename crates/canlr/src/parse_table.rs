//! Action/goto table synthesis from the canonical automaton.

use crate::grammar::{Grammar, ProductionId, Symbol};
use crate::lexer::TokenKind;
use crate::lr1::{Automaton, StateId};
use crate::types::Map;
use std::fmt;

/// One cell of the action table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
    Error,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(state) => write!(f, "s{}", state),
            Self::Reduce(production) => write!(f, "r{}", production),
            Self::Accept => f.write_str("acc"),
            Self::Error => Ok(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error(
        "shift/reduce conflict in state {state} on `{terminal}': \
         shift({next}) vs reduce({production})"
    )]
    ShiftReduce {
        state: StateId,
        terminal: TokenKind,
        next: StateId,
        production: String,
    },

    #[error(
        "reduce/reduce conflict in state {state} on `{terminal}': \
         reduce({first}) vs reduce({second})"
    )]
    ReduceReduce {
        state: StateId,
        terminal: TokenKind,
        first: String,
        second: String,
    },

    #[error("accept conflict in state {state} on `{terminal}'")]
    AcceptConflict { state: StateId, terminal: TokenKind },
}

/// The synthesized decision tables.
///
/// Both tables are total: every `(state, terminal)` cell holds an action
/// (`Error` where nothing was written) and every `(state, nonterminal)`
/// cell holds an optional successor state.
#[derive(Debug)]
pub struct ParseTable {
    actions: Vec<Vec<Action>>,
    gotos: Vec<Vec<Option<StateId>>>,
    terminals: Map<TokenKind, usize>,
    nonterminals: Map<String, usize>,
}

impl ParseTable {
    /// Fill the tables per the standard LR(1) rules.
    ///
    /// Unlike the usual "last write wins" shortcut, a second write to an
    /// occupied action cell with a different action aborts synthesis with a
    /// conflict error; the grammar is not LR(1) and the table would be
    /// wrong either way it was resolved.
    pub fn generate(grammar: &Grammar, automaton: &Automaton) -> Result<Self, TableError> {
        let terminals: Map<TokenKind, usize> =
            grammar.terminals().enumerate().map(|(i, k)| (k, i)).collect();
        let nonterminals: Map<String, usize> = grammar
            .nonterminals()
            .enumerate()
            .map(|(i, n)| (n.to_owned(), i))
            .collect();

        let mut actions = Vec::with_capacity(automaton.len());
        let mut gotos = Vec::with_capacity(automaton.len());

        for (id, state) in automaton.states() {
            let mut row: Vec<Option<Action>> = vec![None; terminals.len()];
            let mut goto_row: Vec<Option<StateId>> = vec![None; nonterminals.len()];

            for (symbol, target) in state.edges() {
                match symbol {
                    // [A -> α · a β, b] with goto(I, a) = J: shift(J).
                    Symbol::Terminal(kind) => {
                        let column = terminals[kind];
                        write_cell(grammar, id, *kind, &mut row[column], Action::Shift(target))?;
                    }
                    // goto(I, A) = J: goto[I, A] = J.
                    Symbol::Nonterminal(name) => {
                        goto_row[nonterminals[name]] = Some(target);
                    }
                }
            }

            for item in state.item_set() {
                let production = grammar.production(item.production);
                if item.dot != production.right().len() {
                    continue;
                }
                if item.production == ProductionId::ACCEPT {
                    // [S' -> S ·, $]: accept.
                    if item.lookahead == TokenKind::Eof {
                        let column = terminals[&TokenKind::Eof];
                        write_cell(grammar, id, TokenKind::Eof, &mut row[column], Action::Accept)?;
                    }
                } else {
                    // [A -> α ·, a]: reduce(A -> α).
                    let column = terminals[&item.lookahead];
                    write_cell(
                        grammar,
                        id,
                        item.lookahead,
                        &mut row[column],
                        Action::Reduce(item.production),
                    )?;
                }
            }

            actions.push(row.into_iter().map(|cell| cell.unwrap_or(Action::Error)).collect());
            gotos.push(goto_row);
        }

        tracing::debug!(
            states = actions.len(),
            terminals = terminals.len(),
            nonterminals = nonterminals.len(),
            "parse table generated"
        );

        Ok(Self {
            actions,
            gotos,
            terminals,
            nonterminals,
        })
    }

    /// Look up the action for a state and terminal; `None` means the
    /// terminal does not occur in this grammar at all.
    pub fn action(&self, state: StateId, kind: TokenKind) -> Option<Action> {
        let column = *self.terminals.get(&kind)?;
        Some(self.actions[state.index()][column])
    }

    /// Look up the goto successor for a state and nonterminal.
    pub fn goto(&self, state: StateId, nonterminal: &str) -> Option<StateId> {
        let column = *self.nonterminals.get(nonterminal)?;
        self.gotos[state.index()][column]
    }

    /// The terminals with a non-`Error` action in the given state, in
    /// table-column order. This is what "expected X, got Y" messages list.
    pub fn expected_terminals(&self, state: StateId) -> Vec<TokenKind> {
        self.terminals
            .iter()
            .filter(|(_, &column)| self.actions[state.index()][column] != Action::Error)
            .map(|(&kind, _)| kind)
            .collect()
    }

    pub fn state_count(&self) -> usize {
        self.actions.len()
    }
}

fn write_cell(
    grammar: &Grammar,
    state: StateId,
    terminal: TokenKind,
    cell: &mut Option<Action>,
    action: Action,
) -> Result<(), TableError> {
    let existing = match cell {
        None => {
            *cell = Some(action);
            return Ok(());
        }
        Some(existing) if *existing == action => return Ok(()),
        Some(existing) => *existing,
    };

    let render = |id: ProductionId| grammar.production(id).to_string();
    Err(match (existing, action) {
        (Action::Shift(next), Action::Reduce(production))
        | (Action::Reduce(production), Action::Shift(next)) => TableError::ShiftReduce {
            state,
            terminal,
            next,
            production: render(production),
        },
        (Action::Reduce(first), Action::Reduce(second)) => TableError::ReduceReduce {
            state,
            terminal,
            first: render(first),
            second: render(second),
        },
        _ => TableError::AcceptConflict { state, terminal },
    })
}

impl fmt::Display for ParseTable {
    /// Aligned console rendering: one row per state, the action columns
    /// followed by the goto columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<String> = Some("state".to_owned())
            .into_iter()
            .chain(self.terminals.keys().map(|kind| kind.to_string()))
            .chain(self.nonterminals.keys().cloned())
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::with_capacity(self.actions.len());
        for state in 0..self.actions.len() {
            let mut row = vec![state.to_string()];
            row.extend(self.actions[state].iter().map(|action| action.to_string()));
            row.extend(self.gotos[state].iter().map(|target| {
                target.map(|id| id.to_string()).unwrap_or_default()
            }));
            rows.push(row);
        }

        let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let render_row = |f: &mut fmt::Formatter<'_>, row: &[String]| {
            for (i, (cell, width)) in row.iter().zip(&widths).enumerate() {
                if i > 0 {
                    f.write_str(" | ")?;
                }
                write!(f, "{:width$}", cell, width = width)?;
            }
            writeln!(f)
        };

        render_row(f, &headers)?;
        for row in &rows {
            render_row(f, row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ProductionBuilder;

    fn table_for(grammar: &Grammar) -> Result<ParseTable, TableError> {
        let automaton = Automaton::generate(grammar);
        ParseTable::generate(grammar, &automaton)
    }

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

    #[test]
    fn tables_are_total() {
        let grammar = expr_grammar();
        let automaton = Automaton::generate(&grammar);
        let table = ParseTable::generate(&grammar, &automaton).unwrap();

        assert_eq!(table.state_count(), automaton.len());
        for (id, _) in automaton.states() {
            for kind in grammar.terminals() {
                assert!(table.action(id, kind).is_some());
            }
            for name in grammar.nonterminals() {
                // Defined for every column; `None` just means no transition.
                let _ = table.goto(id, name);
            }
        }
    }

    #[test]
    fn start_state_shifts_into_the_grammar() {
        let grammar = expr_grammar();
        let table = table_for(&grammar).unwrap();

        assert!(matches!(
            table.action(StateId::START, TokenKind::Ident),
            Some(Action::Shift(..))
        ));
        assert!(matches!(
            table.action(StateId::START, TokenKind::LParen),
            Some(Action::Shift(..))
        ));
        assert_eq!(
            table.action(StateId::START, TokenKind::Plus),
            Some(Action::Error)
        );
        assert!(table.goto(StateId::START, "E").is_some());
    }

    #[test]
    fn ambiguous_grammar_reports_shift_reduce() {
        // E -> E + E is ambiguous: after `E + E` the `+` can be shifted or
        // the handle reduced.
        let productions = ProductionBuilder::new()
            .auto_import()
            .add("1[0,2]", "E -> E + E")
            .unwrap()
            .add("0", "E -> id")
            .unwrap()
            .build();
        let grammar = Grammar::new("E", productions).unwrap();

        let err = table_for(&grammar).unwrap_err();
        assert!(
            matches!(
                err,
                TableError::ShiftReduce {
                    terminal: TokenKind::Plus,
                    ..
                }
            ),
            "unexpected error: {}",
            err,
        );
    }

    #[test]
    fn twin_reductions_report_reduce_reduce() {
        // A and B both derive `id`, so the state after shifting `id` holds
        // two reduce-ready items with the same lookahead.
        let productions = ProductionBuilder::new()
            .auto_import()
            .add_alts("S |> A B")
            .unwrap()
            .add_alts("A |> id")
            .unwrap()
            .add_alts("B |> id")
            .unwrap()
            .build();
        let grammar = Grammar::new("S", productions).unwrap();

        let err = table_for(&grammar).unwrap_err();
        assert!(
            matches!(err, TableError::ReduceReduce { .. }),
            "unexpected error: {}",
            err,
        );
    }
}
