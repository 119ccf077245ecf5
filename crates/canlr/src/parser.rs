//! The table-driven shift-reduce parser.

use crate::ast::AstNode;
use crate::grammar::Grammar;
use crate::lexer::{Token, TokenKind};
use crate::lr1::StateId;
use crate::parse_table::{Action, ParseTable};
use crate::util::display_fn;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected `{found}' in state {state}, expected one of: {expected}")]
    Unexpected {
        state: StateId,
        found: TokenKind,
        expected: Expected,
    },

    #[error("no goto transition from state {state} on `{nonterminal}'")]
    MissingGoto { state: StateId, nonterminal: String },
}

/// The terminals a state would have accepted, for error messages.
#[derive(Debug)]
pub struct Expected(pub Vec<TokenKind>);

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "`{}'", kind)?;
        }
        Ok(())
    }
}

/// A parser for one grammar: the grammar (for productions and their
/// assembly rules) plus its synthesized tables.
///
/// The parser itself is stateless; each [`parse`](Self::parse) call owns
/// its stacks, so one parser may serve any number of inputs.
#[derive(Debug, Copy, Clone)]
pub struct Parser<'g> {
    grammar: &'g Grammar,
    table: &'g ParseTable,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar, table: &'g ParseTable) -> Self {
        Self { grammar, table }
    }

    /// Drive the token sequence to one AST.
    ///
    /// Whitespace/comment-class tokens are dropped up front and the
    /// end-of-input sentinel is appended implicitly. Hitting an `Error`
    /// cell (or a terminal foreign to the grammar) fails fatally with the
    /// current state, the offending terminal, and the state's expected set.
    pub fn parse<I>(&self, tokens: I) -> Result<AstNode, ParseError>
    where
        I: IntoIterator<Item = Token>,
    {
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|token| token.kind().needs_parse())
            .collect();

        let mut state_stack = vec![StateId::START];
        let mut node_stack: Vec<AstNode> = Vec::new();
        let mut cursor = 0;

        loop {
            let state = *state_stack.last().unwrap();
            let token = tokens.get(cursor);
            let kind = token.map(Token::kind).unwrap_or(TokenKind::Eof);

            let action = self.table.action(state, kind).unwrap_or(Action::Error);
            match action {
                Action::Shift(next) => {
                    let token = token.cloned().unwrap_or_else(Token::eof);
                    tracing::trace!(%state, %next, token = %token, "shift");
                    state_stack.push(next);
                    node_stack.push(AstNode::Leaf(token));
                    cursor += 1;
                }

                Action::Reduce(id) => {
                    let production = self.grammar.production(id);
                    tracing::trace!(%state, production = %production, "reduce");

                    // Pop |right| nodes and states; split_off keeps the
                    // children in original right-hand-side order.
                    let arity = production.right().len();
                    let children = node_stack.split_off(node_stack.len() - arity);
                    state_stack.truncate(state_stack.len() - arity);

                    let fragment = production.assemble(children);

                    let top = *state_stack.last().unwrap();
                    let next = self.table.goto(top, production.left()).ok_or_else(|| {
                        ParseError::MissingGoto {
                            state: top,
                            nonterminal: production.left().to_owned(),
                        }
                    })?;
                    tracing::trace!(state = %top, %next, symbol = production.left(), "goto");
                    state_stack.push(next);
                    node_stack.push(fragment);
                }

                Action::Accept => {
                    tracing::trace!(%state, "accept");
                    return Ok(node_stack.pop().unwrap());
                }

                Action::Error => {
                    return Err(ParseError::Unexpected {
                        state,
                        found: kind,
                        expected: Expected(self.table.expected_terminals(state)),
                    });
                }
            }
        }
    }

    /// Render the tokens a given state accepts; handy for diagnostics.
    pub fn expected_in(&self, state: StateId) -> impl fmt::Display + '_ {
        let expected = Expected(self.table.expected_terminals(state));
        display_fn(move |f| write!(f, "{}", expected))
    }
}
