//! Syntax trees produced by the parser driver.

use crate::lexer::{Token, TokenKind};
use crate::util::display_fn;
use std::fmt;

/// A node of the abstract syntax tree.
///
/// Every node is owned by exactly one parent (or by the caller, for the
/// root); the structure is strictly a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// A shifted token.
    Leaf(Token),
    /// A fragment assembled by reducing a production.
    Internal(InternalNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternalNode {
    /// Name of the nonterminal whose production built this node.
    pub label: String,
    /// The terminal this node grew out of, if the production's assembly
    /// rule rooted the fragment at a token (e.g. the operator of a binary
    /// expression).
    pub token: Option<Token>,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub(crate) fn internal(label: String, token: Option<Token>) -> Self {
        Self::Internal(InternalNode {
            label,
            token,
            children: Vec::new(),
        })
    }

    pub(crate) fn adopt(&mut self, child: AstNode) {
        match self {
            Self::Internal(node) => node.children.push(child),
            Self::Leaf(..) => unreachable!("leaf nodes are promoted before adopting children"),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(..))
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Internal(node) => Some(&node.label),
            Self::Leaf(..) => None,
        }
    }

    /// The token carried by this node: the leaf token itself, or the token
    /// an internal node was rooted at.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Leaf(token) => Some(token),
            Self::Internal(node) => node.token.as_ref(),
        }
    }

    pub fn kind(&self) -> Option<TokenKind> {
        self.token().map(Token::kind)
    }

    pub fn children(&self) -> &[AstNode] {
        match self {
            Self::Internal(node) => &node.children,
            Self::Leaf(..) => &[],
        }
    }

    pub fn child(&self, index: usize) -> &AstNode {
        &self.children()[index]
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str("  ")?;
        }
        match self {
            Self::Leaf(token) => writeln!(f, "{}", token)?,
            Self::Internal(node) => {
                match &node.token {
                    Some(token) => writeln!(f, "{} `{}'", node.label, token)?,
                    None => writeln!(f, "{}", node.label)?,
                }
            }
        }
        for child in self.children() {
            child.render(f, depth + 1)?;
        }
        Ok(())
    }

    /// Indented console rendering of the whole tree.
    pub fn display_tree(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| self.render(f, 0))
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(token) => write!(f, "{}", token),
            Self::Internal(node) => match &node.token {
                Some(token) => write!(f, "{} `{}'", node.label, token),
                None => write!(f, "{}", node.label),
            },
        }
    }
}
