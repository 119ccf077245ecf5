//! Grammar model: symbols, productions and their AST-assembly rules, and
//! the augmented grammar handed to the table compiler.

use crate::ast::AstNode;
use crate::lexer::TokenKind;
use crate::types::{Map, Set};
use crate::util::display_fn;
use std::{fmt, io};

/// A grammar symbol: either a terminal (token kind) or a named nonterminal.
///
/// Equality and hashing are structural; two terminals of the same kind and
/// two nonterminals with the same name are the same symbol regardless of
/// where they were built. Item-set deduplication depends on this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(TokenKind),
    Nonterminal(String),
}

impl Symbol {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(..))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(kind) => write!(f, "{}", kind),
            Self::Nonterminal(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionId {
    raw: u32,
}

impl ProductionId {
    /// The augmented start production `S' -> S`.
    pub const ACCEPT: Self = Self::new(0);

    pub(crate) const fn new(raw: u32) -> Self {
        Self { raw }
    }

    pub(crate) fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Display for ProductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("malformed assembly rule `{text}': {fault}")]
    MalformedRule { text: String, fault: RuleFault },

    #[error("malformed production `{0}': expected `left -> symbols...'")]
    MalformedProduction(String),

    #[error("production `{0}' is missing its assembly rule line")]
    MissingRule(String),

    #[error("duplicate terminal alias `{0}'")]
    DuplicateAlias(String),

    #[error("no productions for nonterminal `{0}'")]
    UnknownNonterminal(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Everything that can be wrong with an assembly-rule string.
#[derive(Debug, thiserror::Error)]
pub enum RuleFault {
    #[error("`{0}' is not an index")]
    BadIndex(String),

    #[error("duplicate index {0}")]
    DuplicateIndex(usize),

    #[error("index {index} out of range [0, {arity})")]
    IndexOutOfRange { index: usize, arity: usize },

    #[error("more than one root")]
    MultipleRoots,

    #[error("unbalanced bracket or stray separator")]
    Unbalanced,

    #[error("rule must not be empty")]
    EmptyRule,
}

/// The per-production index tree declaring how the popped child nodes are
/// re-linked into one fragment (`"1[0,2]"`: node 1 becomes the root and
/// adopts nodes 0 and 2, in that order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTree {
    index: usize,
    children: Vec<RuleTree>,
}

impl RuleTree {
    /// Parse the bracket/comma notation, checking every index against the
    /// production's arity.
    pub fn parse(text: &str, arity: usize) -> Result<Self, GrammarError> {
        let malformed = |fault| GrammarError::MalformedRule {
            text: text.to_owned(),
            fault,
        };

        let mut seen = Set::default();
        let mut make = |digits: &str| -> Result<RuleTree, GrammarError> {
            let index: usize = digits
                .parse()
                .map_err(|_| malformed(RuleFault::BadIndex(digits.to_owned())))?;
            if index >= arity {
                return Err(malformed(RuleFault::IndexOutOfRange { index, arity }));
            }
            if !seen.insert(index) {
                return Err(malformed(RuleFault::DuplicateIndex(index)));
            }
            Ok(RuleTree {
                index,
                children: Vec::new(),
            })
        };

        // Stack of nodes still collecting children.
        let mut stack: Vec<RuleTree> = Vec::new();
        let mut root: Option<RuleTree> = None;
        let mut buf = String::new();

        for ch in text.chars().filter(|ch| !ch.is_whitespace()) {
            match ch {
                '[' => {
                    if buf.is_empty() || root.is_some() {
                        return Err(malformed(RuleFault::Unbalanced));
                    }
                    let node = make(&buf)?;
                    buf.clear();
                    stack.push(node);
                }
                ']' | ',' => {
                    if stack.is_empty() {
                        return Err(malformed(RuleFault::Unbalanced));
                    }
                    if !buf.is_empty() {
                        let child = make(&buf)?;
                        buf.clear();
                        stack.last_mut().unwrap().children.push(child);
                    }
                    if ch == ']' {
                        let node = stack.pop().unwrap();
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(node),
                            None => root = Some(node),
                        }
                    }
                }
                _ => {
                    if root.is_some() {
                        return Err(malformed(RuleFault::MultipleRoots));
                    }
                    buf.push(ch);
                }
            }
        }

        match root {
            Some(root) => Ok(root),
            None if !stack.is_empty() => Err(malformed(RuleFault::Unbalanced)),
            None if buf.is_empty() => Err(malformed(RuleFault::EmptyRule)),
            // A bare index: the whole fragment collapses to that child.
            None => make(&buf),
        }
    }

    pub fn root_index(&self) -> usize {
        self.index
    }
}

/// A production rule `left -> right...` with its assembly rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    left: String,
    right: Vec<Symbol>,
    rule: RuleTree,
}

impl Production {
    pub fn new(
        left: impl Into<String>,
        right: Vec<Symbol>,
        rule_text: &str,
    ) -> Result<Self, GrammarError> {
        let left = left.into();
        if right.is_empty() {
            return Err(GrammarError::MalformedProduction(left));
        }
        let rule = RuleTree::parse(rule_text, right.len())?;
        Ok(Self { left, right, rule })
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &[Symbol] {
        &self.right
    }

    /// Fold the popped child nodes into this production's AST fragment.
    ///
    /// A single-symbol production collapses to its child unchanged. Anything
    /// else re-links the popped nodes along the rule tree: each parent index
    /// adopts the nodes of its child indices in listed order, and a leaf
    /// serving as a parent is promoted to an internal node labeled by
    /// `left`, keeping its token.
    pub fn assemble(&self, nodes: Vec<AstNode>) -> AstNode {
        debug_assert_eq!(nodes.len(), self.right.len());
        if nodes.len() == 1 {
            return nodes.into_iter().next().expect("exactly one child");
        }
        let mut slots: Vec<Option<AstNode>> = nodes.into_iter().map(Some).collect();
        self.link(&self.rule, &mut slots)
    }

    fn link(&self, rule: &RuleTree, slots: &mut [Option<AstNode>]) -> AstNode {
        let node = slots[rule.index].take().expect("rule indices are unique");
        if rule.children.is_empty() {
            return node;
        }
        let mut node = match node {
            AstNode::Leaf(token) => AstNode::internal(self.left.clone(), Some(token)),
            internal => internal,
        };
        for child in &rule.children {
            let child = self.link(child, slots);
            node.adopt(child);
        }
        node
    }

    /// `"E -> E + T"`, with a dot marker at the given position.
    pub fn display_dotted(&self, dot: usize) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            write!(f, "{} ->", self.left)?;
            for (i, symbol) in self.right.iter().enumerate() {
                if i == dot {
                    f.write_str(" .")?;
                }
                write!(f, " {}", symbol)?;
            }
            if dot == self.right.len() {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.left)?;
        for symbol in &self.right {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// Builder collecting productions from the textual notation.
#[derive(Debug, Default)]
pub struct ProductionBuilder {
    aliases: Map<String, TokenKind>,
    productions: Vec<Production>,
}

impl ProductionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as the notation alias of a token kind.
    pub fn alias(mut self, name: &str, kind: TokenKind) -> Result<Self, GrammarError> {
        if self.aliases.contains_key(name) {
            return Err(GrammarError::DuplicateAlias(name.to_owned()));
        }
        self.aliases.insert(name.to_owned(), kind);
        Ok(self)
    }

    /// Register the built-in alias of every token kind that has one.
    pub fn auto_import(mut self) -> Self {
        for &kind in TokenKind::ALL {
            if let Some(alias) = kind.alias() {
                self.aliases.entry(alias.to_owned()).or_insert(kind);
            }
        }
        self
    }

    fn symbol(&self, text: &str) -> Symbol {
        match self.aliases.get(text) {
            Some(&kind) => Symbol::Terminal(kind),
            None => Symbol::Nonterminal(text.to_owned()),
        }
    }

    /// Add one production `"left -> sym1 sym2 ..."` with its assembly rule.
    pub fn add(mut self, rule: &str, production: &str) -> Result<Self, GrammarError> {
        let (left, right) = production
            .split_once("->")
            .ok_or_else(|| GrammarError::MalformedProduction(production.to_owned()))?;
        let right: Vec<Symbol> = right.split_whitespace().map(|s| self.symbol(s)).collect();
        if right.is_empty() {
            return Err(GrammarError::MalformedProduction(production.to_owned()));
        }
        self.productions
            .push(Production::new(left.trim(), right, rule)?);
        Ok(self)
    }

    /// Add `"left |> a b c"`: one single-symbol production per alternative,
    /// each with the pass-through rule `"0"`.
    pub fn add_alts(mut self, production: &str) -> Result<Self, GrammarError> {
        let (left, alts) = production
            .split_once("|>")
            .ok_or_else(|| GrammarError::MalformedProduction(production.to_owned()))?;
        let left = left.trim();
        let mut added = false;
        for alt in alts.split_whitespace() {
            let symbol = self.symbol(alt);
            self.productions
                .push(Production::new(left, vec![symbol], "0")?);
            added = true;
        }
        if !added {
            return Err(GrammarError::MalformedProduction(production.to_owned()));
        }
        Ok(self)
    }

    pub fn build(self) -> Vec<Production> {
        self.productions
    }
}

/// An augmented grammar: the user's productions prefixed with `S' -> S`,
/// plus the deterministic numbering used by the parse tables.
#[derive(Debug)]
pub struct Grammar {
    productions: Vec<Production>,
    groups: Map<String, Vec<ProductionId>>,
    start: String,
    symbols: Set<Symbol>,
    terminals: Map<TokenKind, usize>,
    nonterminals: Map<String, usize>,
}

impl Grammar {
    /// Augment `productions` with `start' -> start` and build the grammar.
    ///
    /// Fails if any referenced nonterminal (the start symbol included) has
    /// no productions.
    pub fn new(start: &str, productions: Vec<Production>) -> Result<Self, GrammarError> {
        let accept = Production::new(
            format!("{}'", start),
            vec![Symbol::Nonterminal(start.to_owned())],
            "0",
        )?;
        let mut all = Vec::with_capacity(1 + productions.len());
        all.push(accept);
        all.extend(productions);

        let mut groups: Map<String, Vec<ProductionId>> = Map::default();
        for (index, production) in all.iter().enumerate() {
            groups
                .entry(production.left.clone())
                .or_default()
                .push(ProductionId::new(index as u32));
        }

        // Symbol inventory in first-seen order; this order drives the
        // automaton's GOTO exploration and hence the state numbering.
        let mut symbols = Set::default();
        for production in &all {
            symbols.insert(Symbol::Nonterminal(production.left.clone()));
            for symbol in &production.right {
                symbols.insert(symbol.clone());
            }
        }

        for symbol in &symbols {
            if let Symbol::Nonterminal(name) = symbol {
                if !groups.contains_key(name) {
                    return Err(GrammarError::UnknownNonterminal(name.clone()));
                }
            }
        }

        // Table columns: terminals in first-use order with Eof last,
        // nonterminals in production order.
        let mut terminals: Map<TokenKind, usize> = Map::default();
        for symbol in &symbols {
            if let Symbol::Terminal(kind) = symbol {
                let next = terminals.len();
                terminals.entry(*kind).or_insert(next);
            }
        }
        let next = terminals.len();
        terminals.entry(TokenKind::Eof).or_insert(next);

        let mut nonterminals: Map<String, usize> = Map::default();
        for production in &all {
            let next = nonterminals.len();
            nonterminals.entry(production.left.clone()).or_insert(next);
        }

        Ok(Self {
            productions: all,
            groups,
            start: start.to_owned(),
            symbols,
            terminals,
            nonterminals,
        })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.index()]
    }

    pub fn productions(&self) -> impl Iterator<Item = (ProductionId, &Production)> + '_ {
        self.productions
            .iter()
            .enumerate()
            .map(|(index, production)| (ProductionId::new(index as u32), production))
    }

    /// All productions with the given left-hand nonterminal.
    ///
    /// Construction validated that every referenced nonterminal has a
    /// group, so this only returns an empty slice for foreign names.
    pub fn productions_of(&self, left: &str) -> &[ProductionId] {
        self.groups.get(left).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every distinct symbol of the grammar, in first-seen order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols.iter()
    }

    /// Action-table column of a terminal, if it occurs in this grammar.
    pub fn terminal_index(&self, kind: TokenKind) -> Option<usize> {
        self.terminals.get(&kind).copied()
    }

    /// Goto-table column of a nonterminal.
    pub fn nonterminal_index(&self, name: &str) -> Option<usize> {
        self.nonterminals.get(name).copied()
    }

    /// The terminal columns (Eof last), in table order.
    pub fn terminals(&self) -> impl Iterator<Item = TokenKind> + '_ {
        self.terminals.keys().copied()
    }

    /// The nonterminal columns, in table order.
    pub fn nonterminals(&self) -> impl Iterator<Item = &str> + '_ {
        self.nonterminals.keys().map(String::as_str)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for kind in self.terminals() {
            writeln!(f, "{}", kind)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for name in self.nonterminals() {
            write!(f, "{}", name)?;
            if name == self.start {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for (id, production) in self.productions() {
            writeln!(f, "{}: {}", id, production)?;
        }

        Ok(())
    }
}
