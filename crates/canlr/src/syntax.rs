//! The textual grammar notation.
//!
//! A grammar file is a sequence of lines:
//!
//! ```text
//! // any line comment
//! E -> E + T
//! 1[0,2]
//! E -> T
//! 0
//! F |> id ii fi
//! ```
//!
//! A `left -> symbols...` line declares one production and is followed by
//! its assembly-rule line. A `left |> a b c` line declares one
//! single-symbol production per alternative, each with the pass-through
//! rule. Symbols resolve through the built-in token aliases; everything
//! else is a nonterminal. Parsed once, offline.

use crate::grammar::{GrammarError, Production, ProductionBuilder};
use std::{fs, path::Path};

/// Parse the notation into a production list.
pub fn parse_productions(source: &str) -> Result<Vec<Production>, GrammarError> {
    let mut builder = ProductionBuilder::new().auto_import();

    let mut lines = source
        .lines()
        .map(strip_comment)
        .filter(|line| !line.is_empty());

    while let Some(line) = lines.next() {
        if line.contains("|>") {
            builder = builder.add_alts(line)?;
        } else if line.contains("->") {
            let rule = lines
                .next()
                .ok_or_else(|| GrammarError::MissingRule(line.to_owned()))?;
            builder = builder.add(rule, line)?;
        } else {
            return Err(GrammarError::MalformedProduction(line.to_owned()));
        }
    }

    Ok(builder.build())
}

/// Load a grammar file from disk.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Production>, GrammarError> {
    let source = fs::read_to_string(path)?;
    parse_productions(&source)
}

fn strip_comment(line: &str) -> &str {
    match line.split_once("//") {
        Some((code, _)) => code.trim(),
        None => line.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Symbol;
    use crate::lexer::TokenKind;

    #[test]
    fn parses_productions_and_alternatives() {
        let source = "\
// expression grammar
E -> E + T
1[0,2]
E -> T
0

F |> id ii // two alternatives
";
        let productions = parse_productions(source).unwrap();
        assert_eq!(productions.len(), 4);

        assert_eq!(productions[0].left(), "E");
        assert_eq!(
            productions[0].right(),
            [
                Symbol::Nonterminal("E".into()),
                Symbol::Terminal(TokenKind::Plus),
                Symbol::Nonterminal("T".into()),
            ]
        );
        assert_eq!(productions[2].left(), "F");
        assert_eq!(
            productions[2].right(),
            [Symbol::Terminal(TokenKind::Ident)]
        );
        assert_eq!(
            productions[3].right(),
            [Symbol::Terminal(TokenKind::IntLit)]
        );
    }

    #[test]
    fn production_without_rule_line_fails() {
        let err = parse_productions("E -> E + T\n").unwrap_err();
        assert!(matches!(err, GrammarError::MissingRule(line) if line == "E -> E + T"));
    }

    #[test]
    fn stray_line_is_malformed() {
        let err = parse_productions("E\n").unwrap_err();
        assert!(matches!(err, GrammarError::MalformedProduction(line) if line == "E"));
    }

    #[test]
    fn malformed_rule_reports_offending_text() {
        let err = parse_productions("E -> E + T\n1[0,9]\n").unwrap_err();
        assert!(matches!(err, GrammarError::MalformedRule { text, .. } if text == "1[0,9]"));
    }
}
