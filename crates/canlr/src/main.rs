use anyhow::Context;
use canlr::{
    grammar::Grammar,
    lexer,
    lr1::Automaton,
    parse_table::ParseTable,
    parser::Parser,
    syntax,
};
use clap::Parser as _;
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

/// Compile LR(1) parse tables from a grammar file and drive them.
#[derive(Debug, clap::Parser)]
#[command(name = "canlr")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Print the grammar and its derived automaton and tables.
    Show {
        /// Path to the grammar file.
        grammar: PathBuf,

        /// Name of the start symbol.
        #[arg(long)]
        start: String,

        /// Also list the automaton's item sets.
        #[arg(long)]
        states: bool,

        /// Also render the action/goto tables.
        #[arg(long)]
        tables: bool,
    },

    /// Parse expressions against the grammar and print their syntax trees.
    Parse {
        /// Path to the grammar file.
        grammar: PathBuf,

        /// Name of the start symbol.
        #[arg(long)]
        start: String,

        /// Expression to parse; reads lines from stdin when omitted.
        #[arg(long)]
        expr: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Args::parse().command {
        Command::Show {
            grammar,
            start,
            states,
            tables,
        } => {
            let (grammar, automaton, table) = compile(&grammar, &start)?;
            println!("{}", grammar);
            if states {
                println!("{}", automaton.display(&grammar));
            }
            if tables {
                println!("{}", table);
            }
        }

        Command::Parse {
            grammar,
            start,
            expr,
        } => {
            let (grammar, _automaton, table) = compile(&grammar, &start)?;
            let parser = Parser::new(&grammar, &table);

            match expr {
                Some(expr) => parse_line(&parser, &expr)?,
                None => {
                    let stdin = io::stdin();
                    let mut stdout = io::stdout();
                    for line in stdin.lock().lines() {
                        let line = line.context("reading stdin")?;
                        if line.trim().is_empty() {
                            continue;
                        }
                        if let Err(err) = parse_line(&parser, &line) {
                            eprintln!("error: {:#}", err);
                        }
                        stdout.flush()?;
                    }
                }
            }
        }
    }

    Ok(())
}

fn compile(path: &PathBuf, start: &str) -> anyhow::Result<(Grammar, Automaton, ParseTable)> {
    let productions = syntax::load_file(path)
        .with_context(|| format!("loading grammar file `{}'", path.display()))?;
    let grammar = Grammar::new(start, productions).context("building grammar")?;
    let automaton = Automaton::generate(&grammar);
    let table = ParseTable::generate(&grammar, &automaton).context("synthesizing parse tables")?;
    Ok((grammar, automaton, table))
}

fn parse_line(parser: &Parser<'_>, line: &str) -> anyhow::Result<()> {
    let tokens = lexer::lex(line).context("lexical error")?;
    let ast = parser.parse(tokens).context("parse error")?;
    println!("{}", ast.display_tree());
    Ok(())
}
