use std::{env, path::PathBuf};

use canlr::{
    grammar::Grammar, lexer, lr1::Automaton, parse_table::ParseTable, parser::Parser, syntax,
};
use criterion::{criterion_group, criterion_main, Criterion};

criterion_main!(benches);
criterion_group!(benches, bench_table_generation, bench_parse);

fn expr_grammar() -> Grammar {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let productions = syntax::load_file(project_root.join("tests/expr.gram")).unwrap();
    Grammar::new("E", productions).unwrap()
}

fn bench_table_generation(c: &mut Criterion) {
    let grammar = expr_grammar();
    c.bench_function("table_generation", |b| {
        b.iter(|| {
            let automaton = Automaton::generate(&grammar);
            ParseTable::generate(&grammar, &automaton).unwrap()
        });
    });
}

fn bench_parse(c: &mut Criterion) {
    let grammar = expr_grammar();
    let automaton = Automaton::generate(&grammar);
    let table = ParseTable::generate(&grammar, &automaton).unwrap();
    let parser = Parser::new(&grammar, &table);

    let input = vec!["a * (b + c * 4) + d * 2.5 + (e + f) * (g + 12)"; 16].join(" + ");
    let tokens = lexer::lex(&input).unwrap();

    c.bench_function("parse_expression", |b| {
        b.iter(|| parser.parse(tokens.clone()).unwrap());
    });
}
