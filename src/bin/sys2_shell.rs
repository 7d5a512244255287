//! sys2-shell: a minimal interactive REPL over a single in-memory `Session`.
//!
//! Four verbs, one line each:
//!
//! ```text
//! fact <subject> <relation> <object> [confidence]
//! rule <subject> <relation> <object> :- <subject> <relation> <object>
//! query <subject|?hole> <relation> <object|?hole>
//! ask <subject> <relation> <object>
//! ```

use clap::Parser;
use sys2_core::config::{init_tracing, EngineConfig};
use sys2_core::encoder::Node;
use sys2_core::kb::Condition;
use sys2_core::session::{Session, SessionConfig};
use sys2_core::truth::Truth;
use sys2_core::vector::Strategy;
use std::io::{self, BufRead, Write};

#[derive(Parser, Debug)]
#[command(name = "sys2-shell", about = "Interactive shell over a sys2-core reasoning session")]
struct Args {
    /// Vector dimension for this session.
    #[arg(long, default_value_t = 2048)]
    dimension: usize,

    /// Lane strategy: "signed" or "binary".
    #[arg(long, default_value = "signed")]
    strategy: String,

    /// Deterministic seed for the vector space.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Run in open-world mode (negation-as-failure disabled).
    #[arg(long)]
    open_world: bool,
}

fn main() {
    let args = Args::parse();
    let engine_config = EngineConfig::load().unwrap_or_default();
    init_tracing(&engine_config.logging);

    let strategy = match args.strategy.as_str() {
        "binary" => Strategy::BinaryDense,
        _ => Strategy::SignedByte,
    };
    let mut session = Session::new(SessionConfig {
        dimension: args.dimension,
        strategy,
        theory_seed: args.seed,
        closed_world: !args.open_world,
        ..SessionConfig::default()
    })
    .with_thresholds(engine_config.thresholds);

    println!("sys2-shell ready. Verbs: fact, rule, query, ask, stats, quit.");
    let stdin = io::stdin();
    loop {
        print!("sys2> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if let Err(message) = handle_line(&mut session, line) {
            println!("error: {message}");
        }
    }
}

fn handle_line(session: &mut Session, line: &str) -> Result<(), String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.first().copied() {
        Some("fact") => handle_fact(session, &words[1..]),
        Some("rule") => handle_rule(session, &words[1..]),
        Some("query") => handle_query(session, &words[1..]),
        Some("ask") => handle_ask(session, &words[1..]),
        Some("stats") => {
            let stats = session.stats();
            println!(
                "facts={} rules={} facts_scanned={} rules_tried={} exact_hits={}",
                session.fact_count(),
                session.rule_count(),
                stats.facts_scanned,
                stats.rules_tried,
                stats.exact_hits
            );
            Ok(())
        }
        Some(other) => Err(format!("unknown verb '{other}'")),
        None => Ok(()),
    }
}

fn parse_term(word: &str) -> Node {
    if let Some(hole) = word.strip_prefix('?') {
        Node::Hole(hole.to_string())
    } else {
        Node::Atom(word.to_string())
    }
}

fn parse_triple(words: &[&str]) -> Result<Node, String> {
    match words {
        [s, r, o] => Ok(Node::triple(parse_term(s), *r, parse_term(o))),
        _ => Err("expected exactly 3 arguments: subject relation object".to_string()),
    }
}

fn handle_fact(session: &mut Session, words: &[&str]) -> Result<(), String> {
    let (triple_words, confidence) = match words {
        [s, r, o, conf] => ([*s, *r, *o], conf.parse::<f32>().map_err(|e| e.to_string())?),
        [s, r, o] => ([*s, *r, *o], 1.0),
        _ => return Err("usage: fact <subject> <relation> <object> [confidence]".to_string()),
    };
    let node = parse_triple(&triple_words)?;
    session.add_fact(node, confidence).map_err(|e| e.to_string())?;
    println!("ok");
    Ok(())
}

fn handle_rule(session: &mut Session, words: &[&str]) -> Result<(), String> {
    let sep = words.iter().position(|w| *w == ":-").ok_or("rule requires ':-'")?;
    if sep != 3 || words.len() != 7 {
        return Err("usage: rule <s> <r> <o> :- <s> <r> <o>".to_string());
    }
    let conclusion = parse_triple(&words[..3])?;
    let condition = Condition::Atom(parse_triple(&words[4..7])?);
    session.add_rule(conclusion, condition).map_err(|e| e.to_string())?;
    println!("ok");
    Ok(())
}

fn handle_query(session: &mut Session, words: &[&str]) -> Result<(), String> {
    let node = parse_triple(words)?;
    let result = session.query(&node);
    if !result.success {
        println!("no match ({:?})", result.reason);
        return Ok(());
    }
    for (hole, binding) in &result.bindings {
        println!(
            "{hole} = {} (similarity {:.3})",
            binding.answer.as_deref().unwrap_or("?"),
            binding.similarity
        );
    }
    println!("confidence={:.3} ambiguous={}", result.confidence, result.ambiguous);
    Ok(())
}

fn handle_ask(session: &mut Session, words: &[&str]) -> Result<(), String> {
    let node = parse_triple(words)?;
    let truth = session.ask(&node);
    println!(
        "{}",
        match truth {
            Truth::True => "true",
            Truth::False => "false",
            Truth::Unknown => "unknown",
        }
    );
    Ok(())
}
