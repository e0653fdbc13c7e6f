//! Shared output helpers for human and JSON modes.
//!
//! Human mode prints primary data to stdout and notices to stderr.
//! JSON mode wraps responses in `{ data, notices? }` and respects `--pretty`
//! and `--quiet`.

use std::io::Write;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::opts::KpiOpts;

/// Print a command result. `human` is used instead of `data` outside JSON mode
/// when the command has a better plain-text rendering.
pub fn print_success(
    opts: &KpiOpts,
    data: Value,
    human: Option<String>,
    mut notices: Vec<String>,
) -> Result<()> {
    if opts.quiet {
        notices.clear();
    }
    if opts.pretty || opts.json {
        print_json(opts, data, notices)
    } else {
        print_human(data, human, notices)
    }
}

fn print_json(opts: &KpiOpts, data: Value, notices: Vec<String>) -> Result<()> {
    let mut root = Map::new();
    root.insert("data".into(), data);
    if !notices.is_empty() {
        root.insert(
            "notices".into(),
            notices.into_iter().map(Value::String).collect(),
        );
    }
    let root = Value::Object(root);
    if opts.pretty {
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        println!("{}", serde_json::to_string(&root)?);
    }
    Ok(())
}

fn print_human(data: Value, human: Option<String>, notices: Vec<String>) -> Result<()> {
    let mut stderr = std::io::stderr();
    for notice in notices {
        writeln!(stderr, "notice: {notice}")?;
    }
    match (human, data) {
        (Some(text), _) => println!("{text}"),
        (None, Value::String(s)) => println!("{s}"),
        (None, Value::Null) => {}
        (None, other) => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}
