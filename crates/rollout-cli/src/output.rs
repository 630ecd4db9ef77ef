//! Human and JSON output.
//!
//! Human mode prints one line per row to stdout. JSON mode wraps the data in
//! `{ "data": ... }` and honours `--pretty`.

use anyhow::Result;
use serde_json::{Value, json};

use crate::opts::LedgerOpts;

pub fn print_success(opts: &LedgerOpts, data: Value, rows: Vec<String>) -> Result<()> {
    if opts.pretty || opts.json {
        let root = json!({ "data": data });
        if opts.pretty {
            println!("{}", serde_json::to_string_pretty(&root)?);
        } else {
            println!("{}", serde_json::to_string(&root)?);
        }
    } else {
        for row in rows {
            println!("{row}");
        }
    }
    Ok(())
}
