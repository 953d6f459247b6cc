use minisearch_core::SearchEngine;
use std::io::{BufRead, Write};

const EXIT_COMMAND: &str = "exit";

/// Read queries line by line from `input` until `exit` or end of input, printing
/// ranked results to `out`.
pub fn run_repl<R: BufRead, W: Write>(engine: &SearchEngine, mut input: R, mut out: W) -> anyhow::Result<()> {
    writeln!(out, "\n--- Mini Search Engine ---")?;
    writeln!(out, "Type your query and press Enter. Type '{EXIT_COMMAND}' to quit.")?;
    let mut line = String::new();
    loop {
        write!(out, "\n> ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }

        let hits = engine.search(query)?;
        if hits.is_empty() {
            writeln!(out, "No results found.")?;
            continue;
        }
        writeln!(out, "\nFound {} results:", hits.len())?;
        for (i, hit) in hits.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, hit.url)?;
            writeln!(out, "   {}\n", hit.snippet)?;
        }
    }
    writeln!(out, "Goodbye!")?;
    Ok(())
}
