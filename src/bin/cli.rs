//! Interactive CLI: analyze typed text or a document on disk and print the report.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use text_insight_analyzer::{display::render_report, extract::load_text_from_file, telemetry, Runtime};

fn prompt(stdin: &mut impl BufRead, label: &str) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    stdin.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let rt = Runtime::from_env().context("service configuration")?;

    println!("Enter 1 to input text");
    println!("Enter 2 to upload a file");
    let mut stdin = io::stdin().lock();
    let choice = prompt(&mut stdin, "> ")?;

    let text = if choice.trim() == "1" {
        prompt(&mut stdin, "Enter your text:\n")?
    } else {
        let path = prompt(&mut stdin, "Enter file path: ")?;
        load_text_from_file(path.trim()).with_context(|| format!("reading {}", path.trim()))?
    };
    drop(stdin);

    let record = rt.analyzer.analyze_text_all(&text).await?;
    println!("{}", render_report(&record));
    Ok(())
}
