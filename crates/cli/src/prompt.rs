//! Interactive prompt loop.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::warn;

use trackfetch_core::AcquisitionOrchestrator;

use crate::report;

const PROMPT: &str = "trackfetch> ";

/// What one line of input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Quit,
    Skip,
    Request(&'a str),
}

pub fn parse_line(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Skip;
    }
    if ["quit", "exit", "q"].iter().any(|w| line.eq_ignore_ascii_case(w)) {
        return Command::Quit;
    }
    Command::Request(line)
}

/// Reads requests until `quit` or end of input. Ctrl-C during a request
/// cancels that request only; at the prompt it ends the session.
pub async fn run_interactive(orchestrator: &AcquisitionOrchestrator, json: bool) -> Result<()> {
    println!("Enter a song name or a track URL (quit to exit).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        let input = match parse_line(&line) {
            Command::Quit => break,
            Command::Skip => continue,
            Command::Request(input) => input,
        };

        let request = orchestrator.classify(input);
        tokio::select! {
            result = orchestrator.acquire(request) => {
                println!("{}", report::render(&result, json)?);
            }
            _ = signal::ctrl_c() => {
                warn!("Request cancelled");
                println!("Cancelled.");
            }
        }
    }
    Ok(())
}
