//! Headless driver: feeds a script of intents through the list state machine
//! and prints the resulting snapshots as JSON.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::list::{Intent, Snapshot};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: invalid intent: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse one intent per line. Blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<Intent>, ScriptError> {
    let mut intents = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let intent = serde_json::from_str(line).map_err(|source| ScriptError::Parse {
            line: index + 1,
            source,
        })?;
        intents.push(intent);
    }
    Ok(intents)
}

/// Apply `intents` in order, returning every snapshot including the initial one.
pub fn run(intents: &[Intent]) -> Vec<Snapshot> {
    let mut snapshots = Vec::with_capacity(intents.len() + 1);
    snapshots.push(Snapshot::new());
    for intent in intents {
        let next = snapshots
            .last()
            .map(|current| current.apply(intent))
            .unwrap_or_default();
        snapshots.push(next);
    }
    snapshots
}

pub fn replay_file(path: &Path, each: bool, out: &mut impl Write) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let intents =
        parse_script(&text).with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::info!(path = %path.display(), intents = intents.len(), "replaying script");

    let snapshots = run(&intents);
    if each {
        // The initial empty snapshot is not printed; one line per intent.
        for snapshot in snapshots.iter().skip(1) {
            writeln!(out, "{}", serde_json::to_string(snapshot)?)?;
        }
    } else if let Some(last) = snapshots.last() {
        writeln!(out, "{}", serde_json::to_string_pretty(last)?)?;
    }
    Ok(())
}
