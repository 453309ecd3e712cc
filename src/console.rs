//! Interactive query console.
//!
//! A synchronous read–answer–print loop over [`RagPipeline::answer`]. Each
//! turn is resolved into an explicit [`TurnOutcome`], so the continuation
//! decision is a state transition the loop matches on rather than an
//! unwind: an error in one turn is reported inline and the next prompt is
//! shown, a sentinel ends the session, and nothing else breaks the loop.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

use crate::error::{RagError, Result};
use crate::pipeline::RagPipeline;

/// The resolution of one console turn.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The pipeline produced an answer.
    Answered(String),
    /// A service failed this turn; the session continues.
    Failed(String),
    /// The user asked to leave.
    Exit,
}

/// Whether `line` is the session-ending sentinel (`exit` or `quit`,
/// case-insensitive, surrounding whitespace ignored).
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// Resolve one line of input into a [`TurnOutcome`].
///
/// Sentinel detection happens before anything else, so an `exit` never
/// touches the embedding service, the store, or the generation model.
pub async fn run_turn(pipeline: &RagPipeline, line: &str) -> TurnOutcome {
    if is_exit_command(line) {
        return TurnOutcome::Exit;
    }
    match pipeline.answer(line).await {
        Ok(answer) => TurnOutcome::Answered(answer),
        Err(e) => {
            warn!(error = %e, "query turn failed");
            TurnOutcome::Failed(e.to_string())
        }
    }
}

/// Run the interactive session until the user exits.
///
/// Blocks on stdin between turns and on the service calls within one; no
/// concurrent queries.
pub async fn run_console(pipeline: &RagPipeline) -> Result<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| RagError::Pipeline(format!("failed to initialize console: {e}")))?;

    loop {
        match editor.readline("You: ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                match run_turn(pipeline, &line).await {
                    TurnOutcome::Answered(answer) => println!("Assistant: {answer}"),
                    TurnOutcome::Failed(message) => println!("An error occurred: {message}"),
                    TurnOutcome::Exit => {
                        println!("Assistant: Goodbye!");
                        return Ok(());
                    }
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
            Err(e) => {
                return Err(RagError::Pipeline(format!("console read failed: {e}")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_case_insensitive() {
        for line in ["exit", "EXIT", "Exit", "quit", "QUIT", "  quit  "] {
            assert!(is_exit_command(line), "{line:?} should end the session");
        }
    }

    #[test]
    fn questions_are_not_sentinels() {
        for line in ["exit?", "how do I quit vim", "", "quit smoking tips"] {
            assert!(!is_exit_command(line), "{line:?} should be treated as a query");
        }
    }
}
