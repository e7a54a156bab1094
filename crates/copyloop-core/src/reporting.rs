//! Rendering and persistence of refinement outcomes.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{CopyloopError, RefineOutcome, Result};

const OUTCOME_FILE: &str = "outcome.json";
const DIGEST_FILE: &str = "outcome.digest";

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Terminal rendering: the final text, then a status line, then either the
/// remaining failures or (with `show_details`) every report of the last round.
pub fn render_outcome_text(outcome: &RefineOutcome, show_details: bool) -> String {
    let mut out = String::new();
    out.push_str(outcome.text.trim_end());
    out.push_str("\n\n");
    out.push_str(&format!(
        "status: {} ({}) after {} iteration(s)\n",
        outcome.final_status.as_str(),
        outcome.termination.as_str(),
        outcome.iterations
    ));

    if let Some(reason) = &outcome.reason {
        out.push_str(&format!("reason: {}\n", reason));
    }

    if show_details {
        for report in &outcome.final_reports {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                report.status, report.name, report.details
            ));
        }
    } else {
        for (name, error) in outcome.reports.failures() {
            out.push_str(&format!("  {}: {}\n", name, error));
        }
    }
    out
}

/// Markdown summary suitable for a PR comment or a review note.
pub fn render_outcome_md(outcome: &RefineOutcome) -> String {
    let mut out = String::new();
    out.push_str("# Copyloop Run\n\n");
    out.push_str(&format!(
        "- run: `{}`\n- status: {}\n- termination: {}\n- iterations: {}\n",
        outcome.run_id,
        outcome.final_status.as_str(),
        outcome.termination.as_str(),
        outcome.iterations
    ));
    if let Some(reason) = &outcome.reason {
        out.push_str(&format!("- reason: {}\n", reason));
    }

    out.push_str("\n## Text\n\n");
    for line in outcome.text.lines() {
        out.push_str(&format!("> {}\n", line));
    }

    if !outcome.final_reports.is_empty() {
        out.push_str("\n## Evaluators\n\n| evaluator | status | details |\n|---|---|---|\n");
        for report in &outcome.final_reports {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                report.name,
                report.status,
                report.details.replace('\n', "<br>").replace('|', "\\|")
            ));
        }
    }
    out
}

/// Write the outcome as pretty JSON.
pub fn write_outcome_json(path: &Path, outcome: &RefineOutcome) -> Result<()> {
    let content = serde_json::to_string_pretty(outcome)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Persist `<dir>/<run_id>/outcome.json` and its SHA-256 digest.
pub fn write_run_artifact(outcome: &RefineOutcome, dir: &Path) -> Result<PathBuf> {
    let run_dir = dir.join(outcome.run_id.to_string());
    std::fs::create_dir_all(&run_dir)?;

    let artifact_path = run_dir.join(OUTCOME_FILE);
    let json = serde_json::to_vec_pretty(outcome)?;
    let digest = content_digest(&json);

    std::fs::write(&artifact_path, &json)?;
    std::fs::write(run_dir.join(DIGEST_FILE), digest.as_bytes())?;

    Ok(artifact_path)
}

/// Read `<dir>/<run_id>/outcome.json`, verifying it against its digest.
///
/// `run_id` must be a UUID; anything else is rejected before touching disk.
pub fn read_run_artifact(run_id: &str, dir: &Path) -> Result<RefineOutcome> {
    let run_id =
        Uuid::parse_str(run_id).map_err(|_| CopyloopError::InvalidRunId(run_id.to_string()))?;
    let run_dir = dir.join(run_id.to_string());
    let json = std::fs::read(run_dir.join(OUTCOME_FILE))?;
    let expected = std::fs::read_to_string(run_dir.join(DIGEST_FILE))?;
    let actual = content_digest(&json);
    if expected.trim() != actual {
        return Err(CopyloopError::DigestMismatch {
            expected: expected.trim().to_string(),
            actual,
        });
    }

    Ok(serde_json::from_slice(&json)?)
}
