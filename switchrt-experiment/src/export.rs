//! Flat CSV rendering of every persisted trial, one row per trial.

use crate::store::StoredSession;

pub const CSV_HEADERS: [&str; 15] = [
    "Participant Email",
    "Participant Created",
    "Game Type",
    "Session ID",
    "Total Iterations",
    "Correct Answers",
    "Average Reaction Time",
    "Accuracy %",
    "Session Created",
    "Iteration",
    "Number Shown",
    "Color Shown",
    "Key Pressed",
    "Reaction Time (ms)",
    "Is Correct",
];

/// Renders sessions in the order given; every cell is quoted.
pub fn export_csv(sessions: &[StoredSession]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADERS.iter().map(|h| h.to_string()));
    for session in sessions {
        let summary = &session.summary;
        for trial in &session.trials {
            push_row(
                &mut out,
                [
                    session.participant.email.clone(),
                    session.participant.created_at.to_rfc3339(),
                    summary.kind.label().to_string(),
                    session.id.to_string(),
                    summary.total_iterations.to_string(),
                    summary.correct_count.to_string(),
                    summary.average_reaction_time_ms.to_string(),
                    summary.accuracy_percent.to_string(),
                    session.created_at.to_rfc3339(),
                    trial.iteration.to_string(),
                    trial.value.to_string(),
                    trial.category.name().to_string(),
                    trial.key_label().to_string(),
                    trial.reaction_time_ms.to_string(),
                    trial.correct.to_string(),
                ],
            );
        }
    }
    out
}

fn push_row(out: &mut String, cells: impl IntoIterator<Item = String>) {
    let quoted: Vec<String> = cells
        .into_iter()
        .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
        .collect();
    out.push_str(&quoted.join(","));
    out.push('\n');
}
