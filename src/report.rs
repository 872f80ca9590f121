//! Lines shown to the learner.

use crate::matcher::{Grade, Verdict};
use crate::set::Set;
use crate::training::SessionSummary;
use unicode_width::UnicodeWidthStr;

/// Spaces between the two columns of a printed set.
const COLUMN_GAP: usize = 10;

pub fn join(words: &[String]) -> String {
    words.join(", ")
}

/// Line describing the verdict of one answer.
pub fn verdict_line(grade: &Grade) -> String {
    match &grade.verdict {
        Verdict::FullyCorrect => "✅ correct".to_owned(),
        Verdict::CorrectWithOmissions(remaining) => {
            let tail = if remaining.len() == 1 {
                "is correct too"
            } else {
                "are correct too"
            };
            format!("✅ correct, {} {tail}", join(remaining))
        }
        Verdict::Incorrect(expected) => {
            format!("❌ incorrect, the answer was: {}", join(expected))
        }
    }
}

pub fn removal_line() -> &'static str {
    " This pair will be removed from the set"
}

pub fn score_line(summary: &SessionSummary) -> String {
    format!("You got {}/{} right", summary.correct, summary.asked)
}

/// The whole set as a two column dictionary.
pub fn set_table(set: &Set) -> Vec<String> {
    let widest = set
        .pairs()
        .iter()
        .map(|p| join(p.forward()).width())
        .max()
        .unwrap_or(0);
    set.pairs()
        .iter()
        .map(|p| {
            let left = join(p.forward());
            let pad = widest - left.width() + COLUMN_GAP;
            format!("{left}{}{}", " ".repeat(pad), join(p.backward()))
        })
        .collect()
}
