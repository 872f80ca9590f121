//! Grading of free text answers against the accepted spellings of a pair.
//!
//! An answer may hold several comma separated words. Every word has to be one of the accepted
//! spellings, the accepted spellings that were not given are reported back. A trailing `-->` on
//! the last word asks for the pair to be dropped from the set, it is not part of the answer.

use crate::set::normalize;

/// Marker at the end of an answer asking for the pair to be removed.
pub const REMOVAL_MARKER: &str = "-->";

/// Outcome of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every accepted spelling was given.
    FullyCorrect,
    /// All given words were right, these accepted spellings were not given.
    CorrectWithOmissions(Vec<String>),
    /// At least one word was wrong, or nothing was given. Holds all accepted spellings.
    Incorrect(Vec<String>),
}

impl Verdict {
    /// Whether this verdict counts towards the score.
    pub fn is_correct(&self) -> bool {
        !matches!(self, Verdict::Incorrect(_))
    }
}

/// Verdict together with the removal request, the two are independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub verdict: Verdict,
    pub removal_requested: bool,
}

impl Grade {
    fn incorrect(accepted: &[String], removal_requested: bool) -> Self {
        Grade {
            verdict: Verdict::Incorrect(accepted.to_vec()),
            removal_requested,
        }
    }
}

/// Grade a raw answer, `None` means no input could be read.
pub fn grade(raw_answer: Option<&str>, accepted: &[String]) -> Grade {
    let raw_answer = match raw_answer {
        Some(v) => v,
        None => return Grade::incorrect(accepted, false),
    };

    let mut tokens = raw_answer.split(',').map(normalize).collect::<Vec<_>>();
    if tokens.len() == 1 && tokens[0].is_empty() {
        return Grade::incorrect(accepted, false);
    }

    let mut removal_requested = false;
    if let Some(last) = tokens.last_mut() {
        if let Some(stripped) = last.strip_suffix(REMOVAL_MARKER) {
            *last = stripped.trim_end().to_owned();
            removal_requested = true;
        }
    }

    let normalized_accepted = accepted.iter().map(|a| normalize(a)).collect::<Vec<_>>();
    let mut given = vec![false; accepted.len()];
    for token in tokens.iter() {
        match normalized_accepted.iter().position(|a| a == token) {
            Some(i) => given[i] = true,
            None => {
                tracing::debug!(token = token.as_str(), "answer word not accepted");
                return Grade::incorrect(accepted, removal_requested);
            }
        }
    }

    let remaining = accepted
        .iter()
        .zip(given.iter())
        .filter(|(_, given)| !**given)
        .map(|(a, _)| a.clone())
        .collect::<Vec<_>>();

    let verdict = if remaining.is_empty() {
        Verdict::FullyCorrect
    } else {
        Verdict::CorrectWithOmissions(remaining)
    };
    Grade {
        verdict,
        removal_requested,
    }
}
