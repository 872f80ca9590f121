//! Word pairs and the sets that hold them.

use crate::error::ValidationError;
use crate::traits::Direction;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Normal form of a single word: surrounding whitespace removed, lower case.
pub fn normalize(token: &str) -> String {
    token.trim().to_lowercase()
}

/// One vocabulary entry, every side holds all accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "StoredWordPair")]
pub struct WordPair {
    forward: Vec<String>,
    backward: Vec<String>,
}

/// A pair as read from disk, before validation.
#[derive(Debug, Deserialize)]
struct StoredWordPair {
    #[serde(alias = "question")]
    forward: Vec<String>,
    #[serde(alias = "answer")]
    backward: Vec<String>,
}

impl TryFrom<StoredWordPair> for WordPair {
    type Error = ValidationError;

    fn try_from(stored: StoredWordPair) -> Result<Self, Self::Error> {
        WordPair::new(&stored.forward, &stored.backward)
    }
}

impl WordPair {
    /// Create a pair, normalizing each word. Blank or repeated words are rejected.
    pub fn new<S: AsRef<str>>(forward: &[S], backward: &[S]) -> Result<Self, ValidationError> {
        Ok(WordPair {
            forward: Self::side(forward)?,
            backward: Self::side(backward)?,
        })
    }

    fn side<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<String>, ValidationError> {
        if tokens.is_empty() {
            return Err(ValidationError::EmptySide);
        }
        let mut res: Vec<String> = Vec::with_capacity(tokens.len());
        for token in tokens.iter() {
            let token = normalize(token.as_ref());
            if token.is_empty() {
                return Err(ValidationError::BlankToken);
            }
            if res.contains(&token) {
                return Err(ValidationError::DuplicateToken(token));
            }
            res.push(token);
        }
        Ok(res)
    }

    /// Spellings in language A.
    pub fn forward(&self) -> &[String] {
        &self.forward
    }

    /// Spellings in language B.
    pub fn backward(&self) -> &[String] {
        &self.backward
    }

    /// The side shown for this direction, followed by the side that is accepted as answer.
    pub fn sides(&self, direction: Direction) -> (&[String], &[String]) {
        match direction {
            Direction::AskA => (self.forward.as_slice(), self.backward.as_slice()),
            Direction::AskB => (self.backward.as_slice(), self.forward.as_slice()),
        }
    }
}

/// A collection of word pairs in two languages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Set {
    #[serde(rename = "languageA", alias = "questionLanguage")]
    pub language_a: String,
    #[serde(rename = "languageB", alias = "answerLanguage")]
    pub language_b: String,
    #[serde(alias = "AnswerPairs")]
    pairs: Vec<WordPair>,
}

impl Set {
    pub fn new(language_a: &str, language_b: &str) -> Self {
        Set {
            language_a: language_a.to_owned(),
            language_b: language_b.to_owned(),
            pairs: vec![],
        }
    }

    pub fn with_pairs(language_a: &str, language_b: &str, pairs: Vec<WordPair>) -> Self {
        Set {
            language_a: language_a.to_owned(),
            language_b: language_b.to_owned(),
            pairs,
        }
    }

    pub fn push(&mut self, pair: WordPair) {
        self.pairs.push(pair);
    }

    pub fn pairs(&self) -> &[WordPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Put the pairs in a uniformly random order.
    ///
    /// Fisher-Yates, walking from the last index down to 1 and swapping each position with a
    /// position drawn uniformly from the ones not yet fixed.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.pairs.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.pairs.swap(i, j);
        }
    }

    /// New set with the same labels and all pairs except the ones at the given indices.
    /// Survivors keep their relative order, indices past the end are ignored.
    pub fn without(&self, removal: &BTreeSet<usize>) -> Set {
        let pairs = self
            .pairs
            .iter()
            .enumerate()
            .filter(|(i, _)| !removal.contains(i))
            .map(|(_, p)| p.clone())
            .collect::<Vec<_>>();
        Set::with_pairs(&self.language_a, &self.language_b, pairs)
    }
}
