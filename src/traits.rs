use crate::error::StoreError;
use crate::set::Set;
use serde::{Deserialize, Serialize};

/// Which side of a pair is shown, the other side is what must be typed.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Deserialize, Serialize)]
pub enum Direction {
    /// Show language A, answer in language B.
    #[default]
    AskA,
    /// Show language B, answer in language A.
    AskB,
}

impl Direction {
    /// The language label that is shown to the learner.
    pub fn shown<'a>(&self, set: &'a Set) -> &'a str {
        match self {
            Direction::AskA => &set.language_a,
            Direction::AskB => &set.language_b,
        }
    }

    /// The language label the learner has to answer in.
    pub fn expected<'a>(&self, set: &'a Set) -> &'a str {
        match self {
            Direction::AskA => &set.language_b,
            Direction::AskB => &set.language_a,
        }
    }
}

/// A question as presented to the learner.
#[derive(Debug, PartialEq, Clone)]
pub struct Question<'a> {
    /// Index of the pair in the current order of the set.
    pub index: usize,
    /// Tokens that are shown.
    pub shown: &'a [String],
    /// Tokens that are accepted as answer.
    pub accepted: &'a [String],
}

/// The console the engine talks to, the engine never touches stdin or stdout itself.
pub trait Console {
    /// Read one line of input, `None` if no input could be obtained.
    fn read_line(&mut self) -> Option<String>;

    /// Write a line of output.
    fn write_line(&mut self, line: &str);

    /// Write output without a line ending, used for prompts.
    fn write(&mut self, text: &str) {
        self.write_line(text);
    }

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Durable storage of sets, addressed by key.
pub trait SetStore: std::fmt::Debug {
    /// All keys currently stored, in a stable order.
    fn list_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Whether a record exists for this key.
    fn exists(&self, key: &str) -> bool;

    /// Load the set stored at key.
    fn load(&self, key: &str) -> Result<Set, StoreError>;

    /// Replace the record at key with this set, all or nothing.
    fn save(&mut self, key: &str, set: &Set) -> Result<(), StoreError>;

    /// Move a record to another key.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError>;

    /// Delete the record at key.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}
