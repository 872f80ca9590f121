//! Validation of what an author types when building a new set.

use crate::error::ValidationError;
use crate::set::{normalize, Set, WordPair};

/// Typed instead of a word to finish authoring a set.
pub const END_MARKER: &str = "-__-";

/// Split a line of comma separated words into normalized words.
pub fn parse_tokens(line: &str) -> Result<Vec<String>, ValidationError> {
    if line.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    let mut tokens: Vec<String> = vec![];
    for token in line.split(',').map(normalize) {
        if token.is_empty() {
            return Err(ValidationError::BlankToken);
        }
        if tokens.contains(&token) {
            return Err(ValidationError::DuplicateToken(token));
        }
        tokens.push(token);
    }
    Ok(tokens)
}

/// A set name must start with a latin letter, followed by latin letters or digits.
pub fn validate_set_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric()),
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidSetName(name.to_owned()));
    }
    Ok(())
}

/// Name and language labels of a new set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetHeader {
    pub name: String,
    pub language_a: String,
    pub language_b: String,
}

/// Parse "name, language a, language b".
pub fn parse_set_header(line: &str) -> Result<SetHeader, ValidationError> {
    let fields = line.split(',').map(|f| f.trim()).collect::<Vec<_>>();
    if fields.len() != 3 {
        return Err(ValidationError::WrongFieldCount(fields.len()));
    }
    if fields.iter().any(|f| f.is_empty()) {
        return Err(ValidationError::BlankToken);
    }
    validate_set_name(fields[0])?;
    Ok(SetHeader {
        name: fields[0].to_owned(),
        language_a: fields[1].to_owned(),
        language_b: fields[2].to_owned(),
    })
}

/// Builds a set one pair at a time from raw author input.
#[derive(Debug)]
pub struct SetBuilder {
    set: Set,
}

impl SetBuilder {
    pub fn new(language_a: &str, language_b: &str) -> Self {
        SetBuilder {
            set: Set::new(language_a, language_b),
        }
    }

    pub fn language_a(&self) -> &str {
        &self.set.language_a
    }

    pub fn language_b(&self) -> &str {
        &self.set.language_b
    }

    /// Validate both lines and append the pair. Nothing is appended on error.
    pub fn push_raw(&mut self, forward: &str, backward: &str) -> Result<(), ValidationError> {
        let forward = parse_tokens(forward)?;
        let backward = parse_tokens(backward)?;
        self.set.push(WordPair::new(&forward, &backward)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn build(self) -> Set {
        self.set
    }
}
