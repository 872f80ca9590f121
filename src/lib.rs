//! Vocabulary drills over sets of bilingual word pairs.

// A pair holds every accepted spelling on both sides, so 'sphere, ball <-> boll' is a single
// entry and either 'sphere' or 'ball' is a right answer.

/// Shared types and the traits of the collaborators.
pub mod traits;

/// Error types.
pub mod error;

/// Word pairs and sets.
pub mod set;

// / Building sets from typed input.
pub mod authoring;

/// Grading of answers.
pub mod matcher;

/// Storage of sets and pruning.
pub mod store;

// / Implementor for a training session.
pub mod training;

/// Lines shown to the learner.
pub mod report;

/// Settings read from a config file.
pub mod config;
