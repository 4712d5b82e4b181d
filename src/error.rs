//! Candidate-scoped failures of the compilation pipeline.
//!
//! None of these abort a batch: the compiler turns every one of them into a
//! skipped outcome and moves on to the next candidate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A `[`, `(` or quote never closed (or closed without opening).
    #[error("unbalanced bracket expression in `{candidate}` near `{remainder}`")]
    MalformedBracketExpression { candidate: String, remainder: String },

    /// A variant segment matched no registry entry.
    #[error("unknown variant `{variant}`")]
    UnknownVariant { variant: String },

    /// A named selector variant was stacked with an arbitrary selector variant.
    #[error("variant `{variant}` cannot be stacked with an arbitrary selector variant")]
    UnsupportedStackedArbitraryVariant { variant: String },

    /// The base segment does not name a known utility.
    #[error("unresolved utility `{utility}`")]
    UnresolvedUtility { utility: String },
}

pub type CompileResult<T> = Result<T, CompileError>;
