/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for the template engine.
//!
//! Rendering itself never fails — every fallible step degrades to an
//! empty string or passes its input through unchanged. These types exist
//! for the internal seams (argument tokenizer, mini-expression parser)
//! whose callers decide how to degrade.

use thiserror::Error;

/// Errors produced by the engine's internal parsers.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A filter argument list could not be tokenized.
    #[error("invalid filter arguments: {message}")]
    InvalidArgs { message: String },

    /// A `map`/`template` expression is outside the accepted forms.
    #[error("unsupported expression: {message}")]
    UnsupportedExpression { message: String },
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
