// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types for the assembler pipeline.
//!
//! Two kinds exist: [`SyntaxError`] from the lexer/parser and
//! [`SemanticError`] from resolution and encoding. Both are fail-fast; the
//! first error aborts the whole run. Every message carries the line number
//! and/or the offending literal so callers can match on substrings.

use std::fmt;

use thiserror::Error;

/// Umbrella error returned by [`crate::core::assembler::Assembler::assemble`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

/// Lexical and parse-time errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("line {line}: unexpected character '{ch}'")]
    UnknownChar { ch: char, line: u32 },
    #[error("line {line}: stray label '{text}' outside of any section")]
    StrayLabel { text: String, line: u32 },
    #[error("line {line}: stray instruction '{text}' outside of any section")]
    StrayInstruction { text: String, line: u32 },
    #[error("line {line}: stray directive '{text}'")]
    StrayDirective { text: String, line: u32 },
    #[error("line {line}: duplicate label '{label}'")]
    DuplicateLabel { label: String, line: u32 },
    #[error("missing an .end")]
    MissingEnd,
    #[error("line {line}: no label allowed on '{directive}'")]
    SectionLabel { directive: String, line: u32 },
    #[error("line {line}: '{directive}' takes no operand")]
    SectionOperand { directive: String, line: u32 },
    #[error("line {line}: '{directive}' requires an address operand")]
    MissingAddress { directive: String, line: u32 },
    #[error("line {line}: dangling operand '{token}'")]
    DanglingOperand { token: String, line: u32 },
    #[error("line {line}: unexpected '{found}'")]
    UnexpectedToken { found: String, line: u32 },
}

/// Resolution and encoding-time errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("line {line}: undefined label '{label}'")]
    UnresolvedLabel { label: String, line: u32 },
    #[error("line {line}: value {value} does not fit in a {bits}-bit {kind} field")]
    OutOfRange {
        value: i64,
        bits: u8,
        kind: FieldKind,
        line: u32,
    },
    #[error("line {line}: no such register '{name}'")]
    BadRegister { name: String, line: u32 },
    #[error("line {line}: '{op}' does not accept operands ({shape})")]
    SignatureMismatch { op: String, shape: String, line: u32 },
    #[error("line {line}: unknown instruction '{op}'")]
    UnknownOp { op: String, line: u32 },
    #[error("line {line}: unknown directive '{op}'")]
    UnknownDirective { op: String, line: u32 },
    #[error("line {line}: unknown directive '{op}' with value {value}")]
    UnknownDirectiveInt { op: String, value: i64, line: u32 },
    #[error("line {line}: unknown directive '{op}' with string \"{text}\"")]
    UnknownDirectiveStr { op: String, text: String, line: u32 },
    #[error("sections at {a:#x} and {b:#x} overlap")]
    SectionOverlap { a: u32, b: u32 },
    #[error("section at {start:#x} extends past the end of the address space")]
    SectionOverflow { start: u32 },
}

/// Signedness of a bit field, for range-error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Signed,
    Unsigned,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Signed => f.write_str("signed"),
            FieldKind::Unsigned => f.write_str("unsigned"),
        }
    }
}
