// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Declarative, immutable ISA descriptors.
//!
//! An [`IsaSpec`] is constructed once per named architecture and never
//! mutated; opcode and directive dispatch is a table lookup into
//! `(signature, size, encoder)` rows, so adding an ISA means building a new
//! table, never touching the parser or resolver. Encoders are plain `fn`
//! pointers, which keeps the whole descriptor `Send + Sync`.

pub mod lc2200;
pub mod lc3;

use std::collections::HashMap;

use crate::core::error::{FieldKind, SemanticError};
use crate::core::parser::Operand;
use crate::core::symbol_table::SymbolTable;

/// Machine word, wide enough for every supported ISA. Each ISA masks its
/// output to its own `word_bits`.
pub type Word = u32;

/// Operand slot kinds for signature matching. Matching is exact: an operand
/// list must match one declared signature, with no coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// A register token.
    Reg,
    /// An integer literal only.
    Imm,
    /// A label or an integer: labels resolve to their absolute address,
    /// integers are taken verbatim by the encoder.
    Addr,
    /// A string literal only.
    Str,
}

impl OperandKind {
    pub fn matches(self, operand: &Operand) -> bool {
        match self {
            OperandKind::Reg => matches!(operand, Operand::Reg { .. }),
            OperandKind::Imm => matches!(operand, Operand::Int(_)),
            OperandKind::Addr => matches!(operand, Operand::Int(_) | Operand::Label(_)),
            OperandKind::Str => matches!(operand, Operand::Str(_)),
        }
    }
}

/// Encoder: a pure function of the operands, statement address, and symbol
/// table. This is the single place where bit packing and range checks for an
/// entry's own fields live.
pub type EncodeFn = fn(&EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError>;

/// Word-count rule used by pass 1, computable without symbol values.
pub type SizeFn = fn(&[Operand], u32) -> Result<Word, SemanticError>;

#[derive(Debug, Clone, Copy)]
pub enum SizeRule {
    Fixed(Word),
    ByOperand(SizeFn),
}

/// One `(operand signature, word count, encoder)` row of an opcode or
/// directive table.
#[derive(Debug, Clone, Copy)]
pub struct OpEntry {
    pub sig: &'static [OperandKind],
    pub size: SizeRule,
    pub encode: EncodeFn,
}

/// Register syntax and numbering for one ISA.
#[derive(Debug, Clone)]
pub struct RegisterSet {
    pub prefix: char,
    pub count: Word,
    pub aliases: &'static [(&'static str, Word)],
}

impl RegisterSet {
    /// Resolve the register text after the prefix to a register number.
    /// Digits resolve by value, anything else through the alias table
    /// (case-insensitively). Returns `None` for unknown aliases and numbers
    /// outside the register count.
    pub fn resolve(&self, name: &str) -> Option<Word> {
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
            let num: Word = name.parse().ok()?;
            return (num < self.count).then_some(num);
        }
        let folded = name.to_ascii_lowercase();
        self.aliases
            .iter()
            .find(|(alias, _)| *alias == folded)
            .map(|&(_, num)| num)
    }
}

/// Names of the section open/close directives for explicit-origin ISAs.
#[derive(Debug, Clone, Copy)]
pub struct OriginSyntax {
    pub open: &'static str,
    pub close: &'static str,
}

/// Surface syntax knobs consumed by the tokenizer and parser.
#[derive(Debug, Clone)]
pub struct Syntax {
    pub comment_char: char,
    pub directive_marker: char,
    pub label_terminator: Option<char>,
    pub immediate_prefixes: &'static [char],
    /// `Some` for `.orig`/`.end` delimited sections; `None` means one
    /// implicit section starting at address 0.
    pub origin: Option<OriginSyntax>,
}

/// Immutable descriptor of one architecture. Safe to share across threads;
/// every `Assembler` call reads it, none mutates it.
#[derive(Debug, Clone)]
pub struct IsaSpec {
    pub name: &'static str,
    pub word_bits: u8,
    pub addr_bits: u8,
    pub regs: RegisterSet,
    /// Mnemonic (lower case) to its overload rows.
    pub ops: HashMap<&'static str, Vec<OpEntry>>,
    /// Directive name (lower case, marker included) to its rows.
    pub directives: HashMap<&'static str, Vec<OpEntry>>,
    pub syntax: Syntax,
}

impl IsaSpec {
    /// True if a case-folded word names an instruction, a directive, or a
    /// section delimiter. Used by the parser to tell labels from mnemonics
    /// on ISAs without a label terminator.
    pub fn knows_word(&self, folded: &str) -> bool {
        self.ops.contains_key(folded)
            || self.directives.contains_key(folded)
            || self
                .syntax
                .origin
                .map_or(false, |origin| origin.open == folded || origin.close == folded)
    }
}

/// Everything an encoder may consult.
pub struct EncodeCtx<'a> {
    /// Case-folded mnemonic or directive name of the statement.
    pub op: &'a str,
    pub operands: &'a [Operand],
    /// Address of the statement's first word.
    pub addr: Word,
    pub line: u32,
    pub word_bits: u8,
    pub regs: &'a RegisterSet,
    pub symbols: &'a SymbolTable,
}

impl EncodeCtx<'_> {
    /// Register number of operand `idx`.
    pub fn reg(&self, idx: usize) -> Result<Word, SemanticError> {
        let Some(Operand::Reg { prefix, name }) = self.operands.get(idx) else {
            return Err(self.shape_err());
        };
        self.regs
            .resolve(name)
            .ok_or_else(|| SemanticError::BadRegister {
                name: format!("{prefix}{name}"),
                line: self.line,
            })
    }

    /// Integer value of operand `idx`.
    pub fn int(&self, idx: usize) -> Result<i64, SemanticError> {
        match self.operands.get(idx) {
            Some(Operand::Int(value)) => Ok(*value),
            _ => Err(self.shape_err()),
        }
    }

    /// String contents of operand `idx`.
    pub fn string(&self, idx: usize) -> Result<&str, SemanticError> {
        match self.operands.get(idx) {
            Some(Operand::Str(contents)) => Ok(contents),
            _ => Err(self.shape_err()),
        }
    }

    /// Absolute address of a label.
    pub fn lookup(&self, name: &str) -> Result<Word, SemanticError> {
        self.symbols
            .lookup(name)
            .ok_or_else(|| SemanticError::UnresolvedLabel {
                label: name.to_string(),
                line: self.line,
            })
    }

    /// PC-relative offset field: a label resolves to
    /// `target - (addr + 1)`, an integer is the offset itself. Range-checked
    /// as a signed `bits`-wide field.
    pub fn pc_offset(&self, idx: usize, bits: u8) -> Result<Word, SemanticError> {
        match self.operands.get(idx) {
            Some(Operand::Label(name)) => {
                let target = self.lookup(name)?;
                let offset = i64::from(target) - (i64::from(self.addr) + 1);
                fit_signed(offset, bits, self.line)
            }
            Some(Operand::Int(value)) => fit_signed(*value, bits, self.line),
            _ => Err(self.shape_err()),
        }
    }

    /// Absolute value field: a label resolves to its address, an integer is
    /// taken verbatim. The caller applies its own range rule.
    pub fn absolute(&self, idx: usize) -> Result<i64, SemanticError> {
        match self.operands.get(idx) {
            Some(Operand::Label(name)) => Ok(i64::from(self.lookup(name)?)),
            Some(Operand::Int(value)) => Ok(*value),
            _ => Err(self.shape_err()),
        }
    }

    fn shape_err(&self) -> SemanticError {
        SemanticError::SignatureMismatch {
            op: self.op.to_string(),
            shape: shape_of(self.operands),
            line: self.line,
        }
    }
}

/// Find the table row whose signature exactly matches the operand list.
pub fn match_entry<'a>(entries: &'a [OpEntry], operands: &[Operand]) -> Option<&'a OpEntry> {
    entries.iter().find(|entry| {
        entry.sig.len() == operands.len()
            && entry
                .sig
                .iter()
                .zip(operands)
                .all(|(kind, operand)| kind.matches(operand))
    })
}

/// Human-readable operand shape, e.g. `reg, reg, imm`.
pub fn shape_of(operands: &[Operand]) -> String {
    if operands.is_empty() {
        return "none".to_string();
    }
    operands
        .iter()
        .map(|operand| match operand {
            Operand::Reg { .. } => "reg",
            Operand::Int(_) => "imm",
            Operand::Label(_) => "label",
            Operand::Str(_) => "string",
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn mask(bits: u8) -> u64 {
    (1u64 << bits) - 1
}

/// Fit a value into a signed `bits`-wide field, two's-complement masked.
pub fn fit_signed(value: i64, bits: u8, line: u32) -> Result<Word, SemanticError> {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    if value < min || value > max {
        return Err(SemanticError::OutOfRange {
            value,
            bits,
            kind: FieldKind::Signed,
            line,
        });
    }
    Ok((value as u64 & mask(bits)) as Word)
}

/// Fit a value into an unsigned `bits`-wide field. Negative values are
/// rejected outright, never wrapped.
pub fn fit_unsigned(value: i64, bits: u8, line: u32) -> Result<Word, SemanticError> {
    if value < 0 || value as u64 > mask(bits) {
        return Err(SemanticError::OutOfRange {
            value,
            bits,
            kind: FieldKind::Unsigned,
            line,
        });
    }
    Ok(value as Word)
}

/// Fit a raw data word: accepts the union of the signed and unsigned ranges
/// of a `bits`-wide word, sign-extending negative values into the field.
pub fn fit_word(value: i64, bits: u8, line: u32) -> Result<Word, SemanticError> {
    let min = -(1i64 << (bits - 1));
    let max = mask(bits) as i64;
    if value < min || value > max {
        return Err(SemanticError::OutOfRange {
            value,
            bits,
            kind: FieldKind::Signed,
            line,
        });
    }
    Ok((value as u64 & mask(bits)) as Word)
}
