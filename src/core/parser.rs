// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Statement parser driven by an ISA's grammar rules.
//!
//! The parser walks the token stream one line at a time, strips labels into
//! a label index, and builds ordered statements per section. Section
//! boundaries come from the ISA's origin syntax (`.orig`/`.end` blocks) or,
//! for ISAs without one, a single implicit section at address 0. Operand
//! validation here is syntactic only; signature and range checks belong to
//! the resolver, because label operands cannot be checked until addresses
//! are known.

use std::collections::HashMap;

use crate::core::error::SyntaxError;
use crate::core::tokenizer::{tokenize, Token, TokenKind};
use crate::isa::IsaSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Register reference; alias/number resolution happens at encode time.
    Reg { prefix: char, name: String },
    Int(i64),
    Label(String),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Instr {
        line: u32,
        op: String,
        operands: Vec<Operand>,
    },
    PseudoOp {
        line: u32,
        op: String,
        operand: Option<Operand>,
    },
}

impl Statement {
    pub fn line(&self) -> u32 {
        match self {
            Statement::Instr { line, .. } | Statement::PseudoOp { line, .. } => *line,
        }
    }
}

/// One section as parsed: declared start address and ordered statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSection {
    pub start: i64,
    pub line: u32,
    pub stmts: Vec<Statement>,
}

/// Immutable parse result. `labels` maps each label to the section and
/// statement index it was attached to; an index one past the last statement
/// means the label sits at the section's end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProgram {
    pub sections: Vec<ParsedSection>,
    pub labels: HashMap<String, (usize, usize)>,
}

pub struct Parser<'a> {
    isa: &'a IsaSpec,
    sections: Vec<ParsedSection>,
    open: Option<ParsedSection>,
    labels: HashMap<String, (usize, usize)>,
}

impl<'a> Parser<'a> {
    pub fn new(isa: &'a IsaSpec) -> Self {
        Self {
            isa,
            sections: Vec::new(),
            open: None,
            labels: HashMap::new(),
        }
    }

    pub fn parse(mut self, source: &str) -> Result<ParsedProgram, SyntaxError> {
        let tokens = tokenize(source, &self.isa.syntax, &self.isa.regs)?;
        if self.isa.syntax.origin.is_none() {
            self.open = Some(ParsedSection {
                start: 0,
                line: 1,
                stmts: Vec::new(),
            });
        }

        let mut current: Vec<Token> = Vec::new();
        for token in tokens {
            if token.kind == TokenKind::Newline {
                if !current.is_empty() {
                    let line_tokens = std::mem::take(&mut current);
                    self.parse_line(&line_tokens)?;
                }
                continue;
            }
            current.push(token);
        }
        if !current.is_empty() {
            self.parse_line(&current)?;
        }

        match self.open.take() {
            Some(section) if self.isa.syntax.origin.is_none() => self.sections.push(section),
            Some(_) => return Err(SyntaxError::MissingEnd),
            None => {}
        }
        Ok(ParsedProgram {
            sections: self.sections,
            labels: self.labels,
        })
    }

    fn parse_line(&mut self, tokens: &[Token]) -> Result<(), SyntaxError> {
        let line = tokens[0].line;
        let (label, consumed) = self.take_label(tokens);
        let rest = &tokens[consumed..];

        if let Some(origin) = self.isa.syntax.origin {
            if let Some(TokenKind::Word(word)) = rest.first().map(|t| &t.kind) {
                let folded = word.to_ascii_lowercase();
                if folded == origin.open {
                    return self.open_section(label, &folded, &rest[1..], line);
                }
                if folded == origin.close {
                    return self.close_section(label, &folded, &rest[1..], line);
                }
            }
        }

        if self.open.is_none() {
            if let Some(name) = label {
                return Err(SyntaxError::StrayLabel { text: name, line });
            }
            let Some(first) = rest.first() else {
                return Ok(());
            };
            return Err(match &first.kind {
                TokenKind::Word(word) if word.starts_with(self.isa.syntax.directive_marker) => {
                    SyntaxError::StrayDirective {
                        text: word.clone(),
                        line,
                    }
                }
                TokenKind::Word(word) => SyntaxError::StrayInstruction {
                    text: word.clone(),
                    line,
                },
                other => SyntaxError::UnexpectedToken {
                    found: other.text(),
                    line,
                },
            });
        }

        if let Some(name) = label {
            self.define_label(name, line)?;
        }

        let Some(first) = rest.first() else {
            // Label-only line.
            return Ok(());
        };
        match &first.kind {
            TokenKind::Word(word) if word.starts_with(self.isa.syntax.directive_marker) => {
                let op = word.to_ascii_lowercase();
                let operand = single_operand(&rest[1..], line)?;
                self.push_stmt(Statement::PseudoOp { line, op, operand });
                Ok(())
            }
            TokenKind::Word(word) => {
                let op = word.to_ascii_lowercase();
                let operands = operand_list(&rest[1..], line)?;
                self.push_stmt(Statement::Instr { line, op, operands });
                Ok(())
            }
            other => Err(SyntaxError::UnexpectedToken {
                found: other.text(),
                line,
            }),
        }
    }

    /// Strip a leading label. With a terminator, only a `Label` token counts.
    /// Without one, a leading word that is not a known mnemonic or directive
    /// is the label.
    fn take_label(&self, tokens: &[Token]) -> (Option<String>, usize) {
        match tokens.first().map(|t| &t.kind) {
            Some(TokenKind::Label(name)) => (Some(name.clone()), 1),
            Some(TokenKind::Word(word))
                if self.isa.syntax.label_terminator.is_none()
                    && !word.starts_with(self.isa.syntax.directive_marker)
                    && !self.isa.knows_word(&word.to_ascii_lowercase()) =>
            {
                (Some(word.clone()), 1)
            }
            _ => (None, 0),
        }
    }

    fn define_label(&mut self, name: String, line: u32) -> Result<(), SyntaxError> {
        let Some(open) = &self.open else {
            return Err(SyntaxError::StrayLabel { text: name, line });
        };
        if self.labels.contains_key(&name) {
            return Err(SyntaxError::DuplicateLabel { label: name, line });
        }
        let key = (self.sections.len(), open.stmts.len());
        self.labels.insert(name, key);
        Ok(())
    }

    fn push_stmt(&mut self, stmt: Statement) {
        if let Some(open) = &mut self.open {
            open.stmts.push(stmt);
        }
    }

    fn open_section(
        &mut self,
        label: Option<String>,
        directive: &str,
        rest: &[Token],
        line: u32,
    ) -> Result<(), SyntaxError> {
        if self.open.is_some() {
            return Err(SyntaxError::StrayDirective {
                text: directive.to_string(),
                line,
            });
        }
        if label.is_some() {
            return Err(SyntaxError::SectionLabel {
                directive: directive.to_string(),
                line,
            });
        }
        let Some(TokenKind::Int(start)) = rest.first().map(|t| &t.kind) else {
            return Err(SyntaxError::MissingAddress {
                directive: directive.to_string(),
                line,
            });
        };
        if let Some(extra) = rest.get(1) {
            return Err(SyntaxError::DanglingOperand {
                token: extra.kind.text(),
                line,
            });
        }
        self.open = Some(ParsedSection {
            start: *start,
            line,
            stmts: Vec::new(),
        });
        Ok(())
    }

    fn close_section(
        &mut self,
        label: Option<String>,
        directive: &str,
        rest: &[Token],
        line: u32,
    ) -> Result<(), SyntaxError> {
        if label.is_some() {
            return Err(SyntaxError::SectionLabel {
                directive: directive.to_string(),
                line,
            });
        }
        if !rest.is_empty() {
            return Err(SyntaxError::SectionOperand {
                directive: directive.to_string(),
                line,
            });
        }
        match self.open.take() {
            Some(section) => {
                self.sections.push(section);
                Ok(())
            }
            None => Err(SyntaxError::StrayDirective {
                text: directive.to_string(),
                line,
            }),
        }
    }
}

fn single_operand(tokens: &[Token], line: u32) -> Result<Option<Operand>, SyntaxError> {
    let Some(first) = tokens.first() else {
        return Ok(None);
    };
    let operand = operand_from(first)?;
    if let Some(extra) = tokens.get(1) {
        return Err(SyntaxError::DanglingOperand {
            token: extra.kind.text(),
            line,
        });
    }
    Ok(Some(operand))
}

fn operand_list(tokens: &[Token], line: u32) -> Result<Vec<Operand>, SyntaxError> {
    let mut operands = Vec::new();
    if tokens.is_empty() {
        return Ok(operands);
    }
    let mut index = 0usize;
    loop {
        let Some(token) = tokens.get(index) else {
            return Err(SyntaxError::UnexpectedToken {
                found: "end of line".to_string(),
                line,
            });
        };
        operands.push(operand_from(token)?);
        index += 1;
        match tokens.get(index) {
            None => break,
            Some(Token {
                kind: TokenKind::Comma,
                ..
            }) => index += 1,
            Some(extra) => {
                return Err(SyntaxError::DanglingOperand {
                    token: extra.kind.text(),
                    line,
                })
            }
        }
    }
    Ok(operands)
}

fn operand_from(token: &Token) -> Result<Operand, SyntaxError> {
    match &token.kind {
        TokenKind::Word(word) => Ok(Operand::Label(word.clone())),
        TokenKind::Register(text) => {
            let mut chars = text.chars();
            match chars.next() {
                Some(prefix) => Ok(Operand::Reg {
                    prefix,
                    name: chars.collect(),
                }),
                None => Err(SyntaxError::UnexpectedToken {
                    found: text.clone(),
                    line: token.line,
                }),
            }
        }
        TokenKind::Int(value) => Ok(Operand::Int(*value)),
        TokenKind::Str(contents) => Ok(Operand::Str(contents.clone())),
        other => Err(SyntaxError::UnexpectedToken {
            found: other.text(),
            line: token.line,
        }),
    }
}
