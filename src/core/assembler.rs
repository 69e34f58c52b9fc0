// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Two-pass resolver and encoder.
//!
//! Pass 1 walks sections in declaration order, sizes every statement from
//! the ISA table, assigns label addresses, and checks section ranges. Pass 2
//! re-walks with the completed symbol table and invokes each table entry's
//! encoder. Forward and cross-section references need no special handling:
//! encoding depends only on addresses, never on another statement's encoded
//! words.

use log::debug;

use crate::core::error::{AsmError, SemanticError, SyntaxError};
use crate::core::parser::{Operand, ParsedProgram, Parser, Statement};
use crate::core::symbol_table::SymbolTable;
use crate::isa::{match_entry, shape_of, EncodeCtx, IsaSpec, OpEntry, SizeRule, Word};

/// One resolved section: start address and encoded machine words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub start: Word,
    pub words: Vec<Word>,
}

/// Final assembly result, immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledProgram {
    pub word_bits: u8,
    pub addr_bits: u8,
    pub symbols: SymbolTable,
    pub sections: Vec<Section>,
}

/// Assembler for one ISA. Holds only the immutable descriptor, so a single
/// instance may serve any number of concurrent calls.
pub struct Assembler {
    isa: IsaSpec,
}

struct Layout {
    starts: Vec<Word>,
    ends: Vec<u64>,
    addrs: Vec<Vec<Word>>,
    symbols: SymbolTable,
}

impl Assembler {
    pub fn new(isa: IsaSpec) -> Self {
        Self { isa }
    }

    pub fn isa(&self) -> &IsaSpec {
        &self.isa
    }

    pub fn parse(&self, source: &str) -> Result<ParsedProgram, SyntaxError> {
        Parser::new(&self.isa).parse(source)
    }

    pub fn assemble(&self, source: &str) -> Result<AssembledProgram, AsmError> {
        let program = self.parse(source)?;
        let layout = self.pass1(&program)?;
        let sections = self.pass2(&program, &layout)?;
        Ok(AssembledProgram {
            word_bits: self.isa.word_bits,
            addr_bits: self.isa.addr_bits,
            symbols: layout.symbols,
            sections,
        })
    }

    fn pass1(&self, program: &ParsedProgram) -> Result<Layout, SemanticError> {
        let limit = 1u64 << self.isa.addr_bits;
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        let mut addrs = Vec::new();

        for section in &program.sections {
            if section.start < 0 || section.start as u64 >= limit {
                return Err(SemanticError::OutOfRange {
                    value: section.start,
                    bits: self.isa.addr_bits,
                    kind: crate::core::error::FieldKind::Unsigned,
                    line: section.line,
                });
            }
            let start = section.start as u64;
            let mut cursor = start;
            let mut stmt_addrs = Vec::with_capacity(section.stmts.len());
            for stmt in &section.stmts {
                let (entry, _, operands) = self.entry_for(stmt)?;
                let size = match entry.size {
                    SizeRule::Fixed(n) => n,
                    SizeRule::ByOperand(f) => f(operands, stmt.line())?,
                };
                stmt_addrs.push(cursor as Word);
                cursor += u64::from(size);
                if cursor > limit {
                    return Err(SemanticError::SectionOverflow {
                        start: start as Word,
                    });
                }
            }
            starts.push(start as Word);
            ends.push(cursor);
            addrs.push(stmt_addrs);
        }

        let mut symbols = SymbolTable::new();
        for (label, &(section, index)) in &program.labels {
            let addr = addrs[section]
                .get(index)
                .copied()
                .unwrap_or(ends[section] as Word);
            symbols.define(label, addr);
        }

        // Ranges are half-open; empty sections cannot collide.
        for i in 0..starts.len() {
            for j in i + 1..starts.len() {
                let (a, b) = (u64::from(starts[i]), u64::from(starts[j]));
                if ends[i] == a || ends[j] == b {
                    continue;
                }
                if a < ends[j] && b < ends[i] {
                    return Err(SemanticError::SectionOverlap {
                        a: starts[i],
                        b: starts[j],
                    });
                }
            }
        }

        debug!(
            "pass 1: {} sections, {} symbols",
            starts.len(),
            symbols.len()
        );
        Ok(Layout {
            starts,
            ends,
            addrs,
            symbols,
        })
    }

    fn pass2(
        &self,
        program: &ParsedProgram,
        layout: &Layout,
    ) -> Result<Vec<Section>, SemanticError> {
        let mut sections = Vec::with_capacity(program.sections.len());
        for (index, section) in program.sections.iter().enumerate() {
            let size = (layout.ends[index] - u64::from(layout.starts[index])) as usize;
            let mut words = Vec::with_capacity(size);
            for (stmt_index, stmt) in section.stmts.iter().enumerate() {
                let (entry, op, operands) = self.entry_for(stmt)?;
                let ctx = EncodeCtx {
                    op,
                    operands,
                    addr: layout.addrs[index][stmt_index],
                    line: stmt.line(),
                    word_bits: self.isa.word_bits,
                    regs: &self.isa.regs,
                    symbols: &layout.symbols,
                };
                words.extend((entry.encode)(&ctx)?);
            }
            sections.push(Section {
                start: layout.starts[index],
                words,
            });
        }
        debug!(
            "pass 2: {} words encoded",
            sections.iter().map(|s| s.words.len()).sum::<usize>()
        );
        Ok(sections)
    }

    /// Match a statement against the ISA table, with the distinct unknown
    /// and shape-mismatch errors of each statement kind.
    fn entry_for<'s>(
        &'s self,
        stmt: &'s Statement,
    ) -> Result<(&'s OpEntry, &'s str, &'s [Operand]), SemanticError> {
        match stmt {
            Statement::Instr { line, op, operands } => {
                let entries =
                    self.isa
                        .ops
                        .get(op.as_str())
                        .ok_or_else(|| SemanticError::UnknownOp {
                            op: op.clone(),
                            line: *line,
                        })?;
                let entry = match_entry(entries, operands).ok_or_else(|| {
                    SemanticError::SignatureMismatch {
                        op: op.clone(),
                        shape: shape_of(operands),
                        line: *line,
                    }
                })?;
                Ok((entry, op, operands))
            }
            Statement::PseudoOp { line, op, operand } => {
                let entries = self
                    .isa
                    .directives
                    .get(op.as_str())
                    .ok_or_else(|| unknown_directive(op, operand, *line))?;
                let operands = operand.as_ref().map(std::slice::from_ref).unwrap_or(&[]);
                let entry = match_entry(entries, operands).ok_or_else(|| {
                    SemanticError::SignatureMismatch {
                        op: op.clone(),
                        shape: shape_of(operands),
                        line: *line,
                    }
                })?;
                Ok((entry, op, operands))
            }
        }
    }
}

/// A misspelled directive fails with the attempted operand shape visible.
fn unknown_directive(op: &str, operand: &Option<Operand>, line: u32) -> SemanticError {
    match operand {
        Some(Operand::Int(value)) => SemanticError::UnknownDirectiveInt {
            op: op.to_string(),
            value: *value,
            line,
        },
        Some(Operand::Str(text)) => SemanticError::UnknownDirectiveStr {
            op: op.to_string(),
            text: text.clone(),
            line,
        },
        _ => SemanticError::UnknownDirective {
            op: op.to_string(),
            line,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::Assembler;
    use crate::core::error::{AsmError, SemanticError};
    use crate::core::registry::get_isa;

    fn assembler(isa: &str) -> Assembler {
        Assembler::new(get_isa(isa).expect("isa"))
    }

    fn semantic(err: AsmError) -> SemanticError {
        match err {
            AsmError::Semantic(err) => err,
            AsmError::Syntax(err) => panic!("expected semantic error, got {err}"),
        }
    }

    #[test]
    fn halt_program_matches_the_reference_layout() {
        let prog = assembler("lc3")
            .assemble(".orig x3000\nhalt\n.end\n")
            .expect("assemble");
        assert!(prog.symbols.is_empty());
        assert_eq!(prog.sections.len(), 1);
        assert_eq!(prog.sections[0].start, 0x3000);
        assert_eq!(prog.sections[0].words, vec![0xf025]);
        assert_eq!(prog.word_bits, 16);
    }

    #[test]
    fn self_branch_resolves_to_minus_one() {
        let prog = assembler("lc3")
            .assemble(".orig x3000\nfun\nbr fun\n.end\n")
            .expect("assemble");
        assert_eq!(prog.symbols.lookup("fun"), Some(0x3000));
        assert_eq!(prog.sections[0].words, vec![0x0fff]);
    }

    #[test]
    fn string_labels_sit_at_their_word_offset() {
        let prog = assembler("lc3")
            .assemble(".orig x3000\nhalt\nmystring .stringz \"hi\"\n.end\n")
            .expect("assemble");
        assert_eq!(prog.symbols.lookup("mystring"), Some(0x3001));
        assert_eq!(prog.sections[0].words, vec![0xf025, 0x68, 0x69, 0]);
    }

    #[test]
    fn assembly_is_deterministic() {
        let source = ".orig x3000\nfun add r0, r0, #1\nbr fun\n.fill fun\n.end\n";
        let a = assembler("lc3").assemble(source).expect("assemble");
        let b = assembler("lc3").assemble(source).expect("assemble");
        assert_eq!(a, b);
    }

    #[test]
    fn mnemonic_case_never_matters() {
        let lower = assembler("lc3")
            .assemble(".orig x3000\nadd r0, r0, #1\n.end\n")
            .expect("assemble");
        let upper = assembler("lc3")
            .assemble(".ORIG x3000\nADD R0, R0, #1\n.END\n")
            .expect("assemble");
        let mixed = assembler("lc3")
            .assemble(".Orig x3000\nAdd r0, R0, #1\n.End\n")
            .expect("assemble");
        assert_eq!(lower, upper);
        assert_eq!(lower, mixed);
    }

    #[test]
    fn label_case_is_preserved_and_distinct() {
        let prog = assembler("lc3")
            .assemble(".orig x3000\nFun halt\nfun halt\n.end\n")
            .expect("assemble");
        assert_eq!(prog.symbols.lookup("Fun"), Some(0x3000));
        assert_eq!(prog.symbols.lookup("fun"), Some(0x3001));
    }

    #[test]
    fn cross_section_references_resolve() {
        let prog = assembler("lc3")
            .assemble(
                ".orig x3000\n.fill far\n.end\n.orig x4000\nfar halt\n.end\n",
            )
            .expect("assemble");
        assert_eq!(prog.sections[0].words, vec![0x4000]);
        assert_eq!(prog.symbols.lookup("far"), Some(0x4000));
    }

    #[test]
    fn unresolved_label_names_the_label() {
        let err = assembler("lc3")
            .assemble(".orig x3000\nbr nowhere\n.end\n")
            .expect_err("unresolved");
        let text = err.to_string();
        assert!(text.contains("nowhere"), "{text}");
        assert!(text.contains("line 2"), "{text}");
    }

    #[test]
    fn unknown_instruction_and_signature_mismatch() {
        let err = semantic(
            assembler("lc3")
                .assemble(".orig x3000\nfoo bar\n.end\n")
                .expect_err("unknown"),
        );
        assert!(matches!(err, SemanticError::UnknownOp { .. }), "{err}");

        let err = semantic(
            assembler("lc3")
                .assemble(".orig x3000\nadd r0, r0\n.end\n")
                .expect_err("shape"),
        );
        assert_eq!(
            err.to_string(),
            "line 2: 'add' does not accept operands (reg, reg)"
        );

        let err = semantic(
            assembler("lc3")
                .assemble(".orig x3000\nhalt r0\n.end\n")
                .expect_err("shape"),
        );
        assert!(err.to_string().contains("(reg)"), "{err}");
    }

    #[test]
    fn unknown_directive_reports_the_attempted_shape() {
        let asm = assembler("lc3");
        let err = semantic(
            asm.assemble(".orig x3000\n.wrod\n.end\n").expect_err("bare"),
        );
        assert_eq!(err.to_string(), "line 2: unknown directive '.wrod'");

        let err = semantic(
            asm.assemble(".orig x3000\n.wrod 5\n.end\n").expect_err("int"),
        );
        assert_eq!(err.to_string(), "line 2: unknown directive '.wrod' with value 5");

        let err = semantic(
            asm.assemble(".orig x3000\n.wrod \"hi\"\n.end\n")
                .expect_err("string"),
        );
        assert_eq!(
            err.to_string(),
            "line 2: unknown directive '.wrod' with string \"hi\""
        );
    }

    #[test]
    fn overlapping_sections_are_rejected() {
        let err = semantic(
            assembler("lc3")
                .assemble(
                    ".orig x3000\nhalt\nhalt\n.end\n.orig x3001\nhalt\n.end\n",
                )
                .expect_err("overlap"),
        );
        assert!(
            matches!(err, SemanticError::SectionOverlap { .. }),
            "{err}"
        );
    }

    #[test]
    fn disjoint_sections_keep_their_own_words_in_any_order() {
        let prog = assembler("lc3")
            .assemble(".orig x4000\ntrap x21\n.end\n.orig x3000\nhalt\n.end\n")
            .expect("assemble");
        assert_eq!(prog.sections.len(), 2);
        assert_eq!(prog.sections[0].start, 0x4000);
        assert_eq!(prog.sections[0].words, vec![0xf021]);
        assert_eq!(prog.sections[1].start, 0x3000);
        assert_eq!(prog.sections[1].words, vec![0xf025]);
    }

    #[test]
    fn empty_sections_never_collide() {
        let prog = assembler("lc3")
            .assemble(".orig x3000\n.end\n.orig x3000\nhalt\n.end\n")
            .expect("assemble");
        assert_eq!(prog.sections[0].words.len(), 0);
        assert_eq!(prog.sections[1].words, vec![0xf025]);
    }

    #[test]
    fn origin_must_fit_the_address_space() {
        let err = semantic(
            assembler("lc3")
                .assemble(".orig x10000\nhalt\n.end\n")
                .expect_err("origin"),
        );
        assert!(matches!(err, SemanticError::OutOfRange { .. }), "{err}");

        let err = semantic(
            assembler("lc3")
                .assemble(".orig xffff\nhalt\nhalt\n.end\n")
                .expect_err("overflow"),
        );
        assert!(
            matches!(err, SemanticError::SectionOverflow { .. }),
            "{err}"
        );
    }

    #[test]
    fn bad_registers_are_semantic_errors() {
        let err = semantic(
            assembler("lc3")
                .assemble(".orig x3000\nadd r0, r0, r9\n.end\n")
                .expect_err("register"),
        );
        assert_eq!(err.to_string(), "line 2: no such register 'r9'");
    }

    #[test]
    fn parse_alone_resolves_nothing() {
        // Forward references survive parsing; resolution is pass 2's job.
        let prog = assembler("lc3")
            .parse(".orig x3000\nbr nowhere\n.end\n")
            .expect("parse");
        assert_eq!(prog.sections[0].stmts.len(), 1);
    }

    #[test]
    fn lc2200_uses_the_implicit_section() {
        let prog = assembler("lc2200")
            .assemble("start: addi $t0, $zero, 1\nbeq $t0, $zero, start\nhalt\n")
            .expect("assemble");
        assert_eq!(prog.sections.len(), 1);
        assert_eq!(prog.sections[0].start, 0);
        assert_eq!(prog.symbols.lookup("start"), Some(0));
        assert_eq!(prog.word_bits, 32);
        assert_eq!(prog.sections[0].words.len(), 3);
    }
}
