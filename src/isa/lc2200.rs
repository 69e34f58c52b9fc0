// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! LC-2200 descriptor: 32-bit words, sixteen aliased registers, one implicit
//! section at address 0, `!` comments, colon-terminated labels.
//!
//! Instruction layout: opcode in bits 31..28, RX in 27..24, RY in 23..20,
//! RZ in 3..0, immediates in 19..0.

use std::collections::HashMap;

use crate::core::error::SemanticError;
use crate::core::parser::Operand;
use crate::isa::OperandKind::{Addr, Imm, Reg, Str};
use crate::isa::{
    fit_signed, fit_unsigned, fit_word, EncodeCtx, EncodeFn, IsaSpec, OpEntry, OperandKind,
    RegisterSet, SizeRule, Syntax, Word,
};

const WORD_BITS: u8 = 32;
const ONE: SizeRule = SizeRule::Fixed(1);

static ALIASES: &[(&str, Word)] = &[
    ("zero", 0),
    ("at", 1),
    ("v0", 2),
    ("a0", 3),
    ("a1", 4),
    ("a2", 5),
    ("t0", 6),
    ("t1", 7),
    ("t2", 8),
    ("s0", 9),
    ("s1", 10),
    ("s2", 11),
    ("k0", 12),
    ("sp", 13),
    ("fp", 14),
    ("ra", 15),
];

type Row = (&'static str, &'static [OperandKind], SizeRule, EncodeFn);

static OPS: &[Row] = &[
    ("add", &[Reg, Reg, Reg], ONE, enc_reg3),
    ("nand", &[Reg, Reg, Reg], ONE, enc_reg3),
    ("addi", &[Reg, Reg, Imm], ONE, enc_addi),
    ("lw", &[Reg, Reg, Imm], ONE, enc_mem),
    ("sw", &[Reg, Reg, Imm], ONE, enc_mem),
    ("beq", &[Reg, Reg, Addr], ONE, enc_beq),
    ("jalr", &[Reg, Reg], ONE, enc_jalr),
    ("halt", &[], ONE, enc_halt),
];

static DIRECTIVES: &[Row] = &[
    (".word", &[Addr], ONE, dir_word),
    (".blkw", &[Imm], SizeRule::ByOperand(size_blkw), dir_blkw),
    (".stringz", &[Str], SizeRule::ByOperand(size_stringz), dir_stringz),
];

/// Build the LC-2200 descriptor.
pub fn isa() -> IsaSpec {
    IsaSpec {
        name: "lc2200",
        word_bits: WORD_BITS,
        addr_bits: 32,
        regs: RegisterSet {
            prefix: '$',
            count: 16,
            aliases: ALIASES,
        },
        ops: build(OPS),
        directives: build(DIRECTIVES),
        syntax: Syntax {
            comment_char: '!',
            directive_marker: '.',
            label_terminator: Some(':'),
            immediate_prefixes: &[],
            origin: None,
        },
    }
}

fn build(rows: &[Row]) -> HashMap<&'static str, Vec<OpEntry>> {
    let mut table: HashMap<&'static str, Vec<OpEntry>> = HashMap::new();
    for &(name, sig, size, encode) in rows {
        table
            .entry(name)
            .or_default()
            .push(OpEntry { sig, size, encode });
    }
    table
}

fn opcode(op: &str) -> Word {
    let code: Word = match op {
        "add" => 0x0,
        "nand" => 0x1,
        "addi" => 0x2,
        "lw" => 0x3,
        "sw" => 0x4,
        "beq" => 0x5,
        "jalr" => 0x6,
        "halt" => 0x7,
        _ => unreachable!("table routes only lc2200 mnemonics here"),
    };
    code << 28
}

fn enc_reg3(ctx: &EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError> {
    Ok(vec![
        opcode(ctx.op) | ctx.reg(0)? << 24 | ctx.reg(1)? << 20 | ctx.reg(2)?,
    ])
}

fn enc_addi(ctx: &EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError> {
    let imm = fit_signed(ctx.int(2)?, 20, ctx.line)?;
    Ok(vec![opcode(ctx.op) | ctx.reg(0)? << 24 | ctx.reg(1)? << 20 | imm])
}

fn enc_mem(ctx: &EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError> {
    let offset = fit_signed(ctx.int(2)?, 20, ctx.line)?;
    Ok(vec![
        opcode(ctx.op) | ctx.reg(0)? << 24 | ctx.reg(1)? << 20 | offset,
    ])
}

fn enc_beq(ctx: &EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError> {
    let offset = ctx.pc_offset(2, 20)?;
    Ok(vec![
        opcode(ctx.op) | ctx.reg(0)? << 24 | ctx.reg(1)? << 20 | offset,
    ])
}

fn enc_jalr(ctx: &EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError> {
    Ok(vec![opcode(ctx.op) | ctx.reg(0)? << 24 | ctx.reg(1)? << 20])
}

fn enc_halt(ctx: &EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError> {
    Ok(vec![opcode(ctx.op)])
}

fn dir_word(ctx: &EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError> {
    Ok(vec![fit_word(ctx.absolute(0)?, WORD_BITS, ctx.line)?])
}

fn size_blkw(operands: &[Operand], line: u32) -> Result<Word, SemanticError> {
    let Some(&Operand::Int(count)) = operands.first() else {
        return Ok(0);
    };
    fit_unsigned(count, 32, line)
}

fn dir_blkw(ctx: &EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError> {
    let count = fit_unsigned(ctx.int(0)?, 32, ctx.line)?;
    Ok(vec![0; count as usize])
}

fn size_stringz(operands: &[Operand], _line: u32) -> Result<Word, SemanticError> {
    let Some(Operand::Str(contents)) = operands.first() else {
        return Ok(0);
    };
    Ok(contents.chars().count() as Word + 1)
}

fn dir_stringz(ctx: &EncodeCtx<'_>) -> Result<Vec<Word>, SemanticError> {
    let mut words = Vec::new();
    for c in ctx.string(0)?.chars() {
        words.push(fit_unsigned(c as i64, WORD_BITS, ctx.line)?);
    }
    words.push(0);
    Ok(words)
}
