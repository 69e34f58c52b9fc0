// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Maximal-munch tokenizer driving all automata in parallel.
//!
//! Every automaton is raced over the same input position one character at a
//! time. Once no contender is alive, the automaton with the greatest
//! accepting length wins; ties go to the earlier entry in the declaration
//! order, so the integer automata beat the identifier automaton for input
//! like `3`. Whitespace and comments win races like any other automaton but
//! emit nothing.

use crate::core::chars::is_digit;
use crate::core::dfa::{
    Automaton, CharLitDfa, CommaDfa, CommentDfa, DecimalDfa, DirectiveDfa, HexDfa, IdentDfa,
    LabelDfa, RegisterBody, RegisterDfa, StringDfa, WhitespaceDfa,
};
use crate::core::error::SyntaxError;
use crate::isa::{RegisterSet, Syntax};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Label declaration via the ISA's terminator character; the terminator
    /// is stripped and the case preserved.
    Label(String),
    /// Mnemonic, directive, or bare identifier, case preserved verbatim.
    Word(String),
    /// Register text including its prefix, e.g. `r3` or `$zero`.
    Register(String),
    Int(i64),
    Str(String),
    Comma,
    Newline,
}

impl TokenKind {
    /// Token text for error messages.
    pub fn text(&self) -> String {
        match self {
            TokenKind::Label(name) => name.clone(),
            TokenKind::Word(word) => word.clone(),
            TokenKind::Register(reg) => reg.clone(),
            TokenKind::Int(value) => value.to_string(),
            TokenKind::Str(contents) => format!("\"{contents}\""),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Newline => "newline".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

/// Tokenize a whole source text under an ISA's syntax rules.
pub fn tokenize(
    source: &str,
    syntax: &Syntax,
    regs: &RegisterSet,
) -> Result<Vec<Token>, SyntaxError> {
    let chars: Vec<char> = source.chars().collect();
    let mut automata = build_automata(syntax, regs);
    let mut tokens = Vec::new();
    let mut line: u32 = 1;
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];
        if c == '\n' {
            tokens.push(Token {
                kind: TokenKind::Newline,
                line,
            });
            line += 1;
            pos += 1;
            continue;
        }
        if c == '\r' {
            pos += 1;
            continue;
        }
        if syntax.immediate_prefixes.contains(&c) && starts_literal(chars.get(pos + 1)) {
            pos += 1;
            continue;
        }

        for automaton in automata.iter_mut() {
            automaton.reset();
        }
        let mut offset = 0usize;
        loop {
            let Some(&next) = chars.get(pos + offset) else {
                break;
            };
            let mut any_alive = false;
            for automaton in automata.iter_mut() {
                if automaton.is_alive() && automaton.feed(next) {
                    any_alive = true;
                }
            }
            if !any_alive {
                break;
            }
            offset += 1;
        }

        let mut best_len = 0usize;
        let mut winner = None;
        for (index, automaton) in automata.iter().enumerate() {
            let len = automaton.accepting_len();
            if len > best_len {
                best_len = len;
                winner = Some(index);
            }
        }
        let Some(index) = winner else {
            return Err(SyntaxError::UnknownChar { ch: c, line });
        };
        if let Some(token) = automata[index].emit(line) {
            tokens.push(token);
        }
        pos += best_len;
    }

    Ok(tokens)
}

/// The fixed declaration order doubles as the tie-break priority.
fn build_automata(syntax: &Syntax, regs: &RegisterSet) -> Vec<Box<dyn Automaton>> {
    let mut automata: Vec<Box<dyn Automaton>> = vec![
        Box::new(WhitespaceDfa::new()),
        Box::new(CommentDfa::new(syntax.comment_char)),
    ];
    if let Some(terminator) = syntax.label_terminator {
        automata.push(Box::new(LabelDfa::new(terminator)));
    }
    let body = if regs.aliases.is_empty() {
        RegisterBody::Digits
    } else {
        RegisterBody::WordChars
    };
    automata.push(Box::new(RegisterDfa::new(regs.prefix, body)));
    automata.push(Box::new(HexDfa::new()));
    automata.push(Box::new(DecimalDfa::new()));
    automata.push(Box::new(CharLitDfa::new()));
    automata.push(Box::new(StringDfa::new()));
    automata.push(Box::new(DirectiveDfa::new(syntax.directive_marker)));
    automata.push(Box::new(CommaDfa::new()));
    automata.push(Box::new(IdentDfa::new()));
    automata
}

fn starts_literal(c: Option<&char>) -> bool {
    matches!(c, Some(&c) if is_digit(c) || c == '+' || c == '-' || c == 'x' || c == 'X')
}

#[cfg(test)]
mod tests {
    use super::{tokenize, TokenKind};
    use crate::core::registry::get_isa;

    fn kinds(isa: &str, source: &str) -> Vec<TokenKind> {
        let isa = get_isa(isa).expect("isa");
        tokenize(source, &isa.syntax, &isa.regs)
            .expect("tokens")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_an_instruction_line() {
        let toks = kinds("lc3", "ADD R0, r1, #-5 ; comment");
        assert_eq!(
            toks,
            vec![
                TokenKind::Word("ADD".to_string()),
                TokenKind::Register("R0".to_string()),
                TokenKind::Comma,
                TokenKind::Register("r1".to_string()),
                TokenKind::Comma,
                TokenKind::Int(-5),
            ]
        );
    }

    #[test]
    fn maximal_munch_prefers_the_longest_match() {
        // "r2d2" is longer as an identifier than as register "r2".
        let toks = kinds("lc3", "r2d2 r2");
        assert_eq!(
            toks,
            vec![
                TokenKind::Word("r2d2".to_string()),
                TokenKind::Register("r2".to_string()),
            ]
        );
    }

    #[test]
    fn ties_prefer_integer_over_identifier() {
        let toks = kinds("lc3", "3");
        assert_eq!(toks, vec![TokenKind::Int(3)]);
    }

    #[test]
    fn hex_and_char_literals_become_integers() {
        let toks = kinds("lc3", "x3000 'a' '\\n'");
        assert_eq!(
            toks,
            vec![
                TokenKind::Int(0x3000),
                TokenKind::Int('a' as i64),
                TokenKind::Int(10),
            ]
        );
    }

    #[test]
    fn immediate_prefix_is_consumed_before_literals() {
        let toks = kinds("lc3", "#5 #x10 #-3");
        assert_eq!(
            toks,
            vec![TokenKind::Int(5), TokenKind::Int(0x10), TokenKind::Int(-3)]
        );
    }

    #[test]
    fn newlines_count_lines() {
        let isa = get_isa("lc3").expect("isa");
        let toks = tokenize("a\nb\nc", &isa.syntax, &isa.regs).expect("tokens");
        assert_eq!(toks.len(), 5);
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[2].line, 2);
        assert_eq!(toks[4].line, 3);
    }

    #[test]
    fn comments_are_never_tokens() {
        let toks = kinds("lc3", "halt ; stop here, please\n");
        assert_eq!(
            toks,
            vec![TokenKind::Word("halt".to_string()), TokenKind::Newline]
        );
    }

    #[test]
    fn unknown_character_is_a_lexical_error() {
        let isa = get_isa("lc3").expect("isa");
        let err = tokenize("add @", &isa.syntax, &isa.regs).expect_err("error");
        let text = err.to_string();
        assert!(text.contains('@'), "{text}");
        assert!(text.contains("line 1"), "{text}");
    }

    #[test]
    fn lc2200_labels_registers_and_comments() {
        let toks = kinds("lc2200", "loop: beq $t0, $zero, loop ! spin");
        assert_eq!(
            toks,
            vec![
                TokenKind::Label("loop".to_string()),
                TokenKind::Word("beq".to_string()),
                TokenKind::Register("$t0".to_string()),
                TokenKind::Comma,
                TokenKind::Register("$zero".to_string()),
                TokenKind::Comma,
                TokenKind::Word("loop".to_string()),
            ]
        );
    }

    #[test]
    fn strings_keep_escapes_decoded() {
        let toks = kinds("lc3", ".stringz \"hi\\n\"");
        assert_eq!(
            toks,
            vec![
                TokenKind::Word(".stringz".to_string()),
                TokenKind::Str("hi\n".to_string()),
            ]
        );
    }
}
