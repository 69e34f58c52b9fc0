// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Object-file serializers.
//!
//! A serializer is a pure transform of an [`AssembledProgram`] into bytes;
//! no validation happens here, the resolver has already guaranteed a
//! structurally valid program. Writers live in a [`SerializerRegistry`]
//! constructed explicitly by the caller, never reached through a global.

use std::collections::HashMap;

use crate::core::assembler::AssembledProgram;

pub trait ObjectWriter: Send + Sync {
    /// Registry name of this format.
    fn format(&self) -> &'static str;
    fn write(&self, program: &AssembledProgram) -> Vec<u8>;
}

/// The binary container consumed by the external simulator. Layout, all
/// fields big-endian:
///
/// ```text
/// "OBJ1"  magic
/// u8      word bits
/// u8      address bits
/// u16     section count
/// per section:
///   u32   start address
///   u32   word count
///   words word_bits/8 bytes each
/// u32     symbol count
/// per symbol (sorted by name):
///   u16   name length
///   ...   name bytes (UTF-8)
///   u32   absolute address
/// ```
#[derive(Debug, Default)]
pub struct ComplxWriter;

impl ObjectWriter for ComplxWriter {
    fn format(&self) -> &'static str {
        "complx"
    }

    fn write(&self, program: &AssembledProgram) -> Vec<u8> {
        let word_bytes = usize::from(program.word_bits / 8);
        let mut out = Vec::new();
        out.extend_from_slice(b"OBJ1");
        out.push(program.word_bits);
        out.push(program.addr_bits);
        out.extend_from_slice(&(program.sections.len() as u16).to_be_bytes());
        for section in &program.sections {
            out.extend_from_slice(&section.start.to_be_bytes());
            out.extend_from_slice(&(section.words.len() as u32).to_be_bytes());
            for &word in &section.words {
                out.extend_from_slice(&word.to_be_bytes()[4 - word_bytes..]);
            }
        }
        out.extend_from_slice(&(program.symbols.len() as u32).to_be_bytes());
        for (name, addr) in program.symbols.iter() {
            out.extend_from_slice(&(name.len() as u16).to_be_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&addr.to_be_bytes());
        }
        out
    }
}

/// Text format: per section an `@xxxx` origin line followed by one hex word
/// per line, then one `name: xxxx` line per symbol in sorted order.
#[derive(Debug, Default)]
pub struct HexWriter;

impl ObjectWriter for HexWriter {
    fn format(&self) -> &'static str {
        "hex"
    }

    fn write(&self, program: &AssembledProgram) -> Vec<u8> {
        let addr_digits = usize::from(program.addr_bits / 4);
        let word_digits = usize::from(program.word_bits / 4);
        let mut out = String::new();
        for section in &program.sections {
            out.push_str(&format!("@{:0width$x}\n", section.start, width = addr_digits));
            for &word in &section.words {
                out.push_str(&format!("{word:0word_digits$x}\n"));
            }
        }
        for (name, addr) in program.symbols.iter() {
            out.push_str(&format!("{name}: {addr:0addr_digits$x}\n"));
        }
        out.into_bytes()
    }
}

/// Named object-file formats, defaults included via [`Self::with_defaults`].
pub struct SerializerRegistry {
    writers: HashMap<&'static str, Box<dyn ObjectWriter>>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self {
            writers: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ComplxWriter));
        registry.register(Box::new(HexWriter));
        registry
    }

    pub fn register(&mut self, writer: Box<dyn ObjectWriter>) {
        self.writers.insert(writer.format(), writer);
    }

    pub fn get(&self, format: &str) -> Option<&dyn ObjectWriter> {
        self.writers.get(format).map(|writer| writer.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.writers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
