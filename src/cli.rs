// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface: thin argument dispatch around the library.

use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::info;

use crate::core::assembler::Assembler;
use crate::core::objfile::SerializerRegistry;
use crate::core::registry::{get_isa, isa_names};

#[derive(Parser, Debug)]
#[command(
    name = "isaforge",
    version,
    about = "Two-pass assembler for small teaching ISAs"
)]
pub struct Cli {
    /// Input assembly file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    #[arg(
        short = 'a',
        long = "isa",
        value_name = "NAME",
        default_value = "lc3",
        long_help = "Target ISA. One of: lc3, lc2200."
    )]
    pub isa: String,
    #[arg(
        short = 'f',
        long = "format",
        value_name = "NAME",
        default_value = "complx",
        long_help = "Object-file format. One of: complx, hex."
    )]
    pub format: String,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        long_help = "Output file. Defaults to the input path with a .obj extension."
    )]
    pub output: Option<PathBuf>,
    #[arg(
        short = 's',
        long = "symbols",
        action = ArgAction::SetTrue,
        long_help = "Print the symbol table to stdout after assembling."
    )]
    pub symbols: bool,
    /// Raise log verbosity (repeatable).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

pub fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let isa = get_isa(&cli.isa)
        .map_err(|err| format!("{err} (expected one of: {})", isa_names().join(", ")))?;
    let source = fs::read_to_string(&cli.input)
        .map_err(|err| format!("unable to read '{}': {err}", cli.input.display()))?;

    let assembler = Assembler::new(isa);
    let program = assembler.assemble(&source)?;

    let registry = SerializerRegistry::with_defaults();
    let writer = registry.get(cli.format.as_str()).ok_or_else(|| {
        format!(
            "unknown object format '{}' (expected one of: {})",
            cli.format,
            registry.names().join(", ")
        )
    })?;
    let bytes = writer.write(&program);

    let out_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("obj"));
    fs::write(&out_path, &bytes)
        .map_err(|err| format!("unable to write '{}': {err}", out_path.display()))?;
    info!("wrote {} bytes to {}", bytes.len(), out_path.display());

    if cli.symbols {
        program.symbols.dump(io::stdout().lock())?;
    }
    Ok(())
}
