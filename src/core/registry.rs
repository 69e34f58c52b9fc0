// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Named ISA lookup.
//!
//! Each call builds a fresh immutable [`IsaSpec`]; nothing is cached in
//! globals, so independently constructed assemblers never share state.

use thiserror::Error;

use crate::isa::{lc2200, lc3, IsaSpec};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ISA '{0}'")]
pub struct UnknownIsa(pub String);

/// Names accepted by [`get_isa`], for CLI help text.
pub fn isa_names() -> &'static [&'static str] {
    &["lc3", "lc2200"]
}

/// Build the descriptor for a named ISA.
pub fn get_isa(name: &str) -> Result<IsaSpec, UnknownIsa> {
    match name.to_ascii_lowercase().as_str() {
        "lc3" | "lc-3" => Ok(lc3::isa()),
        "lc2200" | "lc-2200" => Ok(lc2200::isa()),
        _ => Err(UnknownIsa(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{get_isa, isa_names};

    #[test]
    fn known_names_resolve_case_insensitively() {
        assert_eq!(get_isa("lc3").expect("lc3").name, "lc3");
        assert_eq!(get_isa("LC-3").expect("lc-3").name, "lc3");
        assert_eq!(get_isa("lc2200").expect("lc2200").name, "lc2200");
        assert_eq!(get_isa("LC2200").expect("LC2200").name, "lc2200");
    }

    #[test]
    fn unknown_names_fail_loudly() {
        let err = get_isa("pdp11").expect_err("unknown");
        assert_eq!(err.to_string(), "unknown ISA 'pdp11'");
    }

    #[test]
    fn every_listed_name_resolves() {
        for name in isa_names() {
            assert!(get_isa(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn descriptors_differ_where_the_isas_do() {
        let lc3 = get_isa("lc3").expect("lc3");
        let lc2200 = get_isa("lc2200").expect("lc2200");
        assert_eq!(lc3.word_bits, 16);
        assert_eq!(lc2200.word_bits, 32);
        assert!(lc3.syntax.origin.is_some());
        assert!(lc2200.syntax.origin.is_none());
        assert_eq!(lc3.syntax.label_terminator, None);
        assert_eq!(lc2200.syntax.label_terminator, Some(':'));
    }
}
