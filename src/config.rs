//! Process-wide configuration populated once at startup from environment
//! variables.
//!
//! No config/envy-style crate appears anywhere in the retrieval pack for a
//! handful of boolean flags, so this stays a plain struct read with
//! `std::env::var` rather than a configuration framework.

use std::env;

const OPTIMIZE_VAR: &str = "KALEIDOSCOPE_OPTIMIZE";
const KEEP_IR_VAR: &str = "KALEIDOSCOPE_KEEP_IR";
const DEBUG_INFO_VAR: &str = "KALEIDOSCOPE_DEBUG_INFO";

/// The three recognized flags: whether a code-gen collaborator should
/// optimize the IR it emits, whether it should keep the intermediate
/// textual IR alongside the object file, and whether it should emit debug
/// metadata. This crate does not act on any of them itself, since it has no
/// code-gen, but reads them once so `main.rs` and any code-gen collaborator
/// share one parsed record instead of each calling `std::env::var`
/// separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub optimize: bool,
    pub keep_intermediate_ir: bool,
    pub emit_debug_info: bool,
}

impl Config {
    /// Reads all three flags from the process environment. A variable
    /// counts as set (true) for any value other than absent, empty, or
    /// `"0"`; this matches the usual shell convention of `VAR=1 prog` to
    /// enable a flag and plain `unset VAR`/`VAR=` to disable it.
    pub fn from_env() -> Config {
        Config {
            optimize: is_flag_set(OPTIMIZE_VAR),
            keep_intermediate_ir: is_flag_set(KEEP_IR_VAR),
            emit_debug_info: is_flag_set(DEBUG_INFO_VAR),
        }
    }
}

fn is_flag_set(var: &str) -> bool {
    match env::var(var) {
        Ok(value) => !value.is_empty() && value != "0",
        Err(_) => false,
    }
}
