//! `ttrc` configuration file parser.
//!
//! A config file is an ordinary command script.  A few directives are picked
//! out before the session exists:
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `#CONFIG {BUFFER SIZE} {n}` | staging buffer capacity in bytes |
//! | `#CONFIG {LUA DEPTH} {n}` | how deep `#LUA` may nest through `tt.send` |
//! | `#CONFIG {LUA MEMORY} {n}` | Lua heap limit in bytes, `0` = unlimited |
//! | `#VARIABLE {name} {value}` | seed a session variable |
//! | `#NOP …`, `;` comments, blank lines | ignored |
//! | anything else | kept as a startup command |

use std::path::Path;

use thiserror::Error;

use crate::args::{get_arg_in_braces, get_arg_stop_spaces, is_abbrev};
use crate::lua::BUFFER_SIZE;
use crate::var::VarStore;

/// Default bound on nested `#LUA` invocations.
pub const DEFAULT_MAX_SCRIPT_DEPTH: usize = 32;

// ── BridgeConfig ──────────────────────────────────────────────────────────────

/// Settings for a session's Lua bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Capacity of each staging buffer, terminator included.
    pub buffer_size: usize,
    /// Maximum number of `#LUA` invocations active at once in one session.
    pub max_script_depth: usize,
    /// Lua heap limit in bytes; `None` leaves the heap unbounded.
    pub memory_limit: Option<usize>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            buffer_size: BUFFER_SIZE,
            max_script_depth: DEFAULT_MAX_SCRIPT_DEPTH,
            memory_limit: None,
        }
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Everything read from a config file.
#[derive(Debug, Default)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub vars: VarStore,
    /// Lines to run in the session once it exists, in file order.
    pub commands: Vec<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config script.  Returns the config and any errors on
    /// recognised directives; a bad directive leaves the default in place.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(body) = line.strip_prefix('#') else {
                config.commands.push(line.to_owned());
                continue;
            };
            let (word, args) = get_arg_stop_spaces(body);

            let result = if is_abbrev(&word, "nop") {
                Ok(())
            } else if word.len() >= 3 && is_abbrev(&word, "config") {
                parse_config(args, &mut config.bridge)
            } else if is_abbrev(&word, "variable") {
                parse_variable(args, &mut config.vars)
            } else {
                config.commands.push(line.to_owned());
                Ok(())
            };
            if let Err(message) = result {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }
}

// ── Directives ────────────────────────────────────────────────────────────────

fn parse_config(args: &str, bridge: &mut BridgeConfig) -> Result<(), String> {
    let (key, rest) = get_arg_stop_spaces(args);
    let (value, _) = get_arg_in_braces(rest);
    let n: usize = value
        .parse()
        .map_err(|_| format!("#CONFIG {{{key}}}: '{value}' is not a number"))?;

    match key.to_ascii_uppercase().as_str() {
        "BUFFER SIZE" if n == 0 => Err("#CONFIG {BUFFER SIZE} must be at least 1".to_owned()),
        "BUFFER SIZE" => {
            bridge.buffer_size = n;
            Ok(())
        }
        "LUA DEPTH" if n == 0 => Err("#CONFIG {LUA DEPTH} must be at least 1".to_owned()),
        "LUA DEPTH" => {
            bridge.max_script_depth = n;
            Ok(())
        }
        "LUA MEMORY" => {
            bridge.memory_limit = (n > 0).then_some(n);
            Ok(())
        }
        _ => Err(format!("#CONFIG: unknown option {{{key}}}")),
    }
}

fn parse_variable(args: &str, vars: &mut VarStore) -> Result<(), String> {
    let (name, rest) = get_arg_stop_spaces(args);
    if name.is_empty() {
        return Err("#VARIABLE: missing name".to_owned());
    }
    let (value, _) = get_arg_in_braces(rest);
    vars.set(name, value);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let (cfg, errs) = Config::load_str("");
        assert!(errs.is_empty());
        assert_eq!(cfg.bridge, BridgeConfig::default());
        assert_eq!(cfg.bridge.buffer_size, BUFFER_SIZE);
        assert!(cfg.commands.is_empty());
    }

    #[test]
    fn bridge_settings() {
        let src = "#CONFIG {BUFFER SIZE} {4096}\n\
                   #config {lua depth} {8}\n\
                   #CONFIG {LUA MEMORY} {1048576}\n";
        let (cfg, errs) = Config::load_str(src);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.bridge.buffer_size, 4096);
        assert_eq!(cfg.bridge.max_script_depth, 8);
        assert_eq!(cfg.bridge.memory_limit, Some(1_048_576));
    }

    #[test]
    fn zero_memory_means_unlimited() {
        let (cfg, _) = Config::load_str("#CONFIG {LUA MEMORY} {0}");
        assert_eq!(cfg.bridge.memory_limit, None);
    }

    #[test]
    fn variables_are_seeded() {
        let (cfg, errs) = Config::load_str("#VARIABLE {target} {big orc}\n#var hp 100");
        assert!(errs.is_empty());
        assert_eq!(cfg.vars.get("target"), Some("big orc"));
        assert_eq!(cfg.vars.get("hp"), Some("100"));
    }

    #[test]
    fn other_lines_become_commands() {
        let src = "#nop comment\n; note\n\n#lua {tt.print('hi')}\nnorth\n";
        let (cfg, errs) = Config::load_str(src);
        assert!(errs.is_empty());
        assert_eq!(cfg.commands, vec!["#lua {tt.print('hi')}", "north"]);
    }

    #[test]
    fn bad_values_are_reported_with_line_numbers() {
        let src = "#nop\n#CONFIG {BUFFER SIZE} {lots}\n#CONFIG {LUA DEPTH} {0}\n#CONFIG {COLOR} {1}";
        let (cfg, errs) = Config::load_str(src);
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[0].line, 2);
        assert_eq!(errs[1].line, 3);
        assert!(errs[2].to_string().contains("unknown option {COLOR}"));
        assert_eq!(cfg.bridge, BridgeConfig::default());
    }

    #[test]
    fn load_file_reads_from_disk() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "#CONFIG {{LUA DEPTH}} {{3}}").unwrap();
        let (cfg, errs) = Config::load_file(f.path()).unwrap();
        assert!(errs.is_empty());
        assert_eq!(cfg.bridge.max_script_depth, 3);
    }
}
