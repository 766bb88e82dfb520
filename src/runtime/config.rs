use serde::{Deserialize, Serialize};

/// Host-constructed, TOML-parseable tuning knobs. The core never reads the
/// environment or the filesystem for these; a host builds one (often via
/// `RuntimeConfig::default()` or by parsing a config file itself) and passes
/// it into `Runtime::new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum ancestor-chain depth walked when resolving a property or
    /// handler through a script instance's `ancestor` property.
    pub ancestor_chain_depth_limit: u32,
    /// Tempo (frames per second) a newly loaded movie starts at if the score
    /// doesn't specify one.
    pub default_tempo: u16,
    /// Tempo values at or below zero are clamped up to this floor.
    pub tempo_floor: u16,
    /// Maximum depth of the call-frame/scope stack before a runaway
    /// recursive handler is aborted.
    pub max_scope_stack: usize,
    /// When set, the VM emits a `trace!`-level line per executed
    /// instruction (opcode, operand, stack depth). Off by default since it's
    /// expensive even at trace level.
    pub log_bytecode_trace: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            ancestor_chain_depth_limit: 100,
            default_tempo: 15,
            tempo_floor: 1,
            max_scope_stack: 50,
            log_bytecode_trace: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(s: &str) -> Result<RuntimeConfig, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn clamp_tempo(&self, tempo: i32) -> u16 {
        if tempo <= self.tempo_floor as i32 {
            self.tempo_floor
        } else {
            tempo as u16
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = RuntimeConfig::default();
        assert_eq!(config.ancestor_chain_depth_limit, 100);
        assert_eq!(config.default_tempo, 15);
        assert_eq!(config.tempo_floor, 1);
        assert_eq!(config.max_scope_stack, 50);
        assert!(!config.log_bytecode_trace);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = RuntimeConfig::from_toml_str("default_tempo = 30\n").unwrap();
        assert_eq!(config.default_tempo, 30);
        assert_eq!(config.ancestor_chain_depth_limit, 100);
    }
}
