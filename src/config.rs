use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::controls::Brightness;
use crate::dispatcher::CommandDispatcher;
use crate::error::ConfigError;

pub const DEFAULT_CLIENT_NAME: &str = "launchpad-emu";

/// Settings read from `launchpad-emu.yml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulatorConfig {
    /// Reject unknown commands instead of ignoring them.
    pub strict: bool,
    /// Brightness level at start-up, `0..=15`.
    pub brightness: u8,
    pub midi: MidiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MidiConfig {
    pub client_name: String,
    /// Port hint for the input carrying commands.
    pub input_port: Option<String>,
    /// Port hint for the output receiving interactions.
    pub output_port: Option<String>,
    /// Publish a virtual port pair with this name instead (Unix only).
    pub virtual_port: Option<String>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            strict: false,
            brightness: Brightness::default().level(),
            midi: MidiConfig::default(),
        }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            input_port: None,
            output_port: None,
            virtual_port: None,
        }
    }
}

impl EmulatorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.brightness_level()?;
        Ok(config)
    }

    pub fn brightness_level(&self) -> Result<Brightness, ConfigError> {
        Ok(Brightness::of(self.brightness as i64)?)
    }

    pub fn dispatcher(&self) -> CommandDispatcher {
        if self.strict {
            CommandDispatcher::strict()
        } else {
            CommandDispatcher::new()
        }
    }

    pub fn midi_enabled(&self) -> bool {
        self.midi.input_port.is_some()
            || self.midi.output_port.is_some()
            || self.midi.virtual_port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EmulatorConfig::from_yaml("{}").unwrap();
        assert_eq!(config, EmulatorConfig::default());
        assert_eq!(config.brightness, 15);
        assert!(!config.midi_enabled());
        assert!(!config.dispatcher().is_strict());
    }

    #[test]
    fn reads_midi_section() {
        let config = EmulatorConfig::from_yaml(
            "strict: true\nbrightness: 4\nmidi:\n  input_port: Launchpad\n  output_port: loopMIDI\n",
        )
        .unwrap();
        assert!(config.strict);
        assert_eq!(config.brightness_level().unwrap().level(), 4);
        assert_eq!(config.midi.client_name, DEFAULT_CLIENT_NAME);
        assert_eq!(config.midi.input_port.as_deref(), Some("Launchpad"));
        assert!(config.midi_enabled());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EmulatorConfig::from_yaml("brightness: 16"),
            Err(ConfigError::Value(_))
        ));
        assert!(matches!(
            EmulatorConfig::from_yaml("colour: red"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
