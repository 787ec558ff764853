//! Run configuration.
use chip8::KeyCode;
use serde::Deserialize;

use crate::error::AppError;

/// Settings for the host loop, read from a YAML file.
///
/// Every field is optional in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Instructions executed per frame.
    pub ticks_per_frame: usize,
    /// Frames per second, which is also the timer rate. Zero runs unthrottled.
    pub frame_rate: u64,
    /// Stop after this many frames. Runs until an error otherwise.
    pub max_frames: Option<u64>,
    /// Seed for the random number generator.
    pub seed: Option<u64>,
    pub on_error: OnError,
    /// Ring the terminal bell when the sound timer expires.
    pub bell: bool,
    /// Print the display to stdout when the run ends.
    pub show_display: bool,
    /// Scripted keyboard input.
    pub keys: Vec<KeyEvent>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks_per_frame: 10,
            frame_rate: 60,
            max_frames: None,
            seed: None,
            on_error: OnError::Halt,
            bell: false,
            show_display: true,
            keys: Vec::new(),
        }
    }
}

/// What to do when the program hits an unsupported opcode.
///
/// Memory and stack errors always halt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    #[default]
    Halt,
    Ignore,
}

/// Key press or release, applied at the start of the given frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyEvent {
    pub frame: u64,
    pub key: KeyCode,
    #[serde(default = "pressed_default")]
    pub pressed: bool,
}

fn pressed_default() -> bool {
    true
}

impl RunConfig {
    pub fn from_file(filepath: &str) -> Result<Self, AppError> {
        let file = std::fs::File::open(filepath)?;

        let config: RunConfig = serde_yaml::from_reader(file)?;
        log::debug!("loaded run config: {:#?}", config);

        Ok(config)
    }

    pub fn parse(source: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Key events scheduled for the given frame, in file order.
    pub fn keys_at(&self, frame: u64) -> impl Iterator<Item = &KeyEvent> + '_ {
        self.keys.iter().filter(move |event| event.frame == frame)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::parse("{}").unwrap();
        assert_eq!(config.ticks_per_frame, 10);
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.max_frames, None);
        assert_eq!(config.on_error, OnError::Halt);
        assert!(config.show_display);
        assert!(!config.bell);
        assert!(config.keys.is_empty());
    }

    #[test]
    fn test_full_config() {
        let source = r#"
ticks_per_frame: 20
frame_rate: 0
max_frames: 120
seed: 42
on_error: ignore
bell: true
show_display: false
keys:
  - frame: 3
    key: 5
  - frame: 8
    key: 15
    pressed: false
  - frame: 3
    key: 10
"#;
        let config = RunConfig::parse(source).unwrap();
        assert_eq!(config.ticks_per_frame, 20);
        assert_eq!(config.frame_rate, 0);
        assert_eq!(config.max_frames, Some(120));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.on_error, OnError::Ignore);
        assert!(config.bell);
        assert!(!config.show_display);

        let frame_3: Vec<KeyCode> = config.keys_at(3).map(|ev| ev.key).collect();
        assert_eq!(frame_3, [KeyCode::Key5, KeyCode::KeyA]);

        let frame_8: Vec<&KeyEvent> = config.keys_at(8).collect();
        assert_eq!(frame_8.len(), 1);
        assert_eq!(frame_8[0].key, KeyCode::KeyF);
        assert!(!frame_8[0].pressed);

        assert_eq!(config.keys_at(4).count(), 0);
    }

    #[test]
    fn test_invalid_key() {
        let source = "keys:\n  - frame: 0\n    key: 16\n";
        assert!(RunConfig::parse(source).is_err());
    }

    #[test]
    fn test_unknown_field() {
        assert!(RunConfig::parse("tick_per_frame: 3").is_err());
    }
}
