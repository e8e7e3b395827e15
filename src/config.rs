//! YAML presets for effects and effect stacks.
//!
//! A preset captures parameter values and `active` flags, never history.
//! Building a preset always yields fresh effects; snapshotting live effects
//! reads their current parameters.
//!
//! ```yaml
//! active: true
//! effects:
//!   - id: warmth
//!     type: lowpass
//!     strength: 0.3
//!   - id: echo
//!     type: delay
//!     wait: 0.25
//!     feedback: 0.4
//!     active: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::effects::{Bitcrush, Delay, Distortion, Effect, EffectKind, Pan, PitchShift, Volume};
use crate::error::Result;
use crate::filters::{Highpass, Lowpass};
use crate::player::Player;

/// Ring size used for pitch shifters when a preset does not name one.
pub const DEFAULT_PITCH_BUFFER_FRAMES: usize = 1024;

fn enabled() -> bool {
    true
}

fn unity() -> f64 {
    1.0
}

fn half() -> f64 {
    0.5
}

fn default_wait() -> f64 {
    0.1
}

fn default_highpass() -> f64 {
    0.8
}

fn default_pitch_buffer() -> usize {
    DEFAULT_PITCH_BUFFER_FRAMES
}

/// Parameters of one effect, tagged by `type`. Omitted fields take the
/// effect's constructor defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KindConfig {
    Volume {
        #[serde(default = "unity")]
        strength: f64,
        #[serde(default = "unity")]
        normalization: f64,
    },
    Pan {
        #[serde(default)]
        pan: f64,
    },
    Delay {
        #[serde(default = "default_wait")]
        wait: f64,
        #[serde(default = "unity")]
        strength: f64,
        #[serde(default = "half")]
        feedback: f64,
    },
    Distortion {
        #[serde(default)]
        crush: f64,
    },
    Lowpass {
        #[serde(default = "half")]
        strength: f64,
    },
    Highpass {
        #[serde(default = "default_highpass")]
        strength: f64,
    },
    Bitcrush {
        #[serde(default = "unity")]
        strength: f64,
    },
    PitchShift {
        #[serde(default = "default_pitch_buffer")]
        buffer_frames: usize,
        #[serde(default = "unity")]
        pitch: f64,
        #[serde(default = "unity")]
        strength: f64,
    },
}

/// One effect preset: its parameters and whether it starts enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    #[serde(default = "enabled")]
    pub active: bool,
    #[serde(flatten)]
    pub kind: KindConfig,
}

impl EffectConfig {
    /// Builds a fresh effect. `sample_rate` is only consulted by delays.
    pub fn build(&self, sample_rate: u32) -> Effect {
        let kind: EffectKind = match self.kind {
            KindConfig::Volume { strength, normalization } => Volume::new()
                .with_strength(strength)
                .with_normalization(normalization)
                .into(),
            KindConfig::Pan { pan } => Pan::new().with_pan(pan).into(),
            KindConfig::Delay { wait, strength, feedback } => Delay::new(sample_rate)
                .with_wait(wait)
                .with_strength(strength)
                .with_feedback(feedback)
                .into(),
            KindConfig::Distortion { crush } => Distortion::new().with_crush(crush).into(),
            KindConfig::Lowpass { strength } => Lowpass::new().with_strength(strength).into(),
            KindConfig::Highpass { strength } => Highpass::new().with_strength(strength).into(),
            KindConfig::Bitcrush { strength } => Bitcrush::new().with_strength(strength).into(),
            KindConfig::PitchShift {
                buffer_frames,
                pitch,
                strength,
            } => PitchShift::new(buffer_frames)
                .with_pitch(pitch)
                .with_strength(strength)
                .into(),
        };

        let effect = Effect::new(kind);
        effect.set_active(self.active);
        effect
    }

    /// Snapshots the current parameters of `effect`.
    pub fn from_effect(effect: &Effect) -> Self {
        let kind = match effect.kind() {
            EffectKind::Volume(v) => KindConfig::Volume {
                strength: v.params().strength(),
                normalization: v.params().normalization(),
            },
            EffectKind::Pan(p) => KindConfig::Pan { pan: p.params().pan() },
            EffectKind::Delay(d) => KindConfig::Delay {
                wait: d.params().wait(),
                strength: d.params().strength(),
                feedback: d.params().feedback(),
            },
            EffectKind::Distortion(d) => KindConfig::Distortion {
                crush: d.params().crush(),
            },
            EffectKind::Lowpass(f) => KindConfig::Lowpass {
                strength: f.params().strength(),
            },
            EffectKind::Highpass(f) => KindConfig::Highpass {
                strength: f.params().strength(),
            },
            EffectKind::Bitcrush(b) => KindConfig::Bitcrush {
                strength: b.params().strength(),
            },
            EffectKind::PitchShift(p) => KindConfig::PitchShift {
                buffer_frames: p.buffer_frames(),
                pitch: p.params().pitch(),
                strength: p.params().strength(),
            },
        };

        Self {
            active: effect.is_active(),
            kind,
        }
    }
}

/// A named effect in a stack preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEntry {
    pub id: String,
    #[serde(flatten)]
    pub effect: EffectConfig,
}

/// An ordered, named effect stack for a channel or player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(default = "enabled")]
    pub active: bool,
    #[serde(default)]
    pub effects: Vec<EffectEntry>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            active: true,
            effects: Vec::new(),
        }
    }
}

impl StackConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reads a preset file.
    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("preset: loading {path:?}");
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&yaml)?;
        log::debug!("preset: {} effects from {path:?}", config.effects.len());
        Ok(config)
    }

    /// Reads a preset file, falling back to an empty stack when it is
    /// missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("preset: {path:?} does not exist, using an empty stack");
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|err| {
            log::warn!("preset: failed to load {path:?}: {err}, using an empty stack");
            Self::default()
        })
    }

    /// Writes the preset, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        log::debug!("preset: saved {} effects to {path:?}", self.effects.len());
        Ok(())
    }

    /// Builds a new channel holding fresh effects in preset order.
    pub fn build_channel(&self, sample_rate: u32) -> Channel {
        let channel = Channel::new();
        for entry in &self.effects {
            channel.add_effect(entry.id.clone(), entry.effect.build(sample_rate));
        }
        channel.set_active(self.active);
        channel
    }

    /// Adds fresh effects to `player`'s private stack, replacing effects
    /// under the same ids.
    pub fn apply_to_player(&self, player: &mut Player, sample_rate: u32) {
        for entry in &self.effects {
            player.add_effect(entry.id.clone(), entry.effect.build(sample_rate));
        }
    }

    /// Snapshots a channel's stack and active flag.
    pub fn from_channel(channel: &Channel) -> Self {
        let mut effects = Vec::new();
        channel.for_each_effect(|id, effect| {
            effects.push(EffectEntry {
                id: id.to_owned(),
                effect: EffectConfig::from_effect(effect),
            });
        });
        Self {
            active: channel.is_active(),
            effects,
        }
    }
}

impl Channel {
    /// Builds a channel from a preset. See [`StackConfig::build_channel`].
    pub fn from_config(config: &StackConfig, sample_rate: u32) -> Self {
        config.build_channel(sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectControls;
    use crate::error::Error;

    #[test]
    fn test_omitted_fields_take_defaults() {
        let config = StackConfig::from_yaml(
            "effects:\n  - id: a\n    type: delay\n  - id: b\n    type: highpass\n    active: false\n",
        )
        .unwrap();
        assert!(config.active);
        assert_eq!(
            config.effects[0].effect,
            EffectConfig {
                active: true,
                kind: KindConfig::Delay {
                    wait: 0.1,
                    strength: 1.0,
                    feedback: 0.5
                },
            }
        );
        assert!(!config.effects[1].effect.active);
        assert_eq!(config.effects[1].effect.kind, KindConfig::Highpass { strength: 0.8 });
    }

    #[test]
    fn test_unknown_type_is_a_preset_error() {
        let err = StackConfig::from_yaml("effects:\n  - id: x\n    type: reverb\n").unwrap_err();
        assert!(matches!(err, Error::Preset(_)));
    }

    #[test]
    fn test_build_clamps_and_sets_active() {
        let config = EffectConfig {
            active: false,
            kind: KindConfig::Pan { pan: 4.0 },
        };
        let effect = config.build(44_100);
        assert!(!effect.is_active());
        assert_eq!(effect.as_pan().map(|p| p.params().pan()), Some(1.0));
    }

    #[test]
    fn test_delay_uses_sample_rate() {
        let effect = EffectConfig {
            active: true,
            kind: KindConfig::Delay {
                wait: 0.5,
                strength: 1.0,
                feedback: 0.0,
            },
        }
        .build(8000);
        assert_eq!(effect.as_delay().map(Delay::sample_rate), Some(8000));
    }

    #[test]
    fn test_snapshot_reads_live_parameters() {
        let bus = Channel::new();
        bus.add_effect("shift", PitchShift::new(512));
        bus.add_effect("gain", Volume::new());
        if let Some(EffectControls::PitchShift(p)) = bus.controls("shift") {
            p.set_pitch(1.5);
        }
        bus.set_active(false);

        let config = StackConfig::from_channel(&bus);
        assert!(!config.active);
        assert_eq!(config.effects[0].id, "shift");
        assert_eq!(
            config.effects[0].effect.kind,
            KindConfig::PitchShift {
                buffer_frames: 512,
                pitch: 1.5,
                strength: 1.0
            }
        );
        assert_eq!(config.effects[1].id, "gain");
    }

    #[test]
    fn test_channel_round_trip() {
        let config = StackConfig::from_yaml(
            "active: true\neffects:\n  - id: crush\n    type: bitcrush\n    strength: 0.25\n  - id: pan\n    type: pan\n    pan: -0.5\n",
        )
        .unwrap();
        let bus = Channel::from_config(&config, 44_100);
        assert_eq!(bus.effect_ids(), vec!["crush", "pan"]);
        assert_eq!(StackConfig::from_channel(&bus), config);
    }

    #[test]
    fn test_apply_to_player() {
        let config = StackConfig::from_yaml("effects:\n  - id: tone\n    type: lowpass\n").unwrap();
        let mut player = Player::new(std::io::Cursor::new(Vec::<u8>::new()));
        config.apply_to_player(&mut player, 44_100);
        assert_eq!(player.effect("tone").map(Effect::name), Some("lowpass"));
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = StackConfig::load_or_default(Path::new("/nonexistent/preset.yaml"));
        assert_eq!(config, StackConfig::default());
        assert!(StackConfig::load(Path::new("/nonexistent/preset.yaml")).is_err());
    }
}
