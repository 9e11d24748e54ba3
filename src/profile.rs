//! Parameter profiles
//!
//! A profile names a preset and optionally overrides individual settings.
//! Profiles are read from JSON:
//!
//! ```json
//! { "preset": "yenten", "n": 2048, "sbox_bytes": 8192 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use yescrypt_core::{Flags, Mode, Params, ParamsBuilder, Rom, SboxMode};

/// Error type for profile loading
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid parameters: {0}")]
    Params(#[from] yescrypt_core::Error),

    #[error("ROM mode needs both rom_seed and rom_blocks")]
    RomSettings,
}

/// Starting point of a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// N = 4096, r = 32, p = 1, read-write, 4 KiB S-boxes
    #[default]
    Yenten,
    /// Plain scrypt with N = 1024, r = 1, p = 1
    Scrypt,
}

/// Mixing variant as written in a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSetting {
    Classic,
    ReadWrite,
    Rom,
}

impl From<ModeSetting> for Mode {
    fn from(mode: ModeSetting) -> Self {
        match mode {
            ModeSetting::Classic => Mode::Classic,
            ModeSetting::ReadWrite => Mode::ReadWrite,
            ModeSetting::Rom => Mode::ReadOnlyRom,
        }
    }
}

impl From<Mode> for ModeSetting {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Classic => ModeSetting::Classic,
            Mode::ReadWrite => ModeSetting::ReadWrite,
            Mode::ReadOnlyRom => ModeSetting::Rom,
        }
    }
}

/// S-box transform as written in a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SboxSetting {
    Disabled,
    ReadOnly,
    WriteBack,
}

impl From<SboxSetting> for SboxMode {
    fn from(sboxes: SboxSetting) -> Self {
        match sboxes {
            SboxSetting::Disabled => SboxMode::Disabled,
            SboxSetting::ReadOnly => SboxMode::ReadOnly,
            SboxSetting::WriteBack => SboxMode::WriteBack,
        }
    }
}

impl From<SboxMode> for SboxSetting {
    fn from(sboxes: SboxMode) -> Self {
        match sboxes {
            SboxMode::Disabled => SboxSetting::Disabled,
            SboxMode::ReadOnly => SboxSetting::ReadOnly,
            SboxMode::WriteBack => SboxSetting::WriteBack,
        }
    }
}

/// Proof-of-work parameter profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PowProfile {
    #[serde(default)]
    pub preset: Preset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbox_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sboxes: Option<SboxSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm: Option<bool>,
    /// Reject parameter sets needing more bytes than this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_memory: Option<usize>,
    /// ROM seed (text) for the `rom` mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rom_seed: Option<String>,
    /// ROM size in block arrays for the `rom` mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rom_blocks: Option<u64>,
}

impl PowProfile {
    /// Parse a profile from JSON text
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a profile from a JSON file
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Spell out every setting of `params`
    pub fn from_params(params: &Params) -> Self {
        let flags = params.flags();
        Self {
            preset: Preset::Yenten,
            n: Some(params.n()),
            r: Some(params.r()),
            p: Some(params.p()),
            t: Some(params.t()),
            g: Some(params.g()),
            sbox_bytes: Some(params.sbox_bytes()),
            mode: Some(flags.mode.into()),
            sboxes: Some(flags.sboxes.into()),
            confirm: Some(flags.confirm),
            ..Self::default()
        }
    }

    /// Preset with the profile's overrides applied, not yet validated
    pub fn builder(&self) -> ParamsBuilder {
        let mut builder = match self.preset {
            Preset::Yenten => Params::builder(),
            Preset::Scrypt => Params::builder().n(1024).r(1).p(1).flags(Flags::CLASSIC),
        };

        if let Some(n) = self.n {
            builder = builder.n(n);
        }
        if let Some(r) = self.r {
            builder = builder.r(r);
        }
        if let Some(p) = self.p {
            builder = builder.p(p);
        }
        if let Some(t) = self.t {
            builder = builder.t(t);
        }
        if let Some(g) = self.g {
            builder = builder.g(g);
        }
        if let Some(mode) = self.mode {
            builder = builder.mode(mode.into());
        }
        if let Some(sboxes) = self.sboxes {
            builder = builder.sboxes(sboxes.into());
        }
        if let Some(bytes) = self.sbox_bytes {
            builder = builder.sbox_bytes(bytes);
        }
        if let Some(confirm) = self.confirm {
            builder = builder.confirm(confirm);
        }
        if let Some(limit) = self.max_memory {
            builder = builder.max_memory(limit);
        }
        builder
    }

    /// Validated parameters
    pub fn params(&self) -> Result<Params, ProfileError> {
        Ok(self.builder().build()?)
    }

    /// Generate the ROM for `rom` mode profiles; `None` for every other mode
    pub fn rom(&self, params: &Params) -> Result<Option<Rom>, ProfileError> {
        if params.flags().mode != Mode::ReadOnlyRom {
            return Ok(None);
        }
        let (Some(seed), Some(blocks)) = (&self.rom_seed, self.rom_blocks) else {
            return Err(ProfileError::RomSettings);
        };
        Ok(Some(Rom::generate(seed.as_bytes(), blocks, params.r())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_is_yenten() {
        let profile = PowProfile::from_json("{}").unwrap();
        assert_eq!(profile.params().unwrap(), Params::yenten());
    }

    #[test]
    fn test_scrypt_preset() {
        let profile = PowProfile::from_json(r#"{ "preset": "scrypt" }"#).unwrap();
        assert_eq!(profile.params().unwrap(), Params::classic(1024, 1, 1).unwrap());
    }

    #[test]
    fn test_overrides() {
        let profile = PowProfile::from_json(
            r#"{ "n": 2048, "r": 8, "t": 1, "sboxes": "write_back", "sbox_bytes": 8192 }"#,
        )
        .unwrap();
        let params = profile.params().unwrap();
        assert_eq!(params.n(), 2048);
        assert_eq!(params.r(), 8);
        assert_eq!(params.t(), 1);
        assert_eq!(params.sbox_bytes(), 8192);
        assert_eq!(params.flags().sboxes, SboxMode::WriteBack);
        assert_eq!(params.flags().mode, Mode::ReadWrite);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(matches!(
            PowProfile::from_json(r#"{ "nn": 4 }"#),
            Err(ProfileError::Json(_))
        ));
    }

    #[test]
    fn test_invalid_params_are_reported() {
        let profile = PowProfile::from_json(r#"{ "n": 1000 }"#).unwrap();
        assert!(matches!(
            profile.params(),
            Err(ProfileError::Params(yescrypt_core::Error::InvalidN(1000)))
        ));
    }

    #[test]
    fn test_rom_profile() {
        let profile = PowProfile::from_json(
            r#"{ "n": 16, "r": 1, "sbox_bytes": 64, "mode": "rom", "rom_seed": "seed", "rom_blocks": 16 }"#,
        )
        .unwrap();
        let params = profile.params().unwrap();
        let rom = profile.rom(&params).unwrap().unwrap();
        assert_eq!(rom.len(), 16);

        let missing = PowProfile {
            rom_blocks: None,
            ..profile
        };
        assert!(matches!(
            missing.rom(&params),
            Err(ProfileError::RomSettings)
        ));
    }

    #[test]
    fn test_from_params_round_trip() {
        let params = Params::builder()
            .n(64)
            .r(2)
            .sboxes(SboxMode::WriteBack)
            .build()
            .unwrap();
        let json = serde_json::to_string(&PowProfile::from_params(&params)).unwrap();
        let back = PowProfile::from_json(&json).unwrap().params().unwrap();
        assert_eq!(back, params);
    }
}
