//! Transcoder configuration
//!
//! Loads encoder, decoder and logging settings from TOML files. Every field
//! is optional; unset encoder parameters fall back to the defaults below
//! when the encoder is set up.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, TranscodeError};
use crate::frame::{AudioParams, ChannelLayout, SampleFormat};

/// Sample format requested when none is configured
pub const DEFAULT_SAMPLE_FORMAT: SampleFormat = SampleFormat::FltP;
/// Bit rate requested when none is configured
pub const DEFAULT_BIT_RATE: u64 = 50_000;
/// Sample rate requested when none is configured
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Channel layout requested when none is configured
pub const DEFAULT_CHANNEL_LAYOUT: ChannelLayout = ChannelLayout::STEREO;
/// Encoder used when none is configured
pub const DEFAULT_ENCODER: &str = "aac";

/// Requested encoder parameters.
///
/// These are requests: the engine may coerce them when the codec opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Encoder name as registered with the engine
    pub codec: String,
    pub sample_format: Option<SampleFormat>,
    /// Hz; 0 counts as unset
    pub sample_rate: Option<u32>,
    /// bps; 0 counts as unset
    pub bit_rate: Option<u64>,
    /// An empty layout counts as unset
    pub channel_layout: Option<ChannelLayout>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_ENCODER.to_string(),
            sample_format: None,
            sample_rate: None,
            bit_rate: None,
            channel_layout: None,
        }
    }
}

impl EncoderConfig {
    /// Requested output parameters with defaults filled in.
    pub fn resolved_params(&self) -> AudioParams {
        AudioParams {
            sample_format: self.sample_format.unwrap_or(DEFAULT_SAMPLE_FORMAT),
            channel_layout: self
                .channel_layout
                .filter(|layout| !layout.is_empty())
                .unwrap_or(DEFAULT_CHANNEL_LAYOUT),
            sample_rate: self
                .sample_rate
                .filter(|rate| *rate > 0)
                .unwrap_or(DEFAULT_SAMPLE_RATE),
        }
    }

    pub fn resolved_bit_rate(&self) -> u64 {
        self.bit_rate
            .filter(|rate| *rate > 0)
            .unwrap_or(DEFAULT_BIT_RATE)
    }
}

/// Decoder settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Rate stamped on decoded frames instead of the stream's declared rate
    pub sample_rate: Option<u32>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Some("pretty".to_string()),
        }
    }
}

/// Configuration file format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    pub encoder: EncoderConfig,
    pub decoder: DecoderConfig,
    pub logging: Option<LoggingSettings>,
}

impl TranscodeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TranscodeError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| TranscodeError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Configuration with every default spelled out
    pub fn default_config() -> Self {
        let params = EncoderConfig::default().resolved_params();
        Self {
            encoder: EncoderConfig {
                codec: DEFAULT_ENCODER.to_string(),
                sample_format: Some(params.sample_format),
                sample_rate: Some(params.sample_rate),
                bit_rate: Some(DEFAULT_BIT_RATE),
                channel_layout: Some(params.channel_layout),
            },
            decoder: DecoderConfig::default(),
            logging: Some(LoggingSettings::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_encoder_defaults() {
        let config = EncoderConfig::default();
        let params = config.resolved_params();
        assert_eq!(params.sample_format, SampleFormat::FltP);
        assert_eq!(params.sample_rate, 44100);
        assert_eq!(params.channel_layout, ChannelLayout::STEREO);
        assert_eq!(config.resolved_bit_rate(), 50_000);
    }

    #[test]
    fn test_zero_values_count_as_unset() {
        let config = EncoderConfig {
            sample_rate: Some(0),
            bit_rate: Some(0),
            channel_layout: Some(ChannelLayout::empty()),
            ..EncoderConfig::default()
        };
        assert_eq!(config.resolved_params().sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(config.resolved_params().channel_layout, DEFAULT_CHANNEL_LAYOUT);
        assert_eq!(config.resolved_bit_rate(), DEFAULT_BIT_RATE);
    }

    #[test]
    fn test_parse_toml() {
        let config = TranscodeConfig::from_toml_str(
            r#"
            [encoder]
            codec = "libopus"
            sample_format = "s16"
            sample_rate = 48000
            channel_layout = "5.1"

            [decoder]
            sample_rate = 44100

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.encoder.codec, "libopus");
        assert_eq!(config.encoder.sample_format, Some(SampleFormat::S16));
        assert_eq!(config.encoder.channel_layout, Some(ChannelLayout::LAYOUT_5POINT1));
        assert_eq!(config.encoder.bit_rate, None);
        assert_eq!(config.decoder.sample_rate, Some(44100));
        assert_eq!(config.logging.unwrap().format.as_deref(), Some("json"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TranscodeConfig::from_toml_str("").unwrap();
        assert_eq!(config, TranscodeConfig::default());
        assert_eq!(config.encoder.codec, "aac");
    }

    #[test]
    fn test_bad_sample_format() {
        let err = TranscodeConfig::from_toml_str("[encoder]\nsample_format = \"s24\"\n").unwrap_err();
        assert!(matches!(err, TranscodeError::Config(_)));
    }

    #[test]
    fn test_config_file_roundtrip() {
        let config = TranscodeConfig::default_config();

        let mut temp_file = NamedTempFile::new().unwrap();
        let content = toml::to_string_pretty(&config).unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let loaded = TranscodeConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_to_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        TranscodeConfig::default_config().to_file(&path).unwrap();

        let loaded = TranscodeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.encoder.bit_rate, Some(DEFAULT_BIT_RATE));
        assert_eq!(loaded.encoder.channel_layout, Some(ChannelLayout::STEREO));
    }

    #[test]
    fn test_missing_file() {
        let err = TranscodeConfig::from_file("/nonexistent/transcode.toml").unwrap_err();
        assert!(matches!(err, TranscodeError::Io(_)));
    }
}
