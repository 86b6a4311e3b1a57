use thiserror::Error;

/// Main error type for the transcoding core
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// A codec or resampler context could not be found, opened or allocated.
    /// Fatal to the owning instance.
    #[error("Setup failed: {0}")]
    Setup(String),

    /// A resample, encode or decode call failed. Reported for that call only.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// A decoder was asked to initialise from codec data it cannot interpret
    #[error("Unsupported codec data: {0}")]
    UnsupportedCodecData(String),

    /// Codec configuration bytes could not be parsed
    #[error("Invalid codec data: {0}")]
    InvalidCodecData(String),

    /// Plane sizes do not match the frame's declared parameters, or a slice
    /// range is out of bounds
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Two frames with different format, layout or rate were combined
    #[error("Frame mismatch: {0}")]
    FrameMismatch(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a codec engine backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Codec not found: {0}")]
    CodecNotFound(String),

    #[error("Codec is not an audio codec: {0}")]
    NotAudio(String),

    #[error("Failed to open codec: {0}")]
    CodecOpen(String),

    #[error("Failed to create resampler: {0}")]
    ResamplerCreate(String),

    #[error("Resample failed: status={0}")]
    Resample(i32),

    #[error("Failed to encode frame: status={0}")]
    EncodeFrame(i32),

    #[error("Failed to decode packet: status={0}")]
    DecodePacket(i32),

    #[error("{0}")]
    Other(String),
}

/// Coarse failure classes callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The owning instance cannot be used
    Setup,
    /// Only the failing call is affected
    Conversion,
    /// The decoder never opens
    UnsupportedCodecData,
    /// The caller passed something malformed
    Usage,
}

impl TranscodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranscodeError::Setup(_) => ErrorKind::Setup,
            TranscodeError::Conversion(_) => ErrorKind::Conversion,
            TranscodeError::UnsupportedCodecData(_) => ErrorKind::UnsupportedCodecData,
            TranscodeError::InvalidCodecData(_)
            | TranscodeError::InvalidFrame(_)
            | TranscodeError::FrameMismatch(_)
            | TranscodeError::Config(_)
            | TranscodeError::Io(_) => ErrorKind::Usage,
        }
    }

    pub fn is_setup_failure(&self) -> bool {
        self.kind() == ErrorKind::Setup
    }

    pub fn is_conversion_failure(&self) -> bool {
        self.kind() == ErrorKind::Conversion
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TranscodeError>;
