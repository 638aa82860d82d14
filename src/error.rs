use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Failures detected while assembling the vehicle or the level, before the
/// simulation loop starts. None of these are recoverable at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    WheelCount { found: usize },
    NonPositiveMass { part: &'static str, mass: f32 },
    NonPositiveExtent { part: &'static str },
    DegenerateWheelAxis,
    DuplicateWheelOffset { first: usize, second: usize },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WheelCount { found } => {
                write!(f, "vehicle needs exactly 4 wheel definitions, found {found}")
            }
            Self::NonPositiveMass { part, mass } => {
                write!(f, "{part} mass must be > 0, got {mass}")
            }
            Self::NonPositiveExtent { part } => {
                write!(f, "{part} extents must all be > 0")
            }
            Self::DegenerateWheelAxis => write!(f, "wheel axle axis has zero length"),
            Self::DuplicateWheelOffset { first, second } => {
                write!(f, "wheels {first} and {second} share the same mount point")
            }
        }
    }
}

impl Error for SetupError {}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse `{}`: {source}", path.display())
            }
            Self::Validation(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}
