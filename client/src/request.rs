//! Compile request and result types, serialized exactly as the backend's
//! request/response models expect.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Maximum source length accepted by the backend; checked client-side so
/// oversized sources fail before a network round-trip.
pub const MAX_SOURCE_LEN: usize = 50_000;

/// Maximum blueprint name length accepted by the backend.
pub const MAX_BLUEPRINT_NAME_LEN: usize = 100;

/// Power pole type placed by the compiler's layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerPoleKind {
    Small,
    Medium,
    Big,
    Substation,
}

impl FromStr for PowerPoleKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "big" => Ok(Self::Big),
            "substation" => Ok(Self::Substation),
            other => Err(ClientError::InvalidRequest(format!(
                "unknown power pole type '{other}' (expected small, medium, big, or substation)"
            ))),
        }
    }
}

impl fmt::Display for PowerPoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Big => write!(f, "big"),
            Self::Substation => write!(f, "substation"),
        }
    }
}

/// Verbosity of the compiler log stream.
///
/// The wire word for the third level is `warning`, matching the backend's
/// accepted set `debug|info|warning|error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl FromStr for LogLevel {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(ClientError::InvalidRequest(format!(
                "unknown log level '{other}' (expected debug, info, warning, or error)"
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One compilation request. Immutable once sent.
#[derive(Debug, Clone, Serialize)]
pub struct CompileRequest {
    /// Facto source code.
    pub source: String,
    /// Power pole type for the layout pass; backend default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_poles: Option<PowerPoleKind>,
    /// Name embedded in the generated blueprint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blueprint_name: Option<String>,
    /// Skip the optimizer pass.
    pub no_optimize: bool,
    /// Ask for the structured JSON artifact (honored on the sync path only;
    /// the streaming path always sends `false`).
    pub json_output: bool,
    /// Compiler log verbosity.
    pub log_level: LogLevel,
}

impl CompileRequest {
    /// A request with default options for the given source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            power_poles: None,
            blueprint_name: None,
            no_optimize: false,
            json_output: false,
            log_level: LogLevel::default(),
        }
    }

    /// Front-end validation, mirroring the backend's request limits.
    pub fn validate(&self) -> crate::Result<()> {
        if self.source.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "source code cannot be empty".into(),
            ));
        }
        if self.source.len() > MAX_SOURCE_LEN {
            return Err(ClientError::InvalidRequest(format!(
                "source exceeds maximum length of {MAX_SOURCE_LEN} characters"
            )));
        }
        if let Some(name) = &self.blueprint_name {
            if name.len() > MAX_BLUEPRINT_NAME_LEN {
                return Err(ClientError::InvalidRequest(format!(
                    "blueprint name exceeds maximum length of {MAX_BLUEPRINT_NAME_LEN} characters"
                )));
            }
        }
        Ok(())
    }
}

/// Full response body of the sync compile endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileResult {
    /// Whether a blueprint was produced.
    pub success: bool,
    /// Last status line the compiler emitted.
    #[serde(default)]
    pub status: Option<String>,
    /// Compiler log lines, in emission order.
    #[serde(default)]
    pub logs: Vec<String>,
    /// The blueprint artifact, when compilation succeeded.
    #[serde(default)]
    pub blueprint: Option<String>,
    /// The structured artifact, when `json_output` was requested.
    #[serde(default)]
    pub json: Option<String>,
    /// Compile error messages.
    #[serde(default)]
    pub errors: Vec<String>,
}
