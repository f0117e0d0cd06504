//! Error types for descriptor expansion, export and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors in the host configuration. Raised before any document is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("web root \"{web_root}\" for {api_path} must end with \"/\"")]
    MissingTrailingSeparator { api_path: String, web_root: String },

    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::Read { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while loading an API document or a referenced schema file.
#[derive(Debug, Error)]
pub enum ResolveError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::FileNotFound { .. } | ResolveError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during expansion of a single document.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("{location}: unknown trait \"{name}\"")]
    UnknownTrait { location: String, name: String },

    #[error("{location}: unknown security scheme \"{name}\"")]
    UnknownSecurityScheme { location: String, name: String },

    #[error("malformed method: {message}")]
    MalformedMethod { message: String },

    #[error("invalid schema at {location}: {source}")]
    InvalidSchema {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl ExpandError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExpandError::Resolve(e) => e.exit_code(),
            ExpandError::InvalidSchema { .. } => 2,
            _ => 1,
        }
    }
}

/// Errors while serializing an exported descriptor.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot serialize descriptor as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot serialize descriptor as RAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ExportError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while building every configured document into an output directory.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{api_path}: {source}")]
    Expand {
        api_path: PathBuf,
        #[source]
        source: ExpandError,
    },

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Config(e) => e.exit_code(),
            BuildError::Expand { source, .. } => source.exit_code(),
            BuildError::Export(e) => e.exit_code(),
            BuildError::Write { .. } => 3,
        }
    }
}
