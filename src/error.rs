//! Error types for settings validation, token decoding and rendering

use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

/// A settings value that does not match the schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid birth date '{0}', expected YYYY-MM-DD")]
    BirthDate(String),

    #[error("life expectancy must be between 1 and {max} years, got {value}")]
    LifeExpectancy { value: u32, max: u32 },

    #[error("invalid color '{value}' for {field}")]
    Color { field: &'static str, value: String },

    #[error("unknown theme '{0}'")]
    Theme(String),

    /// Structural failure reported by the JSON deserializer (missing field,
    /// wrong type, unknown enum variant, unknown field)
    #[error("malformed settings: {0}")]
    Schema(String),
}

/// A token that could not be turned back into settings
#[derive(Error, Debug)]
pub enum InvalidTokenError {
    #[error("token is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("token payload failed validation: {0}")]
    Settings(#[from] ValidationError),
}

/// Failure while allocating or drawing the raster surface
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} surface")]
    SurfaceSize { width: u32, height: u32 },

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Failure while loading the device profile table
#[derive(Error, Debug)]
pub enum DeviceTableError {
    #[error("failed to read device table: {0}")]
    Csv(#[from] csv::Error),

    #[error("device '{id}' is invalid: {reason}")]
    Profile { id: String, reason: String },

    #[error("fallback device '{0}' is not in the table")]
    MissingFallback(String),

    #[error("device '{0}' appears more than once")]
    Duplicate(String),
}

/// Any error produced by the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidToken(#[from] InvalidTokenError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    DeviceTable(#[from] DeviceTableError),
}
