//! Defines the custom error types for the lead-sleuth application.

use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// The primary error type for the scraping and email discovery process.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Error making HTTP requests via reqwest.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// Error writing the CSV export.
    #[error("CSV Export Error: {0}")]
    Csv(#[from] csv::Error),

    /// The listing surface could not be read or has not rendered yet.
    /// Surfaced as a listing-level failure, never fatal to the session.
    #[error("Listing Surface Error: {0}")]
    Surface(String),

    /// Every relay endpoint failed for a cross-origin content fetch.
    #[error("Relay Fetch Error: {0}")]
    Relay(String),

    /// The language-model collaborator returned an error response.
    #[error("Model Error: {0}")]
    Model(String),

    /// No usable credential for the language-model collaborator.
    #[error("Model credential missing or too short")]
    ModelNotConfigured,

    /// Indicates insufficient input data to proceed (e.g., missing name).
    #[error("Insufficient Input Data: {0}")]
    InsufficientInput(String),

    /// Failed to extract a domain from the provided URL.
    #[error("Failed to extract domain from URL: {0}")]
    DomainExtraction(String),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;
