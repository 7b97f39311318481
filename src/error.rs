/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! Error types for archive verification and comparison.
//! Defines all possible errors that can occur while checking an archive.

use std::{fmt, io};

/// Comprehensive error type for all checking operations.
#[derive(Debug)]
pub enum CheckerError {
    /// I/O errors during file operations
    Io(io::Error),
    /// ZIP format errors during archive processing
    Zip(zip::result::ZipError),
    /// Entry content failed its recorded digest/checksum while streaming
    Integrity(String),
    /// Malformed PKCS#7 or ASN.1 structure
    Decode(String),
    /// Configuration or argument errors
    Config(String),
    /// A verify/compare run ended with a failure verdict
    Verification(String),
}

impl fmt::Display for CheckerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckerError::Io(e) => write!(f, "I/O Error: {}", e),
            CheckerError::Zip(e) => write!(f, "ZIP Error: {}", e),
            CheckerError::Integrity(s) => write!(f, "Integrity Error: {}", s),
            CheckerError::Decode(s) => write!(f, "Decode Error: {}", s),
            CheckerError::Config(s) => write!(f, "Configuration Error: {}", s),
            CheckerError::Verification(s) => write!(f, "Verification Error: {}", s),
        }
    }
}

impl std::error::Error for CheckerError {}

impl From<io::Error> for CheckerError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<zip::result::ZipError> for CheckerError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Zip(e)
    }
}
