/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! Configuration parsing and validation for the ApkCheckerust CLI.

use crate::error::CheckerError;
use clap::ArgMatches;
use std::path::PathBuf;

/// Execution mode for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Verify each archive's signatures
    Verify,
    /// Compare signing public keys across the archives
    Compare,
}

/// Application configuration parsed from command-line arguments.
#[derive(Debug)]
pub struct Config {
    /// Ordered archive paths to process
    pub archives: Vec<PathBuf>,
    /// Execution mode (verify/compare)
    pub mode: Mode,
    /// Print signer certificates instead of classifying expiry
    pub show_certs: bool,
    /// Whether to suppress non-error output
    pub quiet: bool,
    /// Verbosity level (0 = off, 1 = verbose, 2 = very verbose, 3+ = debug)
    pub verbosity_level: u8,
}

impl Config {
    /// Parse configuration from command-line argument matches.
    pub fn from_matches(matches: &ArgMatches, ui: &crate::ui::Ui) -> Result<Self, CheckerError> {
        let quiet = matches.get_flag("quiet");
        let verbosity_level = matches.get_count("verbose");

        let verify = matches.get_flag("verify");
        let compare = matches.get_flag("compare");
        let mode = match (verify, compare) {
            (true, false) => Mode::Verify,
            (false, true) => Mode::Compare,
            (true, true) => {
                return Err(CheckerError::Config(
                    "Choose either --verify or --compare-pubkey, not both.".into(),
                ))
            }
            (false, false) => {
                return Err(CheckerError::Config(
                    "No operation selected. Use -v/--verify or -c/--compare-pubkey.".into(),
                ))
            }
        };

        let archives: Vec<PathBuf> = matches
            .get_many::<String>("list")
            .map(|vals| vals.map(PathBuf::from).collect())
            .unwrap_or_default();

        if archives.is_empty() {
            return Err(CheckerError::Config(
                "Archive list is empty. Use -l/--list <ARCHIVE>...".into(),
            ));
        }

        if mode == Mode::Compare && archives.len() < 2 {
            return Err(CheckerError::Config(
                "Comparing public keys needs at least two archives.".into(),
            ));
        }

        for path in &archives {
            if !path.exists() {
                return Err(CheckerError::Config(format!(
                    "Archive does not exist: {}",
                    path.display()
                )));
            }
            std::fs::metadata(path).map_err(|e| {
                CheckerError::Config(format!("Cannot access archive {}: {}", path.display(), e))
            })?;
            ui.debug(&format!("Using archive: {}", path.display()));
        }

        Ok(Self {
            archives,
            mode,
            show_certs: matches.get_flag("show_certs"),
            quiet,
            verbosity_level,
        })
    }
}
