/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! Orchestration over an ordered sequence of archives.
//!
//! Both modes are fail-fast: the first failing archive or pair stops the
//! whole run, leaving the remaining archives unprocessed. The verifier
//! itself stays a pure result-returning function; the decision to abort
//! lives only here.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use crate::{
    error::CheckerError,
    extract, pubkey,
    ui::Ui,
    verifier::{self, VerifyOptions},
};

/// An archive path paired with its derived public-key encoding.
#[derive(Debug)]
pub struct ArchiveIdentity {
    pub path: PathBuf,
    pub public_key: String,
}

/// Verifies every archive in input order, printing one OK/FAILURE line
/// per archive. Aborts on the first failure without touching the rest.
pub fn verify_all(
    archives: &[PathBuf],
    opts: &VerifyOptions,
    ui: &Ui,
) -> Result<(), CheckerError> {
    for path in archives {
        match verifier::verify_archive(path, opts, ui) {
            Ok(report) if report.verified() => {
                ui.outcome(&format!("{} verification [   OK   ]", path.display()));
                for warning in report.warnings() {
                    ui.warn(warning);
                }
            }
            Ok(_) => {
                ui.outcome(&format!("{} verification [ FAILURE ]", path.display()));
                return Err(CheckerError::Verification(format!(
                    "{}: archive is unsigned (signatures missing or not parsable)",
                    path.display()
                )));
            }
            Err(e) => {
                ui.outcome(&format!("{} verification [ FAILURE ]", path.display()));
                return Err(CheckerError::Verification(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        }
    }

    ui.success("All archives verified.");
    Ok(())
}

/// Derives each archive's signing identity, then reports adjacent-pair
/// public-key equality, aborting on the first unequal or unusable pair.
pub fn compare_all(archives: &[PathBuf], ui: &Ui) -> Result<(), CheckerError> {
    let work_dir = tempdir()?;

    let mut identities = Vec::with_capacity(archives.len());
    for path in archives {
        identities.push(archive_identity(path, work_dir.path(), ui)?);
    }

    for pair in identities.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);

        // an empty identity means no key was extracted, never a match
        if a.public_key.is_empty() || b.public_key.is_empty() {
            ui.outcome(&format!(
                "no signing identity for {} and {} [ FAILURE ]",
                a.path.display(),
                b.path.display()
            ));
            return Err(CheckerError::Verification(
                "signing identity missing from at least one archive".into(),
            ));
        }

        if a.public_key != b.public_key {
            ui.outcome(&format!(
                "public key not shared for {} and {} [ FAILURE ]",
                a.path.display(),
                b.path.display()
            ));
            return Err(CheckerError::Verification(
                "archives are signed by different identities".into(),
            ));
        }

        ui.outcome(&format!(
            "public key shared for {} and {} [   OK   ]",
            a.path.display(),
            b.path.display()
        ));
    }

    ui.success("Archives refer to the same signing identity.");
    Ok(())
}

fn archive_identity(
    path: &Path,
    work_dir: &Path,
    ui: &Ui,
) -> Result<ArchiveIdentity, CheckerError> {
    let public_key = match extract::stage_signature_block(path, work_dir, ui)? {
        Some(staged) => {
            let block = fs::read(&staged)?;
            pubkey::extract_leaf_public_key(&block)?
        }
        None => String::new(),
    };

    Ok(ArchiveIdentity {
        path: path.to_path_buf(),
        public_key,
    })
}
