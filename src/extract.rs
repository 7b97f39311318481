/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! Staging of the PKCS#7 signature block out of an archive.

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::{error::CheckerError, ui::Ui, BUFFER_SIZE, CERT_RSA_NAME};

/// Copies the signature block at the conventional `META-INF/CERT.RSA`
/// path out of the archive into `work_dir`, creating intermediate
/// directories as needed. Returns the staged file path, or `None` when
/// the archive carries no such entry.
pub fn stage_signature_block(
    archive_path: &Path,
    work_dir: &Path,
    ui: &Ui,
) -> Result<Option<PathBuf>, CheckerError> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(archive_path)?))?;

    let mut entry = match archive.by_name(CERT_RSA_NAME) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            ui.verbose(&format!(
                "No {} entry in {}",
                CERT_RSA_NAME,
                archive_path.display()
            ));
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let dest = work_dir.join(CERT_RSA_NAME);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = File::create(&dest)?;
    let mut buf = [0u8; BUFFER_SIZE];
    loop {
        let n = entry.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
    }

    ui.verbose(&format!(
        "Staged signature block: {} -> {}",
        archive_path.display(),
        dest.display()
    ));
    Ok(Some(dest))
}
