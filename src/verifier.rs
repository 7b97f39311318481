/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! Archive signature verification.
//!
//! Follows the JAR signing model: every content entry is digested in the
//! manifest, the manifest is bound by one or more signature files (.SF),
//! and each signature file is signed by a PKCS#7 block (.RSA/.DSA) whose
//! embedded leaf certificate identifies the signer. Verification streams
//! every entry (checking the container CRC), checks manifest digests
//! against the streamed content, resolves valid signers, and aggregates
//! per-entry signedness and leaf-certificate policy into a report.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::Utc;
use crc32fast::Hasher as Crc32;
use ring::digest;
use ring::signature::{self, UnparsedPublicKey};
use x509_parser::prelude::*;
use zip::ZipArchive;

use crate::{
    classify,
    error::CheckerError,
    manifest::{DigestAlg, JarManifest},
    pkcs7,
    policy::{self, ExpiryFlags, UsageFlags},
    ui::Ui,
    BUFFER_SIZE, MANIFEST_NAME,
};

/// Knobs for a single verification call.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// Print signer certificates instead of classifying their expiry.
    pub show_certs: bool,
}

/// Aggregate verification outcome for one archive. Created fresh per
/// `verify_archive` call and never shared across archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub any_signed: bool,
    pub has_unsigned_entry: bool,
    pub has_expired_cert: bool,
    pub has_expiring_cert: bool,
    pub not_yet_valid_cert: bool,
    pub bad_key_usage: bool,
    pub bad_extended_key_usage: bool,
    pub bad_netscape_cert_type: bool,
    pub manifest_present: bool,
}

impl VerifyReport {
    /// Overall verdict: an archive with no signed entry at all fails.
    pub fn verified(&self) -> bool {
        self.any_signed
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings().is_empty()
    }

    /// Advisory warning lines accompanying a successful verdict.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.bad_key_usage {
            out.push("This archive contains entries whose signer certificate's KeyUsage extension doesn't allow code signing.");
        }
        if self.bad_extended_key_usage {
            out.push("This archive contains entries whose signer certificate's ExtendedKeyUsage extension doesn't allow code signing.");
        }
        if self.bad_netscape_cert_type {
            out.push("This archive contains entries whose signer certificate's NetscapeCertType extension doesn't allow code signing.");
        }
        if self.has_unsigned_entry {
            out.push("This archive contains unsigned entries which have not been integrity-checked.");
        }
        if self.has_expired_cert {
            out.push("This archive contains entries whose signer certificate has expired.");
        }
        if self.has_expiring_cert {
            out.push("This archive contains entries whose signer certificate will expire within six months.");
        }
        if self.not_yet_valid_cert {
            out.push("This archive contains entries whose signer certificate is not yet valid.");
        }
        out
    }
}

/// One streamed entry from the first pass.
struct EntryRecord {
    name: String,
    is_dir: bool,
    sha1_b64: String,
    sha256_b64: String,
}

/// A signature block that parsed and verified, with the entry names it
/// covers. Only the leaf (chain position 0) is ever inspected.
struct ResolvedSigner {
    cert_chain: Vec<Vec<u8>>,
    covered: BTreeSet<String>,
}

/// Verifies the archive at `path` and returns the aggregate report.
///
/// Fails with `CheckerError::Zip`/`Io` when the archive cannot be opened
/// or read, and with `CheckerError::Integrity` when any entry's content
/// contradicts its recorded CRC, or its manifest digest while the archive
/// carries signature metadata. Unparsable signature metadata is never
/// fatal; it leaves entries unsigned.
pub fn verify_archive(
    path: &Path,
    opts: &VerifyOptions,
    ui: &Ui,
) -> Result<VerifyReport, CheckerError> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;

    let (records, metadata) = stream_entries(&mut archive, ui)?;
    drop(archive);

    let mut report = VerifyReport::default();

    let manifest_bytes = metadata
        .iter()
        .find(|(name, _)| name.to_uppercase() == MANIFEST_NAME)
        .map(|(_, bytes)| bytes.clone());

    let Some(manifest_bytes) = manifest_bytes else {
        ui.info("no manifest.");
        return Ok(report);
    };
    report.manifest_present = true;

    let manifest = JarManifest::parse(&manifest_bytes);

    // Digests are enforced the way signed-archive reading enforces them:
    // without any signature file or block the manifest is advisory and a
    // mismatch just leaves the entry unsigned.
    if metadata.keys().any(|n| classify::is_signature_artifact(n)) {
        check_manifest_digests(&manifest, &records)?;
    }

    let signers = resolve_signers(&metadata, &manifest_bytes, &manifest, ui);
    let now_ms = Utc::now().timestamp_millis();

    // Leaf-certificate policy per signer; flags are ORed into the report
    // for every signed entry the signer covers.
    let evaluated: Vec<(UsageFlags, ExpiryFlags, &ResolvedSigner)> = signers
        .iter()
        .map(|signer| {
            let (usage, expiry) = evaluate_leaf(signer, now_ms, opts, ui);
            (usage, expiry, signer)
        })
        .collect();

    for record in &records {
        let mut is_signed = false;

        for (usage, expiry, signer) in &evaluated {
            if !signer.covered.contains(&record.name) {
                continue;
            }
            is_signed = true;
            report.bad_key_usage |= usage.bad_key_usage;
            report.bad_extended_key_usage |= usage.bad_extended_key_usage;
            report.bad_netscape_cert_type |= usage.bad_netscape_cert_type;
            if !opts.show_certs {
                report.has_expired_cert |= expiry.expired;
                report.has_expiring_cert |= expiry.expiring;
                report.not_yet_valid_cert |= expiry.not_yet_valid;
            }
        }

        report.any_signed |= is_signed;
        report.has_unsigned_entry |=
            !record.is_dir && !is_signed && !classify::is_signature_related(&record.name);
    }

    Ok(report)
}

/// First pass: fully reads every entry so the container-level checks run,
/// computing the CRC and the manifest digests in one stream. Signature
/// metadata contents are retained for signer resolution.
fn stream_entries(
    archive: &mut ZipArchive<BufReader<File>>,
    ui: &Ui,
) -> Result<(Vec<EntryRecord>, BTreeMap<String, Vec<u8>>), CheckerError> {
    let mut records = Vec::with_capacity(archive.len());
    let mut metadata: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut buf = vec![0u8; BUFFER_SIZE];

    if ui.verbose {
        ui.show_progress_bar(archive.len() as u64, "Scanning entries");
    }

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        let is_dir = entry.is_dir();
        let stored_crc = entry.crc32();
        let keep_content = classify::is_signature_related(&name) && !is_dir;

        let mut crc = Crc32::new();
        let mut sha1 = digest::Context::new(&digest::SHA1_FOR_LEGACY_USE_ONLY);
        let mut sha256 = digest::Context::new(&digest::SHA256);
        let mut content = Vec::new();

        loop {
            let n = entry.read(&mut buf)?;
            if n == 0 {
                break;
            }
            crc.update(&buf[..n]);
            sha1.update(&buf[..n]);
            sha256.update(&buf[..n]);
            if keep_content {
                content.extend_from_slice(&buf[..n]);
            }
        }

        let computed = crc.finalize();
        if !is_dir && computed != stored_crc {
            return Err(CheckerError::Integrity(format!(
                "CRC mismatch for `{}`: stored={:#010x}, computed={:#010x}",
                name, stored_crc, computed
            )));
        }

        records.push(EntryRecord {
            name: name.clone(),
            is_dir,
            sha1_b64: crate::crypto::CryptoEngine::b64(sha1.finish().as_ref()),
            sha256_b64: crate::crypto::CryptoEngine::b64(sha256.finish().as_ref()),
        });

        if keep_content {
            metadata.insert(name, content);
        }

        if ui.verbose && ui.has_progress_bar() {
            ui.update_progress((i + 1) as u64);
        }
    }

    if ui.verbose && ui.has_progress_bar() {
        ui.finish_progress();
    }

    Ok((records, metadata))
}

/// Every manifest section naming a present entry must match the streamed
/// digest; a mismatch aborts verification of the archive. Sections naming
/// absent entries are ignored.
fn check_manifest_digests(
    manifest: &JarManifest,
    records: &[EntryRecord],
) -> Result<(), CheckerError> {
    let by_name: BTreeMap<&str, &EntryRecord> =
        records.iter().map(|r| (r.name.as_str(), r)).collect();

    for section in &manifest.sections {
        let (Some(name), Some((alg, expected))) = (&section.name, section.entry_digest()) else {
            continue;
        };
        let Some(record) = by_name.get(name.as_str()) else {
            continue;
        };
        let actual = match alg {
            DigestAlg::Sha1 => &record.sha1_b64,
            DigestAlg::Sha256 => &record.sha256_b64,
        };
        if actual != expected {
            return Err(CheckerError::Integrity(format!(
                "manifest digest mismatch for `{}`",
                name
            )));
        }
    }
    Ok(())
}

/// Resolves valid signers from the captured signature metadata. Malformed
/// blocks, missing signature files, failed signatures, and unbound
/// manifests all just drop the signer; they never abort verification.
fn resolve_signers(
    metadata: &BTreeMap<String, Vec<u8>>,
    manifest_bytes: &[u8],
    manifest: &JarManifest,
    ui: &Ui,
) -> Vec<ResolvedSigner> {
    let mut signers = Vec::new();

    for (block_name, block_bytes) in metadata {
        let uc = block_name.to_uppercase();
        if !uc.ends_with(".RSA") && !uc.ends_with(".DSA") {
            continue;
        }

        let Some(sf_bytes) = signature_file_for(&uc, metadata) else {
            ui.verbose(&format!("No signature file next to {}", block_name));
            continue;
        };

        let signed_data = match pkcs7::parse_signed_data(block_bytes) {
            Ok(sd) => sd,
            Err(e) => {
                ui.verbose(&format!("Unparsable signature block {}: {}", block_name, e));
                continue;
            }
        };
        if signed_data.certificates.is_empty() {
            ui.verbose(&format!("{} carries no certificates", block_name));
            continue;
        }

        if !block_signature_verifies(&signed_data, sf_bytes) {
            ui.verbose(&format!("Signature check failed for {}", block_name));
            continue;
        }

        let sf = JarManifest::parse(sf_bytes);
        if !sf_binds_manifest(&sf, manifest_bytes, manifest) {
            ui.verbose(&format!(
                "{} does not bind the manifest; ignoring signer",
                block_name
            ));
            continue;
        }

        let manifest_names: BTreeSet<&str> = manifest
            .sections
            .iter()
            .filter_map(|s| s.name.as_deref())
            .collect();
        let covered = sf
            .sections
            .iter()
            .filter_map(|s| s.name.as_deref())
            .filter(|n| manifest_names.contains(n))
            .map(str::to_string)
            .collect();

        signers.push(ResolvedSigner {
            cert_chain: signed_data.certificates,
            covered,
        });
    }

    signers
}

/// Finds the `.SF` entry paired with a signature block (`CERT.RSA` ->
/// `CERT.SF`), case-insensitively.
fn signature_file_for<'a>(
    block_name_uc: &str,
    metadata: &'a BTreeMap<String, Vec<u8>>,
) -> Option<&'a Vec<u8>> {
    let dot = block_name_uc.rfind('.')?;
    let target = format!("{}.SF", &block_name_uc[..dot]);
    metadata
        .iter()
        .find(|(name, _)| name.to_uppercase() == target)
        .map(|(_, bytes)| bytes)
}

/// Verifies the PKCS#7 signature over the signature-file content. With
/// authenticated attributes the signature covers the attribute SET, whose
/// messageDigest must in turn match the signature file.
fn block_signature_verifies(signed_data: &pkcs7::SignedData, sf_bytes: &[u8]) -> bool {
    for signer in &signed_data.signers {
        let Some(alg) = signer.digest_alg else {
            continue;
        };
        let verify_alg: &dyn signature::VerificationAlgorithm = match alg {
            DigestAlg::Sha1 => &signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
            DigestAlg::Sha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
        };

        let message: &[u8] = match &signer.auth_attrs {
            Some(attrs) => {
                let sf_digest = match alg {
                    DigestAlg::Sha1 => crate::crypto::CryptoEngine::sha1_raw(sf_bytes),
                    DigestAlg::Sha256 => crate::crypto::CryptoEngine::sha256_raw(sf_bytes),
                };
                match &attrs.message_digest {
                    Some(md) if *md == sf_digest => &attrs.der,
                    _ => continue,
                }
            }
            None => sf_bytes,
        };

        for cert_der in &signed_data.certificates {
            let Ok((_, cert)) = X509Certificate::from_der(cert_der) else {
                continue;
            };
            let key_bits = cert.public_key().subject_public_key.data.as_ref();
            let key = UnparsedPublicKey::new(verify_alg, key_bits);
            if key.verify(message, &signer.signature).is_ok() {
                return true;
            }
        }
    }
    false
}

/// A signature file binds the manifest either through its
/// `X-Digest-Manifest` main attribute or, failing that, by matching every
/// per-section digest against the manifest's raw section bytes.
fn sf_binds_manifest(sf: &JarManifest, manifest_bytes: &[u8], manifest: &JarManifest) -> bool {
    if let Some((alg, expected)) = sf.digest_manifest_attr() {
        if alg.digest_b64(manifest_bytes) == expected {
            return true;
        }
    }

    let mut checked_any = false;
    for section in &sf.sections {
        let (Some(name), Some((alg, expected))) = (&section.name, section.entry_digest()) else {
            continue;
        };
        let Some(manifest_section) = manifest.section(name) else {
            return false;
        };
        if alg.digest_b64(&manifest_section.raw) != expected {
            return false;
        }
        checked_any = true;
    }
    checked_any
}

/// Parses and evaluates the signer's leaf certificate. Chain position 0
/// is a deliberate scope limitation; no chain-of-trust walk happens here.
fn evaluate_leaf(
    signer: &ResolvedSigner,
    now_ms: i64,
    opts: &VerifyOptions,
    ui: &Ui,
) -> (UsageFlags, ExpiryFlags) {
    let Some(leaf_der) = signer.cert_chain.first() else {
        return (UsageFlags::default(), ExpiryFlags::default());
    };
    let Ok((_, cert)) = X509Certificate::from_der(leaf_der) else {
        // certificate malformation is reported, never fatal
        ui.verbose("Unparsable leaf certificate; skipping policy checks");
        return (UsageFlags::default(), ExpiryFlags::default());
    };

    let usage = policy::check_cert_usage(&cert);

    if opts.show_certs {
        ui.info(&format!("Signer: {}", cert.subject()));
        ui.info(&format!("Issued by: {}", cert.issuer()));
        ui.info(&format!(
            "Valid from {} until {}",
            cert.validity().not_before,
            cert.validity().not_after
        ));
        return (usage, ExpiryFlags::default());
    }

    let not_before_ms = cert.validity().not_before.timestamp() * 1000;
    let not_after_ms = cert.validity().not_after.timestamp() * 1000;
    let expiry = policy::classify_validity(not_before_ms, not_after_ms, now_ms);

    (usage, expiry)
}
