use std::fs;
use std::io::Write;
use std::path::Path;

use apkcheckerust::compare;
use apkcheckerust::crypto::CryptoEngine;
use apkcheckerust::error::CheckerError;
use apkcheckerust::extract;
use apkcheckerust::pubkey;
use apkcheckerust::ui::Ui;
use apkcheckerust::verifier::{self, VerifyOptions, VerifyReport};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use simple_asn1::{oid, to_der, ASN1Block, ASN1Class, BigInt, BigUint};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// Amazon Root CA 3 (EC P-256), DER.
const CERT_A_B64: &str = "\
MIIBtjCCAVugAwIBAgITBmyf1XSXNmY/Owua2eiedgPySjAKBggqhkjOPQQDAjA5\
MQswCQYDVQQGEwJVUzEPMA0GA1UEChMGQW1hem9uMRkwFwYDVQQDExBBbWF6b24g\
Um9vdCBDQSAzMB4XDTE1MDUyNjAwMDAwMFoXDTQwMDUyNjAwMDAwMFowOTELMAkG\
A1UEBhMCVVMxDzANBgNVBAoTBkFtYXpvbjEZMBcGA1UEAxMQQW1hem9uIFJvb3Qg\
Q0EgMzBZMBMGByqGSM49AgEGCCqGSM49AwEHA0IABCmXp8ZBf8ANm+gBG1bG8lKl\
ui2yEujSLtf6ycXYqm0fc4E7O5hrOXwzpcVOho6AF2hiRVd9RFgdszflZwjrZt6j\
QjBAMA8GA1UdEwEB/wQFMAMBAf8wDgYDVR0PAQH/BAQDAgGGMB0GA1UdDgQWBBSr\
ttvXBp43rDCGB5Fwx5zEGbF4wDAKBggqhkjOPQQDAgNJADBGAiEA4IWSoxe3jfkr\
BqWTrBqYaGFy+uGh0PsceGCmQ5nFuMQCIQCcAu/xlJyzlvnrxir4tiz+OpAUFteM\
YyRIHN8wfdVoOw==";

// GlobalSign ECC Root CA R4 (EC P-256), DER.
const CERT_B_B64: &str = "\
MIIB3DCCAYOgAwIBAgINAgPlfvU/k/2lCSGypjAKBggqhkjOPQQDAjBQMSQwIgYD\
VQQLExtHbG9iYWxTaWduIEVDQyBSb290IENBIC0gUjQxEzARBgNVBAoTCkdsb2Jh\
bFNpZ24xEzARBgNVBAMTCkdsb2JhbFNpZ24wHhcNMTIxMTEzMDAwMDAwWhcNMzgw\
MTE5MDMxNDA3WjBQMSQwIgYDVQQLExtHbG9iYWxTaWduIEVDQyBSb290IENBIC0g\
UjQxEzARBgNVBAoTCkdsb2JhbFNpZ24xEzARBgNVBAMTCkdsb2JhbFNpZ24wWTAT\
BgcqhkjOPQIBBggqhkjOPQMBBwNCAAS4xnnTj2wlDp8uORkcA6SumuU5BwkWymOx\
uYb4ilfBV85C+nOh92VC/x7BALJucw7/xyHlGKSq2XE/qNS5zowdo0IwQDAOBgNV\
HQ8BAf8EBAMCAYYwDwYDVR0TAQH/BAUwAwEB/zAdBgNVHQ4EFgQUVLB7rUW44kB/\
+wpu+74zyTyjhNUwCgYIKoZIzj0EAwIDRwAwRAIgIk90crlgr/HmnKAWBVBfw147\
bmF0774BxL4YSFlhgjICICadVGNA3jdgUM/I2O2dgq43mLyjj0xMqTQrbO/7lZsm";

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = fs::File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(name.trim_end_matches('/'), options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap();
}

/// Wraps a DER certificate in a cert-only PKCS#7 SignedData block, the
/// shape `openssl crl2pkcs7` produces: no signers, just the chain.
fn cert_only_pkcs7(cert_der: &[u8]) -> Vec<u8> {
    let signed_data = ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::Integer(0, BigInt::from(1u32)),
            ASN1Block::Set(0, vec![]),
            ASN1Block::Sequence(
                0,
                vec![ASN1Block::ObjectIdentifier(0, oid!(1, 2, 840, 113549, 1, 7, 1))],
            ),
            ASN1Block::Unknown(
                ASN1Class::ContextSpecific,
                true,
                0,
                BigUint::from(0u32),
                cert_der.to_vec(),
            ),
            ASN1Block::Set(0, vec![]),
        ],
    );
    let content_info = ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::ObjectIdentifier(0, oid!(1, 2, 840, 113549, 1, 7, 2)),
            ASN1Block::Explicit(
                ASN1Class::ContextSpecific,
                0,
                BigUint::from(0u32),
                Box::new(signed_data),
            ),
        ],
    );
    to_der(&content_info).unwrap()
}

fn cert_der(cert_b64: &str) -> Vec<u8> {
    STANDARD.decode(cert_b64).unwrap()
}

fn archive_with_block(dir: &Path, name: &str, block: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    write_zip(
        &path,
        &[("META-INF/CERT.RSA", block), ("classes.dex", b"dex bytes")],
    );
    path
}

fn manifest_for(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"Manifest-Version: 1.0\r\n\r\n");
    for (name, content) in entries {
        let digest = CryptoEngine::sha1_b64(content);
        out.extend_from_slice(format!("Name: {}\r\n", name).as_bytes());
        out.extend_from_slice(format!("SHA1-Digest: {}\r\n\r\n", digest).as_bytes());
    }
    out
}

#[test]
fn unsigned_archive_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.zip");
    write_zip(
        &path,
        &[("com/app/Main.class", b"class bytes"), ("assets/a.txt", b"hello")],
    );

    let report = verifier::verify_archive(&path, &VerifyOptions::default(), &Ui::default()).unwrap();
    assert!(!report.verified());
    assert!(!report.manifest_present);
}

#[test]
fn manifest_without_signature_block_is_still_unsigned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest-only.zip");
    let content: &[(&str, &[u8])] = &[("com/app/Main.class", b"class bytes")];
    let manifest = manifest_for(content);
    write_zip(
        &path,
        &[
            ("META-INF/MANIFEST.MF", manifest.as_slice()),
            ("com/app/Main.class", b"class bytes"),
        ],
    );

    let report = verifier::verify_archive(&path, &VerifyOptions::default(), &Ui::default()).unwrap();
    assert!(report.manifest_present);
    assert!(!report.verified());
}

#[test]
fn manifest_digest_mismatch_is_an_integrity_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tampered.zip");
    let manifest =
        b"Manifest-Version: 1.0\r\n\r\nName: com/app/Main.class\r\nSHA1-Digest: bm90IHRoZSByaWdodCBkaWdlc3Q=\r\n\r\n";
    write_zip(
        &path,
        &[
            ("META-INF/MANIFEST.MF", manifest.as_slice()),
            ("META-INF/CERT.SF", b"Signature-Version: 1.0\r\n\r\n"),
            ("META-INF/CERT.RSA", b"definitely not pkcs7"),
            ("com/app/Main.class", b"tampered content"),
        ],
    );

    let err =
        verifier::verify_archive(&path, &VerifyOptions::default(), &Ui::default()).unwrap_err();
    assert!(matches!(err, CheckerError::Integrity(_)), "{}", err);
}

#[test]
fn manifest_mismatch_without_signature_metadata_is_just_unsigned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stale-manifest.zip");
    let manifest =
        b"Manifest-Version: 1.0\r\n\r\nName: com/app/Main.class\r\nSHA1-Digest: bm90IHRoZSByaWdodCBkaWdlc3Q=\r\n\r\n";
    write_zip(
        &path,
        &[
            ("META-INF/MANIFEST.MF", manifest.as_slice()),
            ("com/app/Main.class", b"tampered content"),
        ],
    );

    // with no signature file or block the manifest digests are advisory
    let report = verifier::verify_archive(&path, &VerifyOptions::default(), &Ui::default()).unwrap();
    assert!(!report.verified());
    assert!(report.has_unsigned_entry);
}

#[test]
fn garbage_signature_block_leaves_archive_unsigned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage-block.zip");
    let content: &[(&str, &[u8])] = &[("com/app/Main.class", b"class bytes")];
    let manifest = manifest_for(content);
    write_zip(
        &path,
        &[
            ("META-INF/MANIFEST.MF", manifest.as_slice()),
            ("META-INF/CERT.SF", b"Signature-Version: 1.0\r\n\r\n"),
            ("META-INF/CERT.RSA", b"definitely not pkcs7"),
            ("com/app/Main.class", b"class bytes"),
        ],
    );

    // unparsable signatures are not fatal; the archive is just unsigned
    let report = verifier::verify_archive(&path, &VerifyOptions::default(), &Ui::default()).unwrap();
    assert!(!report.verified());
    assert!(report.has_unsigned_entry);
}

#[test]
fn directories_never_count_as_unsigned_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dirs-only.zip");
    let manifest = b"Manifest-Version: 1.0\r\n\r\n";
    write_zip(
        &path,
        &[
            ("META-INF/MANIFEST.MF", manifest.as_slice()),
            ("assets/", b""),
            ("res/", b""),
        ],
    );

    let report = verifier::verify_archive(&path, &VerifyOptions::default(), &Ui::default()).unwrap();
    assert!(!report.has_unsigned_entry);
}

#[test]
fn reverification_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twice.zip");
    let content: &[(&str, &[u8])] = &[("com/app/Main.class", b"class bytes")];
    let manifest = manifest_for(content);
    write_zip(
        &path,
        &[
            ("META-INF/MANIFEST.MF", manifest.as_slice()),
            ("com/app/Main.class", b"class bytes"),
        ],
    );

    let ui = Ui::default();
    let opts = VerifyOptions::default();
    let first = verifier::verify_archive(&path, &opts, &ui).unwrap();
    let second = verifier::verify_archive(&path, &opts, &ui).unwrap();
    assert_eq!(first, second);
}

#[test]
fn signature_block_staging_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("with-block.zip");
    let block: &[u8] = b"\x30\x03\x02\x01\x01";
    write_zip(&path, &[("META-INF/CERT.RSA", block), ("a.txt", b"a")]);

    let work = tempfile::tempdir().unwrap();
    let staged = extract::stage_signature_block(&path, work.path(), &Ui::default())
        .unwrap()
        .expect("block should be staged");
    assert_eq!(fs::read(staged).unwrap(), block);
}

#[test]
fn staging_without_block_produces_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-block.zip");
    write_zip(&path, &[("a.txt", b"a")]);

    let work = tempfile::tempdir().unwrap();
    let staged = extract::stage_signature_block(&path, work.path(), &Ui::default()).unwrap();
    assert!(staged.is_none());
}

#[test]
fn cert_only_block_yields_a_nonempty_identity() {
    let block = cert_only_pkcs7(&cert_der(CERT_A_B64));
    let identity = pubkey::extract_leaf_public_key(&block).unwrap();
    assert!(!identity.is_empty());
    assert_eq!(
        identity,
        pubkey::extract_leaf_public_key(&block).unwrap()
    );
}

#[test]
fn comparing_matching_identities_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let block = cert_only_pkcs7(&cert_der(CERT_A_B64));
    let a = archive_with_block(dir.path(), "a.zip", &block);
    let b = archive_with_block(dir.path(), "b.zip", &block);

    compare::compare_all(&[a, b], &Ui::default()).unwrap();
}

#[test]
fn comparator_aborts_on_first_differing_identity() {
    let dir = tempfile::tempdir().unwrap();
    let shared = cert_only_pkcs7(&cert_der(CERT_A_B64));
    let different = cert_only_pkcs7(&cert_der(CERT_B_B64));
    let a = archive_with_block(dir.path(), "a.zip", &shared);
    let b = archive_with_block(dir.path(), "b.zip", &shared);
    let c = archive_with_block(dir.path(), "c.zip", &different);

    // the first two archives share a key, so the run must get past pair
    // (a, b) and abort at (b, c) over differing identities
    let err = compare::compare_all(&[a, b, c], &Ui::default()).unwrap_err();
    match err {
        CheckerError::Verification(msg) => assert!(msg.contains("different"), "{}", msg),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn comparing_unsigned_archives_fails() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.zip");
    let b = dir.path().join("b.zip");
    write_zip(&a, &[("a.txt", b"a")]);
    write_zip(&b, &[("b.txt", b"b")]);

    // no extractable identity must never compare as equal
    let err = compare::compare_all(&[a, b], &Ui::default()).unwrap_err();
    assert!(matches!(err, CheckerError::Verification(_)), "{}", err);
}

#[test]
fn verify_run_aborts_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let unsigned = dir.path().join("unsigned.zip");
    write_zip(&unsigned, &[("a.txt", b"a")]);

    let err = compare::verify_all(
        &[unsigned, dir.path().join("never-opened.zip")],
        &VerifyOptions::default(),
        &Ui::default(),
    )
    .unwrap_err();
    // the second archive does not even need to exist: the run stops first
    assert!(matches!(err, CheckerError::Verification(_)), "{}", err);
}

#[test]
fn warning_lines_follow_the_report_flags() {
    let report = VerifyReport {
        any_signed: true,
        has_unsigned_entry: true,
        has_expired_cert: true,
        ..VerifyReport::default()
    };
    let warnings = report.warnings();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().any(|w| w.contains("unsigned entries")));
    assert!(warnings.iter().any(|w| w.contains("has expired")));

    assert!(!VerifyReport::default().has_warnings());
}
