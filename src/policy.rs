/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! Certificate usage policy for code signing.
//!
//! A signer certificate can act as a code signer when all three hold:
//! 1. if KeyUsage is present, the digitalSignature bit is set;
//! 2. if ExtendedKeyUsage is present, it contains anyExtendedKeyUsage or
//!    codeSigning;
//! 3. if NetscapeCertType is present, it contains objectSigning.
//!
//! Absence of an extension is never a failure, and extension parsing quirks
//! are swallowed rather than aborting verification. The evaluator is pure:
//! it returns its verdict instead of accumulating it in shared state.

use x509_parser::extensions::{ExtendedKeyUsage, KeyUsage, ParsedExtension};
use x509_parser::prelude::X509Certificate;

/// OID of anyExtendedKeyUsage.
const OID_ANY_EKU: &str = "2.5.29.37.0";
/// OID of id-kp-codeSigning.
const OID_CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";

/// Six months in milliseconds, the "expiring soon" window.
pub const SIX_MONTHS_MS: i64 = 180 * 24 * 60 * 60 * 1000;

/// Policy verdict for a single leaf certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageFlags {
    pub bad_key_usage: bool,
    pub bad_extended_key_usage: bool,
    pub bad_netscape_cert_type: bool,
}

/// Validity-window classification for a single leaf certificate.
/// `expired` and `expiring` are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryFlags {
    pub expired: bool,
    pub expiring: bool,
    pub not_yet_valid: bool,
}

/// Evaluates whether the certificate is usable for code/archive signing.
pub fn check_cert_usage(cert: &X509Certificate<'_>) -> UsageFlags {
    let mut flags = UsageFlags::default();

    if let Ok(Some(ku)) = cert.key_usage() {
        flags.bad_key_usage = key_usage_is_bad(ku.value);
    }

    // A parse failure on ExtendedKeyUsage is not a policy violation.
    if let Ok(Some(eku)) = cert.extended_key_usage() {
        flags.bad_extended_key_usage = extended_key_usage_is_bad(eku.value);
    }

    // The legacy Netscape certificate type extension; a payload that does
    // not decode leaves the certificate unrestricted.
    for ext in cert.extensions() {
        if let ParsedExtension::NSCertType(cert_type) = ext.parsed_extension() {
            flags.bad_netscape_cert_type = !cert_type.object_signing();
            break;
        }
    }

    flags
}

/// KeyUsage is bad unless the digitalSignature bit (position 0) is set.
pub fn key_usage_is_bad(ku: &KeyUsage) -> bool {
    !ku.digital_signature()
}

/// ExtendedKeyUsage is bad unless it contains anyExtendedKeyUsage
/// (2.5.29.37.0) or codeSigning (1.3.6.1.5.5.7.3.3).
pub fn extended_key_usage_is_bad(eku: &ExtendedKeyUsage<'_>) -> bool {
    if eku.any || eku.code_signing {
        return false;
    }
    !eku.other.iter().any(|oid| {
        let id = oid.to_id_string();
        id == OID_ANY_EKU || id == OID_CODE_SIGNING
    })
}

/// Classifies certificate validity against `now_ms` (Unix milliseconds).
/// Expired takes precedence over the six-month expiring window; a
/// certificate whose validity has not started yet is flagged separately.
pub fn classify_validity(not_before_ms: i64, not_after_ms: i64, now_ms: i64) -> ExpiryFlags {
    let mut flags = ExpiryFlags::default();

    if not_after_ms < now_ms {
        flags.expired = true;
    } else if not_after_ms < now_ms + SIX_MONTHS_MS {
        flags.expiring = true;
    }

    if not_before_ms > now_ms {
        flags.not_yet_valid = true;
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    #[test]
    fn key_usage_without_digital_signature_is_bad() {
        assert!(key_usage_is_bad(&KeyUsage { flags: 0 }));
        // keyEncipherment alone does not allow signing
        assert!(key_usage_is_bad(&KeyUsage { flags: 0b100 }));
        assert!(!key_usage_is_bad(&KeyUsage { flags: 0b1 }));
    }

    #[test]
    fn extended_key_usage_requires_code_signing_or_any() {
        let mut eku = ExtendedKeyUsage {
            any: false,
            server_auth: true,
            client_auth: false,
            code_signing: false,
            email_protection: false,
            time_stamping: false,
            ocsp_signing: false,
            other: Vec::new(),
        };
        assert!(extended_key_usage_is_bad(&eku));

        eku.code_signing = true;
        assert!(!extended_key_usage_is_bad(&eku));

        eku.code_signing = false;
        eku.any = true;
        assert!(!extended_key_usage_is_bad(&eku));
    }

    #[test]
    fn netscape_cert_type_gates_on_object_signing() {
        use x509_parser::extensions::X509Extension;
        use x509_parser::prelude::FromDer;

        // 2.16.840.1.113730.1.1 with an objectSigning BIT STRING payload
        let object_signing: &[u8] = &[
            0x30, 0x11, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x86, 0xf8, 0x42, 0x01, 0x01,
            0x04, 0x04, 0x03, 0x02, 0x04, 0x10,
        ];
        let (_, ext) = X509Extension::from_der(object_signing).unwrap();
        match ext.parsed_extension() {
            ParsedExtension::NSCertType(ct) => assert!(ct.object_signing()),
            other => panic!("unexpected extension: {:?}", other),
        }

        // the same extension carrying sslClient only
        let ssl_client: &[u8] = &[
            0x30, 0x11, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x86, 0xf8, 0x42, 0x01, 0x01,
            0x04, 0x04, 0x03, 0x02, 0x07, 0x80,
        ];
        let (_, ext) = X509Extension::from_der(ssl_client).unwrap();
        match ext.parsed_extension() {
            ParsedExtension::NSCertType(ct) => assert!(!ct.object_signing()),
            other => panic!("unexpected extension: {:?}", other),
        }
    }

    #[test]
    fn validity_window_classification() {
        let now = 1_700_000_000_000;

        let just_expired = classify_validity(0, now - 1000, now);
        assert!(just_expired.expired && !just_expired.expiring);

        let expiring = classify_validity(0, now + 100 * DAY_MS, now);
        assert!(!expiring.expired && expiring.expiring);

        let healthy = classify_validity(0, now + 200 * DAY_MS, now);
        assert_eq!(healthy, ExpiryFlags::default());

        let not_yet = classify_validity(now + DAY_MS, now + 400 * DAY_MS, now);
        assert!(not_yet.not_yet_valid && !not_yet.expired && !not_yet.expiring);
    }

    #[test]
    fn expired_and_expiring_are_mutually_exclusive() {
        let now = 1_700_000_000_000;
        for offset in [-400 * DAY_MS, -1, 0, 1, 90 * DAY_MS, 179 * DAY_MS, 181 * DAY_MS] {
            let flags = classify_validity(0, now + offset, now);
            assert!(!(flags.expired && flags.expiring), "offset {}", offset);
        }
    }
}
