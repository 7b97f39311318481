/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! Signing-identity extraction from a PKCS#7 signature block.

use x509_parser::prelude::*;

use crate::{crypto::CryptoEngine, error::CheckerError, pkcs7};

/// Extracts a stable textual encoding of the leaf public key from a
/// signature-block blob: the base64 encoding of the first embedded
/// certificate's SubjectPublicKeyInfo DER.
///
/// Returns an empty string when no certificate carries a usable public
/// key; callers must treat that as "no identity extracted", never as a
/// valid comparison value.
pub fn extract_leaf_public_key(block: &[u8]) -> Result<String, CheckerError> {
    let signed_data = pkcs7::parse_signed_data(block)?;

    for cert_der in &signed_data.certificates {
        let Ok((_, cert)) = X509Certificate::from_der(cert_der) else {
            continue;
        };
        let spki = cert.public_key().raw;
        if !spki.is_empty() {
            return Ok(CryptoEngine::b64(spki));
        }
    }

    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_block_is_a_decode_error() {
        assert!(extract_leaf_public_key(b"garbage").is_err());
    }

    #[test]
    fn signed_data_without_certificates_yields_empty_identity() {
        let der = crate::pkcs7::tests::empty_signed_data();
        assert_eq!(extract_leaf_public_key(&der).unwrap(), "");
    }
}
