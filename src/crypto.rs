/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

use base64::{engine::general_purpose::STANDARD as base64_engine, Engine};
use ring::digest;

/// Digest helpers shared by manifest checking and signature verification.
/// JAR manifests carry base64-encoded digests; PKCS#7 carries raw ones.
pub struct CryptoEngine;

impl CryptoEngine {
    pub fn sha1_b64(data: &[u8]) -> String {
        base64_engine.encode(digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, data).as_ref())
    }

    pub fn sha256_b64(data: &[u8]) -> String {
        base64_engine.encode(digest::digest(&digest::SHA256, data).as_ref())
    }

    pub fn sha1_raw(data: &[u8]) -> Vec<u8> {
        digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, data)
            .as_ref()
            .to_vec()
    }

    pub fn sha256_raw(data: &[u8]) -> Vec<u8> {
        digest::digest(&digest::SHA256, data).as_ref().to_vec()
    }

    pub fn b64(data: &[u8]) -> String {
        base64_engine.encode(data)
    }
}
