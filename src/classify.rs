/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! Classification of archive entry paths into signature machinery versus
//! signable content. Only metadata sitting directly under the top-level
//! `META-INF/` directory counts as signature machinery; same-named files
//! nested deeper are ordinary content and must be signed like any other
//! entry.

use crate::{MANIFEST_NAME, META_INF_DIR, SIG_PREFIX};

/// Returns true when the entry path names part of the signing machinery
/// itself (manifest, signature file, signature block) rather than content
/// requiring signature coverage. Matching is case-insensitive.
pub fn is_signature_related(name: &str) -> bool {
    let uc = name.to_uppercase();

    if uc == MANIFEST_NAME || uc == META_INF_DIR {
        return true;
    }

    if uc.starts_with(SIG_PREFIX) && directly_under_meta_inf(&uc) {
        return true;
    }

    if uc.starts_with(META_INF_DIR) && is_block_or_sf(&uc) {
        // .SF/.DSA/.RSA files in META-INF subdirectories are not
        // signature-related
        return directly_under_meta_inf(&uc);
    }

    false
}

/// True when the entry name carries signature metadata beyond the
/// manifest itself: a signature file or a signature block.
pub fn is_signature_artifact(name: &str) -> bool {
    is_block_or_sf(&name.to_uppercase())
}

/// Signature block or signature file suffix. Only DSA and RSA PKCS#7
/// blocks are supported.
fn is_block_or_sf(uc: &str) -> bool {
    uc.ends_with(".SF") || uc.ends_with(".DSA") || uc.ends_with(".RSA")
}

fn directly_under_meta_inf(uc: &str) -> bool {
    uc.find('/') == uc.rfind('/')
}
