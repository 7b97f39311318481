/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! PKCS#7 SignedData parsing (CERT.RSA / CERT.DSA blocks).
//!
//! Recovers the embedded certificate chain, each signer's digest
//! algorithm, optional authenticated attributes, and the encrypted
//! digest. The SignedData skeleton is split with a small DER cursor
//! rather than decoded as a whole tree: cert-only blocks carry empty
//! digestAlgorithms and signerInfos SETs, which a whole-tree decode
//! rejects as truncated. Certificates are kept as their exact wire
//! bytes; individual SignerInfo sequences are decoded with
//! `simple_asn1`.

use simple_asn1::{from_der, oid, to_der, ASN1Block, ASN1Class, BigUint};

use crate::{error::CheckerError, manifest::DigestAlg};

const CLASS_UNIVERSAL: u8 = 0;
const CLASS_CONTEXT: u8 = 2;
const TAG_OID: u32 = 0x06;
const TAG_SEQUENCE: u32 = 0x10;
const TAG_SET: u32 = 0x11;

/// Content octets of the signedData content type OID, 1.2.840.113549.1.7.2.
const OID_SIGNED_DATA: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02];

/// A parsed SignedData structure.
#[derive(Debug)]
pub struct SignedData {
    /// DER-encoded certificates in their encoded order. Position 0 is
    /// treated as the leaf.
    pub certificates: Vec<Vec<u8>>,
    pub signers: Vec<SignerInfo>,
}

/// One SignerInfo entry.
#[derive(Debug)]
pub struct SignerInfo {
    pub digest_alg: Option<DigestAlg>,
    pub auth_attrs: Option<AuthAttrs>,
    /// The encryptedDigest octets.
    pub signature: Vec<u8>,
}

/// Authenticated attributes, re-encoded as the SET OF that was signed.
#[derive(Debug)]
pub struct AuthAttrs {
    pub der: Vec<u8>,
    pub message_digest: Option<Vec<u8>>,
}

/// One DER value with its identifier and length octets decoded.
struct Tlv<'a> {
    class: u8,
    constructed: bool,
    tag: u32,
    /// The full encoding, identifier and length octets included.
    raw: &'a [u8],
    content: &'a [u8],
}

impl Tlv<'_> {
    fn is(&self, class: u8, tag: u32) -> bool {
        self.class == class && self.tag == tag
    }
}

/// Reads one TLV off the front of `buf`. Indefinite lengths are not DER
/// and are rejected.
fn read_tlv(buf: &[u8]) -> Option<(Tlv<'_>, &[u8])> {
    let first = *buf.first()?;
    let class = first >> 6;
    let constructed = first & 0x20 != 0;
    let mut idx = 1usize;

    let mut tag = u32::from(first & 0x1f);
    if tag == 0x1f {
        tag = 0;
        loop {
            let b = *buf.get(idx)?;
            idx += 1;
            tag = tag.checked_mul(128)? | u32::from(b & 0x7f);
            if b & 0x80 == 0 {
                break;
            }
        }
    }

    let len_octet = *buf.get(idx)?;
    idx += 1;
    let len = if len_octet & 0x80 == 0 {
        usize::from(len_octet)
    } else {
        let count = usize::from(len_octet & 0x7f);
        if count == 0 {
            return None;
        }
        let mut len = 0usize;
        for _ in 0..count {
            len = len.checked_mul(256)?.checked_add(usize::from(*buf.get(idx)?))?;
            idx += 1;
        }
        len
    };

    let end = idx.checked_add(len)?;
    if end > buf.len() {
        return None;
    }
    Some((
        Tlv {
            class,
            constructed,
            tag,
            raw: &buf[..end],
            content: &buf[idx..end],
        },
        &buf[end..],
    ))
}

/// Splits constructed content into its immediate children. Zero-length
/// content is a legal empty SET/SEQUENCE and yields no children.
fn der_children(content: &[u8]) -> Option<Vec<Tlv<'_>>> {
    let mut out = Vec::new();
    let mut rest = content;
    while !rest.is_empty() {
        let (tlv, next) = read_tlv(rest)?;
        out.push(tlv);
        rest = next;
    }
    Some(out)
}

/// Parses a signature block as PKCS#7 SignedData.
pub fn parse_signed_data(der: &[u8]) -> Result<SignedData, CheckerError> {
    let content_info = match read_tlv(der) {
        Some((tlv, _)) if tlv.constructed && tlv.is(CLASS_UNIVERSAL, TAG_SEQUENCE) => tlv,
        _ => {
            return Err(CheckerError::Decode(
                "PKCS7: not a ContentInfo sequence".into(),
            ))
        }
    };
    let fields = der_children(content_info.content)
        .ok_or_else(|| CheckerError::Decode("PKCS7: malformed ContentInfo".into()))?;

    match fields.first() {
        Some(t) if t.is(CLASS_UNIVERSAL, TAG_OID) && t.content == OID_SIGNED_DATA => {}
        _ => {
            return Err(CheckerError::Decode(
                "PKCS7: content type is not signedData".into(),
            ))
        }
    }

    let signed_data = fields
        .get(1)
        .filter(|t| t.constructed && t.is(CLASS_CONTEXT, 0))
        .and_then(|t| der_children(t.content))
        .and_then(|mut inner| match (inner.pop(), inner.is_empty()) {
            (Some(sd), true) if sd.is(CLASS_UNIVERSAL, TAG_SEQUENCE) => Some(sd),
            _ => None,
        })
        .ok_or_else(|| CheckerError::Decode("PKCS7: missing SignedData content".into()))?;

    let sd_fields = der_children(signed_data.content)
        .ok_or_else(|| CheckerError::Decode("PKCS7: malformed SignedData".into()))?;

    let mut certificates = Vec::new();
    let mut signers = Vec::new();

    // version, digestAlgorithms and encapContentInfo come first; the
    // optional [0] certificates and [1] crls follow; signerInfos is the
    // trailing SET.
    for (idx, field) in sd_fields.iter().enumerate() {
        if idx < 3 {
            continue;
        }
        if field.constructed && field.is(CLASS_CONTEXT, 0) {
            certificates = collect_certificates(field.content)?;
        } else if idx == sd_fields.len() - 1 && field.is(CLASS_UNIVERSAL, TAG_SET) {
            for info in der_children(field.content).unwrap_or_default() {
                if !info.is(CLASS_UNIVERSAL, TAG_SEQUENCE) {
                    continue;
                }
                // a malformed signer drops that signer, never the block
                if let Some(signer) = parse_signer_info(info.raw) {
                    signers.push(signer);
                }
            }
        }
    }

    Ok(SignedData {
        certificates,
        signers,
    })
}

/// The certificates field is `[0] IMPLICIT SET OF Certificate` from most
/// producers, but some wrap the SET explicitly; either way each
/// certificate surfaces as its exact wire bytes.
fn collect_certificates(content: &[u8]) -> Result<Vec<Vec<u8>>, CheckerError> {
    let blocks = der_children(content)
        .ok_or_else(|| CheckerError::Decode("PKCS7: malformed certificates field".into()))?;

    let mut certs = Vec::new();
    for block in blocks {
        if block.is(CLASS_UNIVERSAL, TAG_SET) {
            for cert in der_children(block.content).unwrap_or_default() {
                if cert.is(CLASS_UNIVERSAL, TAG_SEQUENCE) {
                    certs.push(cert.raw.to_vec());
                }
            }
        } else if block.is(CLASS_UNIVERSAL, TAG_SEQUENCE) {
            certs.push(block.raw.to_vec());
        }
    }
    Ok(certs)
}

fn parse_signer_info(raw: &[u8]) -> Option<SignerInfo> {
    let oid_sha1 = oid!(1, 3, 14, 3, 2, 26);
    let oid_sha256 = oid!(2, 16, 840, 1, 101, 3, 4, 2, 1);

    let blocks = from_der(raw).ok()?;
    let fields = match blocks.first() {
        Some(ASN1Block::Sequence(_, fields)) => fields,
        _ => return None,
    };

    // fields: version, issuerAndSerialNumber, digestAlgorithm,
    // [0] authenticatedAttributes?, digestEncryptionAlgorithm,
    // encryptedDigest, [1] unauthenticatedAttributes?
    let digest_alg = fields.get(2).and_then(|b| match b {
        ASN1Block::Sequence(_, alg) => alg.first().and_then(|a| match a {
            ASN1Block::ObjectIdentifier(_, oid) if *oid == oid_sha1 => Some(DigestAlg::Sha1),
            ASN1Block::ObjectIdentifier(_, oid) if *oid == oid_sha256 => Some(DigestAlg::Sha256),
            _ => None,
        }),
        _ => None,
    });

    let mut auth_attrs = None;
    for field in fields.iter().skip(3) {
        if let Some(attrs) = context_blocks(field, 0) {
            auth_attrs = Some(parse_auth_attrs(attrs)?);
            break;
        }
    }

    let signature = fields.iter().rev().find_map(|b| match b {
        ASN1Block::OctetString(_, bytes) => Some(bytes.clone()),
        _ => None,
    })?;

    Some(SignerInfo {
        digest_alg,
        auth_attrs,
        signature,
    })
}

fn parse_auth_attrs(blocks: Vec<ASN1Block>) -> Option<AuthAttrs> {
    let oid_message_digest = oid!(1, 2, 840, 113549, 1, 9, 4);

    // Normalize to the SET OF Attribute that was actually signed: the
    // implicit [0] tag on the wire replaces the SET tag.
    let attrs = match blocks.as_slice() {
        [ASN1Block::Set(_, inner)] => inner.clone(),
        _ => blocks,
    };

    let der = to_der(&ASN1Block::Set(0, attrs.clone())).ok()?;

    let mut message_digest = None;
    for attr in &attrs {
        if let ASN1Block::Sequence(_, parts) = attr {
            let is_md = matches!(
                parts.first(),
                Some(ASN1Block::ObjectIdentifier(_, oid)) if *oid == oid_message_digest
            );
            if is_md {
                if let Some(ASN1Block::Set(_, values)) = parts.get(1) {
                    if let Some(ASN1Block::OctetString(_, bytes)) = values.first() {
                        message_digest = Some(bytes.clone());
                    }
                }
            }
        }
    }

    Some(AuthAttrs {
        der,
        message_digest,
    })
}

/// Resolves a context-specific field with the given tag to its contained
/// blocks, accepting both the `Unknown` raw form and an `Explicit`
/// wrapper. Zero-length content resolves to no blocks.
fn context_blocks(block: &ASN1Block, tag: u32) -> Option<Vec<ASN1Block>> {
    let wanted = BigUint::from(tag);
    match block {
        ASN1Block::Unknown(ASN1Class::ContextSpecific, _, _, t, content) if *t == wanted => {
            if content.is_empty() {
                Some(Vec::new())
            } else {
                from_der(content).ok()
            }
        }
        ASN1Block::Explicit(ASN1Class::ContextSpecific, _, t, inner) if *t == wanted => {
            Some(vec![(**inner).clone()])
        }
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use simple_asn1::BigInt;

    pub(crate) fn empty_signed_data() -> Vec<u8> {
        signed_data_with_certificates(&[])
    }

    /// Builds a cert-only SignedData block: empty digestAlgorithms and
    /// signerInfos SETs, the given DER certificates under the implicit
    /// `[0]` tag.
    pub(crate) fn signed_data_with_certificates(certs: &[&[u8]]) -> Vec<u8> {
        let oid_signed_data = oid!(1, 2, 840, 113549, 1, 7, 2);
        let oid_data = oid!(1, 2, 840, 113549, 1, 7, 1);

        let mut fields = vec![
            ASN1Block::Integer(0, BigInt::from(1u32)),
            ASN1Block::Set(0, vec![]),
            ASN1Block::Sequence(0, vec![ASN1Block::ObjectIdentifier(0, oid_data)]),
        ];
        if !certs.is_empty() {
            let mut raw = Vec::new();
            for cert in certs {
                raw.extend_from_slice(cert);
            }
            fields.push(ASN1Block::Unknown(
                ASN1Class::ContextSpecific,
                true,
                0,
                BigUint::from(0u32),
                raw,
            ));
        }
        fields.push(ASN1Block::Set(0, vec![]));

        let content_info = ASN1Block::Sequence(
            0,
            vec![
                ASN1Block::ObjectIdentifier(0, oid_signed_data),
                ASN1Block::Explicit(
                    ASN1Class::ContextSpecific,
                    0,
                    BigUint::from(0u32),
                    Box::new(ASN1Block::Sequence(0, fields)),
                ),
            ],
        );
        to_der(&content_info).unwrap()
    }

    #[test]
    fn parses_signed_data_without_certificates() {
        let der = empty_signed_data();
        let parsed = parse_signed_data(&der).unwrap();
        assert!(parsed.certificates.is_empty());
        assert!(parsed.signers.is_empty());
    }

    #[test]
    fn parses_cert_only_signed_data() {
        // a cert-only bundle has no signers, only the chain
        let cert: &[u8] = &[0x30, 0x03, 0x02, 0x01, 0x07];
        let other: &[u8] = &[0x30, 0x03, 0x02, 0x01, 0x2a];
        let der = signed_data_with_certificates(&[cert, other]);

        let parsed = parse_signed_data(&der).unwrap();
        assert_eq!(parsed.certificates, vec![cert.to_vec(), other.to_vec()]);
        assert!(parsed.signers.is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_signed_data(b"not a pkcs7 structure at all").is_err());
        assert!(parse_signed_data(&[]).is_err());
    }

    #[test]
    fn rejects_wrong_content_type() {
        let oid_data = oid!(1, 2, 840, 113549, 1, 7, 1);
        let der = to_der(&ASN1Block::Sequence(
            0,
            vec![ASN1Block::ObjectIdentifier(0, oid_data)],
        ))
        .unwrap();
        assert!(parse_signed_data(&der).is_err());
    }

    #[test]
    fn reads_long_form_lengths() {
        // a SET whose content pushes the outer lengths past 127 bytes
        let filler: Vec<u8> = (0..200u16).map(|i| i as u8).collect();
        let cert_body = ASN1Block::Sequence(0, vec![ASN1Block::OctetString(0, filler)]);
        let cert_der = to_der(&cert_body).unwrap();
        assert!(cert_der.len() > 127);

        let der = signed_data_with_certificates(&[&cert_der]);
        let parsed = parse_signed_data(&der).unwrap();
        assert_eq!(parsed.certificates, vec![cert_der]);
    }
}
