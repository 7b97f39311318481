/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! JAR manifest and signature-file (.SF) parsing.
//!
//! Both files share the same format: a main attribute section followed by
//! blank-line-separated `Name:` sections, with long lines folded at 72
//! bytes and continued by a single leading space. Each section's raw bytes
//! are preserved because signature files bind to the manifest by digesting
//! manifest sections exactly as written, not as parsed.

use crate::crypto::CryptoEngine;

/// Digest algorithm named by a manifest attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlg {
    Sha1,
    Sha256,
}

impl DigestAlg {
    /// Base64 digest of `data` under this algorithm, as manifests encode it.
    pub fn digest_b64(&self, data: &[u8]) -> String {
        match self {
            DigestAlg::Sha1 => CryptoEngine::sha1_b64(data),
            DigestAlg::Sha256 => CryptoEngine::sha256_b64(data),
        }
    }
}

/// One attribute section, with the raw bytes it was parsed from.
#[derive(Debug, Clone)]
pub struct Section {
    /// Value of the `Name:` attribute, absent for the main section.
    pub name: Option<String>,
    attrs: Vec<(String, String)>,
    /// Raw section bytes including the terminating blank line(s).
    pub raw: Vec<u8>,
}

impl Section {
    /// Case-insensitive attribute lookup.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// The entry digest recorded in this section. SHA-256 is preferred
    /// over the legacy SHA-1 attribute when both are present.
    pub fn entry_digest(&self) -> Option<(DigestAlg, &str)> {
        if let Some(d) = self.attr("SHA-256-Digest") {
            return Some((DigestAlg::Sha256, d));
        }
        self.attr("SHA1-Digest").map(|d| (DigestAlg::Sha1, d))
    }
}

/// A parsed manifest or signature file.
#[derive(Debug, Clone)]
pub struct JarManifest {
    pub main: Section,
    pub sections: Vec<Section>,
}

impl JarManifest {
    /// Parses manifest bytes leniently: malformed lines are skipped rather
    /// than rejected, matching how archive tooling treats these files.
    pub fn parse(bytes: &[u8]) -> JarManifest {
        let lines = split_lines(bytes);
        let mut chunks: Vec<(usize, usize, Vec<String>)> = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            // skip leading blank lines between sections
            while i < lines.len() && lines[i].text.is_empty() {
                i += 1;
            }
            if i >= lines.len() {
                break;
            }
            let start = lines[i].start;
            let mut texts = Vec::new();
            while i < lines.len() && !lines[i].text.is_empty() {
                texts.push(lines[i].text.clone());
                i += 1;
            }
            // the raw chunk includes the blank line(s) terminating it
            let mut end = lines.get(i - 1).map(|l| l.end).unwrap_or(bytes.len());
            while i < lines.len() && lines[i].text.is_empty() {
                end = lines[i].end;
                i += 1;
            }
            chunks.push((start, end, texts));
        }

        let mut sections: Vec<Section> = chunks
            .into_iter()
            .map(|(start, end, texts)| {
                let attrs = parse_attrs(&unfold(texts));
                let name = attrs
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("Name"))
                    .map(|(_, v)| v.clone());
                Section {
                    name,
                    attrs,
                    raw: bytes[start..end].to_vec(),
                }
            })
            .collect();

        let main = if sections.is_empty() {
            Section {
                name: None,
                attrs: Vec::new(),
                raw: Vec::new(),
            }
        } else {
            sections.remove(0)
        };

        JarManifest { main, sections }
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.name.as_deref() == Some(name))
    }

    /// The whole-manifest digest a signature file binds with
    /// (`X-Digest-Manifest` main attribute).
    pub fn digest_manifest_attr(&self) -> Option<(DigestAlg, &str)> {
        if let Some(d) = self.main.attr("SHA-256-Digest-Manifest") {
            return Some((DigestAlg::Sha256, d));
        }
        self.main
            .attr("SHA1-Digest-Manifest")
            .map(|d| (DigestAlg::Sha1, d))
    }
}

struct Line {
    start: usize,
    end: usize,
    text: String,
}

fn split_lines(bytes: &[u8]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            let mut text_end = i;
            if text_end > start && bytes[text_end - 1] == b'\r' {
                text_end -= 1;
            }
            lines.push(Line {
                start,
                end: i + 1,
                text: String::from_utf8_lossy(&bytes[start..text_end]).into_owned(),
            });
            start = i + 1;
        }
        i += 1;
    }
    if start < bytes.len() {
        lines.push(Line {
            start,
            end: bytes.len(),
            text: String::from_utf8_lossy(&bytes[start..]).into_owned(),
        });
    }
    lines
}

/// Joins folded continuation lines (single leading space) back together.
fn unfold(texts: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in texts {
        if let Some(rest) = line.strip_prefix(' ') {
            if let Some(last) = out.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        out.push(line);
    }
    out
}

fn parse_attrs(lines: &[String]) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    for line in lines {
        if let Some(colon) = line.find(':') {
            let key = line[..colon].trim().to_string();
            let value = line[colon + 1..].trim_start().to_string();
            if !key.is_empty() {
                attrs.push((key, value));
            }
        }
    }
    attrs
}
