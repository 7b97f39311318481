/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

//! # ApkCheckerust Library
//!
//! A memory-safe library for verifying the signatures of Android ZIP/APK/JAR
//! archives and comparing the signing identity across several archives. It
//! provides the core functionality for the `apkcheckerust` command-line tool.

pub mod classify;
pub mod cli;
pub mod compare;
pub mod config;
pub mod crypto;
pub mod error;
pub mod extract;
pub mod manifest;
pub mod pkcs7;
pub mod policy;
pub mod pubkey;
pub mod ui;
pub mod verifier;

pub const APP_NAME: &str = "ApkCheckerust";
pub const APP_BIN_NAME: &str = "apkcheckerust";
pub const APP_VERSION: &str = "1.0.0";
pub const APP_AUTHOR: &str = "ApkCheckerust contributors";
pub const APP_ABOUT: &str = "Signature verification and signing-identity comparison for Android ZIP/APK/JAR packages.";
pub const BUFFER_SIZE: usize = 64 * 1024;

pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";
pub const META_INF_DIR: &str = "META-INF/";
pub const SIG_PREFIX: &str = "META-INF/SIG-";
pub const CERT_RSA_NAME: &str = "META-INF/CERT.RSA";

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
