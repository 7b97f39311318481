/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

use crate::{
    compare,
    config::{Config, Mode},
    error::CheckerError,
    ui::Ui,
    verifier::VerifyOptions,
    *,
};
use clap::{Arg, ArgAction, Command};

pub fn build_command(binary_name: String) -> Command {
    Command::new(APP_NAME)
        .bin_name(binary_name)
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .disable_version_flag(true)
        .help_template("{about-with-newline}{usage-heading} {usage}\n\n{all-args}\n")
        .arg_required_else_help(true)
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .value_name("ARCHIVE")
                .num_args(1..)
                .help("Archives to process, in order"),
        )
        .arg(
            Arg::new("verify")
                .short('v')
                .long("verify")
                .action(ArgAction::SetTrue)
                .help("Verify each archive's signatures"),
        )
        .arg(
            Arg::new("compare")
                .short('c')
                .long("compare-pubkey")
                .action(ArgAction::SetTrue)
                .help("Compare the signing public keys of the archives"),
        )
        .arg(
            Arg::new("show_certs")
                .long("show-certs")
                .action(ArgAction::SetTrue)
                .help("Print signer certificates (suppresses expiry warnings)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::Count)
                .help("Set verbosity level (--verbose, repeat for more detail)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppress all output except errors and verdicts"),
        )
        .arg(
            Arg::new("version_custom")
                .short('V')
                .long("version")
                .action(ArgAction::SetTrue)
                .help("Print version information"),
        )
}

pub fn run() -> Result<(), CheckerError> {
    let binary_name = std::env::args()
        .next()
        .and_then(|p| {
            std::path::Path::new(&p)
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| APP_BIN_NAME.to_string());

    let matches = build_command(binary_name).get_matches();

    if matches.get_flag("version_custom") {
        let mut ui = Ui::default();
        ui.enable_colors_if_supported();
        ui.print_version_info();
        return Ok(());
    }

    let verbosity_level = matches.get_count("verbose");
    let quiet = matches.get_flag("quiet");
    let mut ui = Ui::from_verbosity_level(verbosity_level, quiet, true);
    ui.enable_colors_if_supported();

    ui.print_banner();

    let config = Config::from_matches(&matches, &ui)?;

    match config.mode {
        Mode::Verify => {
            ui.print_mode_header("VERIFICATION MODE");
            ui.info(&format!("Verifying {} archive(s)", config.archives.len()));
            let opts = VerifyOptions {
                show_certs: config.show_certs,
            };
            compare::verify_all(&config.archives, &opts, &ui)
        }
        Mode::Compare => {
            ui.print_mode_header("COMPARISON MODE");
            ui.info(&format!(
                "Comparing signing identities of {} archive(s)",
                config.archives.len()
            ));
            compare::compare_all(&config.archives, &ui)
        }
    }
}
