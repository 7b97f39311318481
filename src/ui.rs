/*
 * ApkCheckerust v1.0.0
 * Copyright (c) 2026 ApkCheckerust contributors.
 * Licensed under the MIT License.
 */

use crate::{APP_AUTHOR, APP_NAME, APP_VERSION};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};

/// Console reporter with verbosity tiers. Diagnostics go to stderr;
/// verdict lines go to stdout so they survive piping.
pub struct Ui {
    pub verbose: bool,
    pub very_verbose: bool,
    pub debug: bool,
    silent: bool,
    colors: bool,
    progress_bar: Arc<Mutex<Option<ProgressBar>>>,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(false, false, false, false, true)
    }
}

impl Ui {
    pub fn new(v: bool, vv: bool, d: bool, s: bool, c: bool) -> Self {
        Self {
            verbose: v,
            very_verbose: vv,
            debug: d,
            silent: s,
            colors: c,
            progress_bar: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_verbosity_level(level: u8, s: bool, c: bool) -> Self {
        Self::new(level >= 1, level >= 2, level >= 3, s, c)
    }

    pub fn show_progress_bar(&self, len: u64, msg: &str) {
        let pb = ProgressBar::new(len);
        let template = format!(
            "{{spinner:.green}} {} {{wide_bar:.green/red}} {{pos}}/{{len}} ({{eta}})",
            msg
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(&["[|]", "[/]", "[-]", "[\\]"])
            .progress_chars("#>-");
        pb.set_style(style);
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        if let Ok(mut g) = self.progress_bar.lock() {
            *g = Some(pb);
        }
    }

    pub fn update_progress(&self, pos: u64) {
        let _ = self.progress_bar.lock().map(|g| {
            if let Some(ref pb) = *g {
                pb.set_position(pos);
            }
        });
    }

    pub fn finish_progress(&self) {
        let _ = self.progress_bar.lock().map(|g| {
            if let Some(ref pb) = *g {
                pb.finish_and_clear();
            }
        });
    }

    pub fn has_progress_bar(&self) -> bool {
        self.progress_bar
            .lock()
            .map(|g| g.is_some())
            .unwrap_or(false)
    }

    fn paint(&self, icon: &str, msg: &str, color: &str, is_error: bool, is_dim: bool) {
        if self.silent && !is_error {
            return;
        }
        let indent = " ".repeat(icon.len() + 1);
        let wrapped = self.wrap_msg(msg, indent.len());
        let lines: Vec<&str> = wrapped.split('\n').collect();

        for (i, line) in lines.iter().enumerate() {
            if self.supports_color() {
                let ic = match color {
                    "31" => icon.red().bold().to_string(),
                    "32" => icon.green().bold().to_string(),
                    "33" => icon.yellow().bold().to_string(),
                    "34" => icon.blue().bold().to_string(),
                    _ => icon.bold().to_string(),
                };
                if i == 0 {
                    if is_dim {
                        eprintln!("{} {}", ic.dimmed(), line.dimmed());
                    } else {
                        eprintln!("{} {}", ic, line.normal());
                    }
                } else if is_dim {
                    eprintln!("{}{}", indent, line.dimmed());
                } else {
                    eprintln!("{}{}", indent, line.normal());
                }
            } else if i == 0 {
                eprintln!("{} {}", icon, line);
            } else {
                eprintln!("{}{}", indent, line);
            }
        }
    }

    pub fn print_banner(&self) {
        if !self.silent && self.verbose {
            self.print_rich_banner();
        }
    }

    pub fn print_rich_banner(&self) {
        let title = format!(" {} v{} ", APP_NAME, APP_VERSION);
        let border = "-".repeat(title.len());
        if self.colors {
            let tb = format!("+-{}-+", border).magenta().bold();
            let mid = format!("| {} |", title.cyan().bold()).blue();
            eprintln!("{}\n{}\n{}", tb, mid, tb);
        } else {
            eprintln!("+-{}-+\n| {} |\n+-{}-+", border, title, border);
        }
    }

    pub fn print_version_info(&self) {
        self.print_rich_banner();
        if self.colors {
            println!("{}", format!("Author:      {}", APP_AUTHOR).yellow());
            println!("{}", "License:     MIT".green());
            println!(
                "{}",
                "Description: Archive signature verification and identity comparison.".magenta()
            );
        } else {
            println!(
                "Author:      {}\nLicense:     MIT\nDescription: Archive signature verification and identity comparison.",
                APP_AUTHOR
            );
        }
    }

    fn supports_color(&self) -> bool {
        std::env::var("NO_COLOR").is_err() && self.colors
    }

    pub fn enable_colors_if_supported(&mut self) {
        #[cfg(windows)]
        if self.colors {
            colored::control::set_override(true);
        }
    }

    pub fn print_mode_header(&self, title: &str) {
        if self.silent || !self.verbose {
            return;
        }
        eprintln!();
        let header = format!("-- {} --", title);
        if self.colors {
            eprintln!("{}", header.yellow().bold());
        } else {
            eprintln!("{}", header);
        }
    }

    pub fn info(&self, msg: &str) {
        if self.verbose {
            self.paint("[i]", msg, "34", false, false);
        }
    }
    pub fn verbose(&self, msg: &str) {
        if self.verbose {
            self.paint("[v]", msg, "2", false, true);
        }
    }
    pub fn very_verbose(&self, msg: &str) {
        if self.very_verbose {
            self.paint("[vv]", msg, "2", false, true);
        }
    }
    pub fn debug(&self, msg: &str) {
        if self.debug {
            self.paint("[dbg]", msg, "2", false, true);
        }
    }
    pub fn success(&self, msg: &str) {
        if !self.silent {
            self.paint("[+]", msg, "32", false, false);
        }
    }
    pub fn warn(&self, msg: &str) {
        if !self.silent {
            self.paint("[!]", msg, "33", true, false);
        }
    }
    pub fn error(&self, msg: &str) {
        self.paint("[x]", msg, "31", true, false);
    }

    /// Verdict line on stdout. Printed regardless of verbosity.
    pub fn outcome(&self, msg: &str) {
        if self.supports_color() {
            println!("{} {}", "[APK CHECKER]".cyan().bold(), msg);
        } else {
            println!("[APK CHECKER] {}", msg);
        }
    }

    fn wrap_msg(&self, msg: &str, indent: usize) -> String {
        let effective_width = self.term_width().saturating_sub(indent).max(20);
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in msg.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed <= effective_width || current.is_empty() {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines.join("\n")
    }

    fn term_width(&self) -> usize {
        std::env::var("COLUMNS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or_else(|| terminal_size::terminal_size().map(|(w, _)| w.0 as usize))
            .unwrap_or(80)
    }
}
