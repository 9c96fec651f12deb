//! Terminal output helpers for the CLI.
//!
//! Colors honor `NO_COLOR` (https://no-color.org/), `CLICOLOR=0` and
//! `CLICOLOR_FORCE`, and are otherwise only enabled when stdout is a TTY.

use colored::{Colorize, control};

pub fn init_colors() {
    let env_set = |name: &str| std::env::var_os(name).is_some();
    let env_is = |name: &str, value: &str| std::env::var(name).is_ok_and(|v| v == value);

    let enabled = if env_set("NO_COLOR") {
        false
    } else if env_set("CLICOLOR_FORCE") && !env_is("CLICOLOR_FORCE", "0") {
        true
    } else if env_is("CLICOLOR", "0") {
        false
    } else {
        std::io::IsTerminal::is_terminal(&std::io::stdout())
    };

    control::set_override(enabled);
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn warn(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Closest known version to `wanted`, if any is reasonably similar.
///
/// `available` holds tag names (`v0.4.1`); the suggestion is returned
/// without the `v`.
pub fn did_you_mean<'a>(wanted: &str, available: &'a [String]) -> Option<&'a str> {
    available
        .iter()
        .map(|tag| tag.strip_prefix('v').unwrap_or(tag))
        .map(|version| (version, strsim::jaro_winkler(wanted, version)))
        .filter(|(_, score)| *score > 0.7)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(version, _)| version)
}
