//! Small terminal-output helpers shared by every command.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn success(message: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", style("\u{26a0}").yellow().bold(), message);
}

pub fn info(message: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), message);
}

/// Spinner shown while polling `waitForStart`.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or(ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Confirm a destructive action (`kill`, `container kill`) before issuing it.
pub fn confirm(message: &str) -> bool {
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .unwrap_or(false)
}
