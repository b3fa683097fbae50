// src/ui.rs

use crate::{constants, models::ProgressVerb, symbols};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::io::{self, Write};

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

pub fn plain(message: &str) {
    println!("{}", message);
}

pub fn info(message: &str) {
    println!("{} {}", *symbols::INFO, message);
}

pub fn warn(message: &str) {
    println!("{} {}", *symbols::WARN, message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", *symbols::ERROR, message.red());
}

pub fn box_message(title: &str, content: &[&str], color_func: fn(ColoredString) -> ColoredString) {
    println!("\n┌{}┐", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {}", color_func(title.bold()));
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));
    for line in content {
        println!("  {}", line);
    }
    println!("└{}┘", "─".repeat(constants::UI_WIDTH - 2));
}

pub fn prompt(message: &str, default: Option<&str>) -> io::Result<String> {
    let default_str = default
        .filter(|d| !d.is_empty())
        .map_or("".to_string(), |d| format!(" [{}]", d));
    print!("\n>>> {}{}: ", message, default_str);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    let input = input.trim().to_string();
    if input.is_empty() {
        Ok(default.unwrap_or("").to_string())
    } else {
        Ok(input)
    }
}

pub fn confirm(question: &str, default_yes: bool) -> bool {
    let options = if default_yes { "(Y/n)" } else { "(y/N)" };
    loop {
        match prompt(&format!("{} {}", question, options), None) {
            Ok(choice) => {
                let choice = choice.to_lowercase();
                if choice == "y" || choice == "yes" {
                    return true;
                }
                if choice == "n" || choice == "no" {
                    return false;
                }
                if choice.is_empty() {
                    return default_yes;
                }
                println!("{}", "Please answer 'y' or 'n'.".red());
            }
            Err(_) => return false,
        }
    }
}

/// Numbered list of options, one per line.
pub fn print_menu(options: &[String], title: &str) {
    println!("\n┌{}┐", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {}", title.cyan().bold());
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));

    let pad = options.len().to_string().len();
    for (i, option) in options.iter().enumerate() {
        println!(
            "  [{}] {}",
            format!("{:<pad$}", i + 1, pad = pad).yellow(),
            option
        );
    }
    println!("└{}┘", "─".repeat(constants::UI_WIDTH - 2));
}

pub fn prompt_hidden(message: &str) -> io::Result<String> {
    print!("\n>>> {}: ", message);
    io::stdout().flush()?;
    rpassword::read_password()
}

pub fn new_bytes_progress_bar(total_size: u64, prefix: &str) -> ProgressBar {
    let pbar = ProgressBar::new(total_size);
    let style = ProgressStyle::with_template(
        "{prefix:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");
    pbar.set_style(style);
    pbar.set_prefix(prefix.to_string());
    pbar
}

/// `(<current>/<total>) <verb>: <filename>`
pub fn progress_line(current: usize, total: usize, verb: ProgressVerb, filename: &str) -> String {
    format!("({}/{}) {}: {}", current, total, verb, filename)
}

/// Side channel for per-file progress of a download pass.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, current: usize, total: usize, verb: ProgressVerb, filename: &str);
}

/// Prints progress lines to stdout and mirrors them into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn report(&self, current: usize, total: usize, verb: ProgressVerb, filename: &str) {
        let line = progress_line(current, total, verb, filename);
        info!("{}", line);
        let symbol = if verb.is_skip() { &*symbols::SKIP } else { &*symbols::DOWN };
        println!("{} {}", symbol, line);
    }
}
