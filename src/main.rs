// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use log::{error, info, warn};
use moodle_dl::{cli::Cli, error::AppError, logger, run_from_cli, symbols};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let after_help = format!(
        "Examples:\n  # Pick courses from a menu\n  {bin}\n\n  # Download courses 1 and 3 to ~/Lectures without prompts\n  {bin} -u s1234567 -s 1,3 -o ~/Lectures\n\n  # Only list the courses\n  {bin} --list",
        bin = clap::crate_name!()
    );
    let cmd = Cli::command().after_help(after_help);
    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };
    logger::init_logger(args.log_level);

    let cancellation_token = Arc::new(AtomicBool::new(false));
    let handler_token = cancellation_token.clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot listen for Ctrl-C: {}", e);
                return;
            }
            if handler_token.swap(true, Ordering::Relaxed) {
                println!("\nSecond interrupt, exiting now.");
                warn!("Second Ctrl+C, forcing exit");
                std::process::exit(130);
            }
            println!(
                "\n{} Stopping after the current file... Press {} again to force quit.",
                *symbols::WARN,
                *symbols::CTRL_C
            );
            warn!("Cancellation requested with Ctrl+C");
        }
    });

    if let Err(e) = run_from_cli(args, cancellation_token).await {
        match e {
            AppError::UserInterrupt => {
                warn!("Interrupted by user");
                eprintln!("\n{} {}", *symbols::WARN, "Interrupted.".yellow());
                std::process::exit(130);
            }
            AppError::LoginFailed(_) => {
                error!("{}", e);
                eprintln!("\n{} {}", *symbols::ERROR, e.to_string().red());
                eprintln!("{} Check the username and password, or pass --login-url.", *symbols::INFO);
                std::process::exit(1);
            }
            _ => {
                error!("Run failed: {}", e);
                eprintln!("\n{} {}", *symbols::ERROR, format!("Error: {}", e).red());
                std::process::exit(1);
            }
        }
    }
    info!("Exited normally");
}
