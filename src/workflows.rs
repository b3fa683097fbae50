// src/workflows.rs

use crate::{
    CrawlContext,
    config::credentials,
    constants,
    downloader::LectureDownloader,
    error::{AppError, AppResult},
    models::Course,
    symbols, ui, utils,
};
use colored::*;
use log::{error, info, warn};
use std::{fs, path::PathBuf};

/// Home page -> course menu -> selection -> destination -> downloads.
pub(crate) async fn run_session(context: CrawlContext) -> AppResult<()> {
    let navigator = context.navigator();
    let courses = navigator.list_courses(&context.config.home_url).await?;
    if courses.is_empty() {
        ui::warn("No courses were found on the home page.");
        return Ok(());
    }

    let names: Vec<String> = courses
        .iter()
        .map(|c| utils::truncate_text(&c.name, constants::COURSE_NAME_TRUNCATE_LENGTH))
        .collect();
    ui::print_menu(&names, &format!("Courses ({})", courses.len()));
    if context.args.list {
        return Ok(());
    }

    let selected = select_courses(&context, &courses)?;
    if selected.is_empty() {
        ui::info("Nothing selected.");
        return Ok(());
    }
    let root = choose_destination(&context)?;

    ui::print_header(&format!(
        "Downloading {} course(s) (press {} to stop)",
        selected.len(),
        *symbols::CTRL_C
    ));
    let downloader = LectureDownloader::new(context.clone());
    let mut running_total = 0;
    for course in selected {
        if context.is_cancelled() {
            return Err(AppError::UserInterrupt);
        }
        ui::print_sub_header(&course.name);

        let discovery = match navigator.resolve_pages(course).await {
            Ok(discovery) => discovery,
            Err(e) => {
                error!("Resolving lecture pages of '{}' failed: {}", course.name, e);
                ui::error(&format!("Skipping course '{}': {}", course.name, e));
                continue;
            }
        };
        for failure in &discovery.failures {
            ui::warn(&format!("{}: {}", failure.label, failure.error));
        }
        if discovery.pages.is_empty() {
            ui::info("No lecture pages found.");
            continue;
        }

        let course_start = running_total;
        for page in &discovery.pages {
            let directory = utils::lecture_directory(&root, &course.name, &page.week_label);
            if let Err(e) = fs::create_dir_all(&directory) {
                error!("Cannot create {:?}: {}", directory, e);
                ui::error(&format!("{}: cannot create {}: {}", page.week_label, directory.display(), e));
                continue;
            }
            ui::info(&format!("{} -> {}", page.week_label.bold(), directory.display()));

            match downloader.download_all(&directory, &page.url, running_total).await {
                Ok(total) => running_total = total,
                Err(AppError::UserInterrupt) => return Err(AppError::UserInterrupt),
                Err(e) => {
                    error!("Download pass for {} failed: {}", page.url, e);
                    ui::error(&format!("{}: {}", page.week_label, e));
                }
            }
        }
        println!(
            "{} {}: {} new file(s).",
            *symbols::OK,
            course.name,
            running_total - course_start
        );
    }

    context.manager.print_report();
    info!("Session finished, {} files downloaded", running_total);
    println!(
        "\n{} {}",
        *symbols::OK,
        format!("Download complete! {} files downloaded.", running_total).green()
    );
    Ok(())
}

fn select_courses<'a>(context: &CrawlContext, courses: &'a [Course]) -> AppResult<Vec<&'a Course>> {
    if let Some(selection) = &context.args.select {
        let indices = utils::parse_selection(selection, courses.len())?;
        return Ok(indices.into_iter().map(|i| &courses[i]).collect());
    }

    loop {
        ui::plain(constants::SELECTION_HELP);
        let input = ui::prompt("Courses to download", Some("all")).map_err(|_| AppError::UserInterrupt)?;
        let indices = match utils::parse_selection(&input, courses.len()) {
            Ok(indices) => indices,
            Err(e) => {
                ui::error(&e.to_string());
                continue;
            }
        };
        let chosen: Vec<&Course> = indices.into_iter().map(|i| &courses[i]).collect();
        if context.args.yes {
            return Ok(chosen);
        }

        ui::print_sub_header("Selected courses");
        for course in &chosen {
            println!("  - {}", course.name);
        }
        if ui::confirm("Is this correct?", true) {
            return Ok(chosen);
        }
        if !ui::confirm("Start over?", true) {
            return Ok(Vec::new());
        }
    }
}

fn choose_destination(context: &CrawlContext) -> AppResult<PathBuf> {
    let last = context.config.last_destination.clone();
    let raw = match (&context.args.output, last) {
        (Some(output), _) => output.clone(),
        (None, Some(last)) if context.args.non_interactive() => last,
        (None, None) if context.args.non_interactive() => {
            return Err(AppError::UserInputError(
                "No destination given. Use --output <DIR>.".to_string(),
            ));
        }
        (None, last) => {
            let default = last.map(|p| p.display().to_string());
            loop {
                let input = ui::prompt("Destination directory", default.as_deref())
                    .map_err(|_| AppError::UserInterrupt)?;
                if !input.is_empty() {
                    break PathBuf::from(input);
                }
                ui::warn("Please enter a directory.");
            }
        }
    };

    let root = utils::expand_home(&raw);
    fs::create_dir_all(&root)?;
    let root = dunce::canonicalize(&root)?;
    if let Err(e) = credentials::save_last_destination(&root) {
        warn!("Remembering the destination failed: {}", e);
    }
    ui::info(&format!("Saving files under {}", root.display()));
    Ok(root)
}
