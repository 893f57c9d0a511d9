//! Command-line entry point for local review operations.
//!
//! # Responsibility
//! - Load a JSON `CoreConfig`, start logging and open the database.
//! - Dispatch one command against the core services and print the result.
//!
//! Usage:
//! `themereview_cli version`
//! `themereview_cli <config.json> <command> [args...]`

use log::error;
use std::process::ExitCode;
use themereview_core::db::open_db;
use themereview_core::{
    core_version, CoreConfig, DocumentReviewRepository, DocumentThemeRepository,
    LeaveReviewError, LeaveReviewOutcome, ReviewService, SqliteDocumentStore, Theme,
    ThemeAggregateMaintainer, ThemeService,
};

const USAGE: &str = "usage:
  themereview_cli version
  themereview_cli <config.json> create-theme <name>
  themereview_cli <config.json> leave-review <user_id> <theme_id> <rating> <comment>
  themereview_cli <config.json> resync <theme_id>
  themereview_cli <config.json> list-reviews";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let (config_path, command, rest) = match args {
        [single] if single == "version" => {
            println!("themereview_core version={}", core_version());
            return Ok(());
        }
        [config_path, command, rest @ ..] => (config_path, command.as_str(), rest),
        _ => return Err(USAGE.to_string()),
    };

    let config = CoreConfig::load(config_path).map_err(|err| err.to_string())?;
    config.init_logging()?;
    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let store = SqliteDocumentStore::try_new(&conn).map_err(|err| err.to_string())?;

    match (command, rest) {
        ("create-theme", [name]) => {
            let themes = ThemeService::new(DocumentThemeRepository::new(&store));
            let id = themes
                .create_theme(Theme::new(name.as_str()))
                .map_err(|err| err.to_string())?;
            println!("{id}");
        }
        ("leave-review", [user_id, theme_id, rating, comment]) => {
            let rating: i32 = rating
                .parse()
                .map_err(|_| format!("rating must be an integer, got `{rating}`"))?;
            let maintainer = ThemeAggregateMaintainer::new(
                DocumentThemeRepository::new(&store),
                DocumentReviewRepository::new(&store),
            )
            .with_orphan_policy(config.orphan_review_policy);
            match maintainer.leave_review(user_id, theme_id, rating, comment) {
                Ok(LeaveReviewOutcome::Committed {
                    review,
                    theme_rating,
                }) => println!("review={} theme_rating={theme_rating}", review.id),
                Ok(LeaveReviewOutcome::ThemeMissing { review }) => {
                    println!("review={} theme=missing", review.id)
                }
                Err(err) => {
                    if let LeaveReviewError::Partial(partial) = &err {
                        error!(
                            "event=cli_leave_review module=cli status=error review_id={} failed_step={}",
                            partial.review.id,
                            partial.failed_step.as_str()
                        );
                    }
                    return Err(err.to_string());
                }
            }
        }
        ("resync", [theme_id]) => {
            let maintainer = ThemeAggregateMaintainer::new(
                DocumentThemeRepository::new(&store),
                DocumentReviewRepository::new(&store),
            );
            let theme_rating = maintainer
                .resync_theme_rating(theme_id)
                .map_err(|err| err.to_string())?;
            println!("theme_rating={theme_rating}");
        }
        ("list-reviews", []) => {
            let reviews = ReviewService::new(DocumentReviewRepository::new(&store));
            for review in reviews.list_reviews().map_err(|err| err.to_string())? {
                println!(
                    "{} user={} theme={} rating={} comment={:?}",
                    review.id, review.user_id, review.theme_id, review.rating, review.comment
                );
            }
        }
        _ => return Err(USAGE.to_string()),
    }
    Ok(())
}
