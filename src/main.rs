//! odorok - command-line client for the hiking-course service
//!
//! Looks up courses, regions, attractions, attendance, community articles and
//! the user's diaries and profile, and prints the JSON payloads. Read lookups
//! go through the client's single-flight response cache.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use odorok::api::{
    ApiClient, ArticleFilter, AttendanceApi, CommunityApi, CourseApi, DiaryApi, MypageApi, DEFAULT_REVIEW_SORT,
};
use odorok::auth::{FileTokenStore, MemoryTokenStore, TokenStore};
use odorok::cli::{Cli, Command, ReadCommand, StartupConfig};
use odorok::error::ApiError;

/// Installs the stderr log subscriber; `RUST_LOG` takes precedence over `--verbose`
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "odorok=debug" } else { "odorok=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Token store in the user's config directory, or in memory when there is no home
fn token_store() -> Arc<dyn TokenStore> {
    match FileTokenStore::new() {
        Some(store) => Arc::new(store),
        None => {
            warn!("no config directory available, token will not be persisted");
            Arc::new(MemoryTokenStore::new())
        }
    }
}

/// Issues one read command against the backend
async fn read(client: &ApiClient, command: &ReadCommand) -> Result<Value, ApiError> {
    let courses = CourseApi::new(client);
    match command {
        ReadCommand::Sidos => courses.sidos().await,
        ReadCommand::Sigungus { sido } => courses.sigungus(*sido).await,
        ReadCommand::ContentTypes => courses.content_types().await,
        ReadCommand::Attractions {
            sido,
            sigungu,
            content_type,
        } => courses.nearby_attractions(*sido, *sigungu, *content_type).await,
        ReadCommand::Course { id } => courses.course_detail(*id).await,
        ReadCommand::Courses { page, size } => courses.all_courses(*page, *size).await,
        ReadCommand::Region {
            sido,
            sigungu,
            email,
            page,
            size,
        } => {
            courses
                .search_by_region(*sido, *sigungu, email.as_deref(), *page, *size)
                .await
        }
        ReadCommand::Top { email } => courses.top_courses(email.as_deref()).await,
        ReadCommand::Reviews { course_id, page, size } => {
            courses.course_reviews(*course_id, *page, *size, DEFAULT_REVIEW_SORT).await
        }
        ReadCommand::Attendance { year, month } => AttendanceApi::new(client).monthly(*year, *month).await,
        ReadCommand::Articles {
            board_type,
            course_id,
            page,
            size,
        } => {
            let filter = ArticleFilter {
                board_type: *board_type,
                course_id: *course_id,
                page: *page,
                size: *size,
                ..ArticleFilter::default()
            };
            CommunityApi::new(client).search_articles(&filter).await
        }
        ReadCommand::Article { id } => CommunityApi::new(client).article(*id).await,
        ReadCommand::Comments { article_id, page } => CommunityApi::new(client).comments(*article_id, *page).await,
        ReadCommand::Diaries { group_by } => DiaryApi::new(client).diaries(group_by).await,
        ReadCommand::Diary { id } => DiaryApi::new(client).diary(*id).await,
        ReadCommand::Visited => DiaryApi::new(client).visited_courses().await,
        ReadCommand::Profile => MypageApi::new(client).profile().await,
        ReadCommand::Stats => MypageApi::new(client).activity_statistics().await,
    }
}

/// Runs a read command `startup.repeat` times concurrently and prints the result
async fn lookup(command: &ReadCommand, startup: StartupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = ApiClient::new(startup.client, token_store())?;
    let results = join_all((0..startup.repeat).map(|_| read(&client, command))).await;

    if startup.repeat > 1 {
        info!(
            calls = startup.repeat,
            requests = client.requests_sent(),
            "finished repeated lookup"
        );
    }

    // Concurrent cached lookups all share one outcome; report the first
    match results.into_iter().next() {
        Some(Ok(value)) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Some(Err(e)) => {
            warn!(error = %e, "request failed");
            Err(e.user_message().into())
        }
        None => Ok(()),
    }
}

fn login(token: &str) -> Result<(), Box<dyn std::error::Error>> {
    token_store().set(token)?;
    println!("Token stored.");
    Ok(())
}

fn logout() -> Result<(), Box<dyn std::error::Error>> {
    token_store().clear()?;
    println!("Token removed.");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    init_tracing(startup.verbose);

    let result = match &cli.command {
        Command::Read(command) => lookup(command, startup).await,
        Command::Login { token } => login(token),
        Command::Logout => logout(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
