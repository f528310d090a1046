//! Command-line interface parsing for the odorok client
//!
//! This module handles parsing of CLI arguments using clap and turns them into a
//! validated `StartupConfig`. Connection settings can also come from the
//! environment (`ODOROK_API_BASE_URL`, `ODOROK_TIMEOUT_SECS`,
//! `ODOROK_CACHE_TTL_SECS`).

use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::api::{DEFAULT_ALL_COURSES_SIZE, DEFAULT_CONTENT_TYPE_ID, DEFAULT_PAGE_SIZE, FIRST_COMMENT_PAGE};
use crate::config::{ClientConfig, DEFAULT_BASE_URL};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The base URL is not an http(s) URL
    #[error("Invalid base URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidBaseUrl(String),

    /// A zero timeout would fail every request
    #[error("Invalid timeout: must be at least 1 second")]
    InvalidTimeout,

    /// Repeat count of zero
    #[error("Invalid repeat count: must be at least 1")]
    InvalidRepeat,

    /// Month outside 1..=12
    #[error("Invalid month: {0}. Expected 1-12")]
    InvalidMonth(u32),
}

/// odorok - query the hiking-course service from the terminal
#[derive(Parser, Debug)]
#[command(name = "odorok")]
#[command(about = "Hiking course, region and attraction lookups for the odorok service")]
#[command(version)]
pub struct Cli {
    /// Base URL of the backend API
    #[arg(long, env = "ODOROK_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "ODOROK_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout: u64,

    /// How long read responses are cached, in seconds (0 disables caching)
    #[arg(long, env = "ODOROK_CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl: u64,

    /// Issue the same read this many times concurrently
    ///
    /// Cached lookups share a single request; the number of requests actually
    /// sent is logged at the end.
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub repeat: usize,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Commands supported by the client
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    #[command(flatten)]
    Read(ReadCommand),
    /// Store an access token for later requests
    Login {
        token: String,
    },
    /// Forget the stored access token
    Logout,
}

/// Commands that read from the backend and print the JSON payload
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ReadCommand {
    /// List province (sido) codes
    Sidos,
    /// List district (sigungu) codes of a province
    Sigungus {
        sido: u32,
    },
    /// List attraction content types
    ContentTypes,
    /// Attractions around a region
    Attractions {
        sido: u32,
        sigungu: u32,
        #[arg(long, default_value_t = DEFAULT_CONTENT_TYPE_ID)]
        content_type: u32,
    },
    /// Details of one course
    Course {
        id: u64,
    },
    /// List all courses
    Courses {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_ALL_COURSES_SIZE)]
        size: u32,
    },
    /// Search courses in a region
    Region {
        sido: u32,
        sigungu: u32,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    /// Top-rated courses
    Top {
        #[arg(long)]
        email: Option<String>,
    },
    /// Reviews of a course
    Reviews {
        course_id: u64,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    /// Attendance records of a month
    Attendance {
        year: i32,
        month: u32,
    },
    /// Search community articles
    Articles {
        #[arg(long)]
        board_type: Option<u32>,
        #[arg(long)]
        course_id: Option<u64>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        size: Option<u32>,
    },
    /// One community article
    Article {
        id: u64,
    },
    /// Comments of an article
    Comments {
        article_id: u64,
        #[arg(long, default_value_t = FIRST_COMMENT_PAGE)]
        page: u32,
    },
    /// Your hiking diaries
    Diaries {
        group_by: String,
    },
    /// One of your diaries
    Diary {
        id: u64,
    },
    /// Courses you have completed
    Visited,
    /// Your profile
    Profile,
    /// Your activity statistics
    Stats,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    /// Settings for the API client
    pub client: ClientConfig,
    /// How many times a read command is issued
    pub repeat: usize,
    /// Whether debug logging was requested
    pub verbose: bool,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if a setting is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if !(cli.base_url.starts_with("http://") || cli.base_url.starts_with("https://")) {
            return Err(CliError::InvalidBaseUrl(cli.base_url.clone()));
        }
        if cli.timeout == 0 {
            return Err(CliError::InvalidTimeout);
        }
        if cli.repeat == 0 {
            return Err(CliError::InvalidRepeat);
        }
        if let Command::Read(ReadCommand::Attendance { month, .. }) = cli.command {
            if !(1..=12).contains(&month) {
                return Err(CliError::InvalidMonth(month));
            }
        }

        let client = ClientConfig::default()
            .with_base_url(cli.base_url.as_str())
            .with_timeout(Duration::from_secs(cli.timeout))
            .with_cache_ttl(Duration::from_secs(cli.cache_ttl));

        Ok(StartupConfig {
            client,
            repeat: cli.repeat,
            verbose: cli.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_sidos() {
        let cli = Cli::parse_from(["odorok", "sidos"]);
        assert_eq!(cli.command, Command::Read(ReadCommand::Sidos));
        assert_eq!(cli.repeat, 1);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_attractions_default_content_type() {
        let cli = Cli::parse_from(["odorok", "attractions", "11", "110"]);
        assert_eq!(
            cli.command,
            Command::Read(ReadCommand::Attractions {
                sido: 11,
                sigungu: 110,
                content_type: 21
            })
        );
    }

    #[test]
    fn test_cli_parse_region_with_email() {
        let cli = Cli::parse_from(["odorok", "region", "11", "110", "--email", "a@b.c", "--size", "5"]);
        assert_eq!(
            cli.command,
            Command::Read(ReadCommand::Region {
                sido: 11,
                sigungu: 110,
                email: Some("a@b.c".to_string()),
                page: 0,
                size: 5
            })
        );
    }

    #[test]
    fn test_cli_parse_courses_defaults() {
        let cli = Cli::parse_from(["odorok", "courses"]);
        assert_eq!(cli.command, Command::Read(ReadCommand::Courses { page: 0, size: 500 }));
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::parse_from([
            "odorok",
            "--base-url",
            "http://localhost:8080/api",
            "--timeout",
            "3",
            "--cache-ttl",
            "0",
            "--repeat",
            "4",
            "-v",
            "content-types",
        ]);
        assert_eq!(cli.base_url, "http://localhost:8080/api");
        assert_eq!(cli.timeout, 3);
        assert_eq!(cli.cache_ttl, 0);
        assert_eq!(cli.repeat, 4);
        assert!(cli.verbose);
        assert_eq!(cli.command, Command::Read(ReadCommand::ContentTypes));
    }

    #[test]
    fn test_cli_rejects_missing_command() {
        assert!(Cli::try_parse_from(["odorok"]).is_err());
    }

    #[test]
    fn test_cli_rejects_non_numeric_course_id() {
        assert!(Cli::try_parse_from(["odorok", "course", "abc"]).is_err());
    }

    #[test]
    fn test_cli_parse_token_commands() {
        let cli = Cli::parse_from(["odorok", "login", "abc"]);
        assert_eq!(cli.command, Command::Login { token: "abc".to_string() });
        let cli = Cli::parse_from(["odorok", "logout"]);
        assert_eq!(cli.command, Command::Logout);
    }

    #[test]
    fn test_cli_parse_community_commands() {
        let cli = Cli::parse_from(["odorok", "articles", "--board-type", "1", "--page", "2"]);
        assert_eq!(
            cli.command,
            Command::Read(ReadCommand::Articles {
                board_type: Some(1),
                course_id: None,
                page: Some(2),
                size: None
            })
        );

        let cli = Cli::parse_from(["odorok", "comments", "7"]);
        assert_eq!(cli.command, Command::Read(ReadCommand::Comments { article_id: 7, page: 1 }));
    }

    #[test]
    fn test_cli_parse_personal_commands() {
        let cli = Cli::parse_from(["odorok", "diaries", "month"]);
        assert_eq!(
            cli.command,
            Command::Read(ReadCommand::Diaries {
                group_by: "month".to_string()
            })
        );
        assert_eq!(Cli::parse_from(["odorok", "visited"]).command, Command::Read(ReadCommand::Visited));
        assert_eq!(Cli::parse_from(["odorok", "profile"]).command, Command::Read(ReadCommand::Profile));
        assert_eq!(Cli::parse_from(["odorok", "stats"]).command, Command::Read(ReadCommand::Stats));
    }

    #[test]
    fn test_startup_config_from_cli() {
        let cli = Cli::parse_from(["odorok", "--base-url", "http://localhost/api/", "--cache-ttl", "60", "sidos"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.client.base_url, "http://localhost/api");
        assert_eq!(config.client.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.repeat, 1);
    }

    #[test]
    fn test_startup_config_rejects_bad_base_url() {
        let cli = Cli::parse_from(["odorok", "--base-url", "ftp://example.com", "sidos"]);
        let err = StartupConfig::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("Invalid base URL"));
        assert!(err.to_string().contains("ftp://example.com"));
    }

    #[test]
    fn test_startup_config_rejects_zero_timeout() {
        let cli = Cli::parse_from(["odorok", "--base-url", "http://x", "--timeout", "0", "sidos"]);
        assert!(matches!(StartupConfig::from_cli(&cli), Err(CliError::InvalidTimeout)));
    }

    #[test]
    fn test_startup_config_rejects_zero_repeat() {
        let cli = Cli::parse_from(["odorok", "--base-url", "http://x", "--repeat", "0", "sidos"]);
        assert!(matches!(StartupConfig::from_cli(&cli), Err(CliError::InvalidRepeat)));
    }

    #[test]
    fn test_startup_config_rejects_bad_month() {
        let cli = Cli::parse_from(["odorok", "--base-url", "http://x", "attendance", "2026", "13"]);
        assert!(matches!(StartupConfig::from_cli(&cli), Err(CliError::InvalidMonth(13))));
    }
}
