//! `userbase` command line entry point.
//!
//! # Responsibility
//! - Parse arguments and environment configuration.
//! - Bootstrap logging and the SQLite store.
//! - Dispatch one command and print its JSON result to stdout.

mod api;
mod args;

use api::{parse_user_id, ApiError, ListParams};
use args::{Cli, Command};
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use userbase_core::db::open_db;
use userbase_core::{
    core_version, default_log_level, init_logging, SqliteUserRepository, UserService,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, cli.log_dir.as_deref()) {
        eprintln!("userbase: logging disabled: {err}");
    }

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", err.to_json());
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<String, ApiError> {
    match &cli.command {
        Command::Version => render(&serde_json::json!({ "version": core_version() })),
        Command::Health => with_service(cli, |_| Ok(serde_json::json!({ "status": "ok" }))),
        Command::Create { username } => {
            with_service(cli, |service| Ok(service.create_user(username)?))
        }
        Command::Get { id } => {
            let id = parse_user_id(id)?;
            with_service(cli, |service| Ok(service.get_user(id)?))
        }
        Command::Update { id, username } => {
            let id = parse_user_id(id)?;
            with_service(cli, |service| Ok(service.update_user(id, username)?))
        }
        Command::Delete { id } => {
            let id = parse_user_id(id)?;
            with_service(cli, |service| {
                service.delete_user(id)?;
                Ok(serde_json::json!({ "id": id.to_string(), "deleted": true }))
            })
        }
        Command::List {
            limit,
            offset,
            link,
        } => {
            let params = ListParams::new(cli.default_limit, cli.max_limit);
            let filter = match link {
                Some(raw) => params.filter_from_link(raw)?,
                None => params.filter_from_raw(limit.as_deref(), offset.as_deref()),
            };
            with_service(cli, |service| Ok(service.list_users(filter)?))
        }
    }
}

/// Opens the store, runs `action` against a user service and renders its result.
fn with_service<T, F>(cli: &Cli, action: F) -> Result<String, ApiError>
where
    T: Serialize,
    F: FnOnce(&UserService<SqliteUserRepository<'_>>) -> Result<T, ApiError>,
{
    let conn = open_db(&cli.db).map_err(|err| ApiError::unknown("db_open", &err))?;
    let repo =
        SqliteUserRepository::try_new(&conn).map_err(|err| ApiError::unknown("repo_init", &err))?;
    render(&action(&UserService::new(repo))?)
}

fn render<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|err| ApiError::unknown("render", &err))
}
