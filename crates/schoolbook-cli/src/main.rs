//! Schoolbook CLI - a thin adapter over the offline-first backend client.
//!
//! Logs in, looks up a school by its join code, then walks its sections,
//! their students, and the user's connections, printing what comes back.
//! Every step tolerates an unreachable backend by serving the last cached
//! snapshot.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use schoolbook_core::{Api, Config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Let environment variables override the stored configuration.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(url) = std::env::var("SCHOOLBOOK_SERVER_URL") {
        config.server_url = url;
    }
    if let Ok(app_id) = std::env::var("SCHOOLBOOK_APP_ID") {
        config.application_id = app_id;
    }
    if let Ok(key) = std::env::var("SCHOOLBOOK_REST_KEY") {
        config.rest_api_key = key;
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("schoolbook starting");

    let mut config = Config::load()?;
    apply_env_overrides(&mut config);
    if config.application_id.is_empty() || config.rest_api_key.is_empty() {
        anyhow::bail!(
            "backend credentials missing: set SCHOOLBOOK_APP_ID and SCHOOLBOOK_REST_KEY \
             or fill in the config file"
        );
    }

    let school_code = std::env::args().nth(1);

    let cache_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    let api = Api::new(config.clone(), cache_dir)?;

    // Credentials: environment first, then the last used username, then a
    // prompt.
    let username = match std::env::var("SCHOOLBOOK_USERNAME") {
        Ok(username) => username,
        Err(_) => match config.last_username.clone() {
            Some(username) => username,
            None => prompt_line("Username: ")?,
        },
    };
    let password = match std::env::var("SCHOOLBOOK_PASSWORD") {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    match api.login(&username, &password).await {
        Some(user) => println!(
            "logged in as {} ({})",
            user.username.as_deref().unwrap_or(&username),
            user.object_id
        ),
        None => println!("login failed and no cached session is available"),
    }
    config.last_username = Some(username);
    let _ = config.save();

    // School: fetch by code when one was given, otherwise reuse the cached
    // selection.
    let schools = match school_code {
        Some(ref code) => api.fetch_school_by_code(code).await,
        None => api.selected_school(),
    };
    match schools.first() {
        Some(school) => {
            println!(
                "school: {} (code {})",
                school.name.as_deref().unwrap_or("?"),
                school.code.as_deref().unwrap_or("?")
            );

            let sections = api.fetch_sections_for_school(school).await;
            println!("{} section(s)", sections.len());
            for section in &sections {
                println!("  - {}", section.name.as_deref().unwrap_or("?"));
            }

            if let Some(section) = sections.first() {
                let students = api
                    .fetch_students_for_section(&school.object_id, &section.object_id)
                    .await;
                println!(
                    "{} student(s) in {}",
                    students.len(),
                    section.name.as_deref().unwrap_or("?")
                );
                for student in &students {
                    println!(
                        "  - {} (age {})",
                        student.name.as_deref().unwrap_or("?"),
                        student.age.map_or("?".to_string(), |age| age.to_string())
                    );
                }
            }
        }
        None => println!("no school selected; pass a school code as the first argument"),
    }

    let connections = api.fetch_connections().await;
    println!("{} connection(s)", connections.len());
    for connection in &connections {
        let name = connection
            .school
            .as_ref()
            .and_then(|school| school.name.as_deref())
            .unwrap_or("?");
        println!("  - {}", name);
    }

    info!("schoolbook done");
    Ok(())
}
