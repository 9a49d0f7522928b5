//! `clientflow` - CLI for the clientflow contact store
//!
//! This binary provides the command-line interface for adding, editing,
//! listing and deleting client records.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{debug, warn};

use clientflow::cli::{
    AddCommand, ClientFields, Cli, Command, ConfigCommand, DeleteCommand, EditCommand,
    ListCommand, LocateArgs, LocateCommand, OutputFormat, ShowCommand,
};
use clientflow::location::FixedLocation;
use clientflow::query::Page;
use clientflow::storage::{open_configured, ClientStore, KeyValueStore};
use clientflow::{
    init_logging, locate_address, Client, ClientForm, Config, Error, FormSession,
    Geocoder,
};

type Store = ClientStore<Box<dyn KeyValueStore>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Add(cmd) => handle_add(&config, cmd).await,
        Command::Edit(cmd) => handle_edit(&config, cmd).await,
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Show(cmd) => handle_show(&config, &cmd),
        Command::Delete(cmd) => handle_delete(&config, &cmd),
        Command::Locate(cmd) => handle_locate(&config, &cmd).await,
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Store> {
    open_configured(config).context("failed to open client store")
}

async fn handle_add(config: &Config, cmd: AddCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let session = FormSession::create(&store).with_avatar_limit(config.avatar.max_bytes);

    let mut form = ClientForm::default();
    fill_form(config, &mut form, &cmd.fields, &cmd.location).await?;

    let client = session.submit(&form).map_err(submit_error)?;
    println!("Added client {} ({})", client.full_name, client.id);
    Ok(())
}

async fn handle_edit(config: &Config, cmd: EditCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let existing = store.resolve(&cmd.id).map_err(|err| anyhow!(err.user_message()))?;
    let session =
        FormSession::edit(&store, existing.id).with_avatar_limit(config.avatar.max_bytes);

    let mut form = session.initial_form().clone();
    fill_form(config, &mut form, &cmd.fields, &cmd.location).await?;

    let client = session.submit(&form).map_err(submit_error)?;
    println!("Updated client {} ({})", client.full_name, client.id);
    Ok(())
}

async fn fill_form(
    config: &Config,
    form: &mut ClientForm,
    fields: &ClientFields,
    location: &LocateArgs,
) -> anyhow::Result<()> {
    fields.apply_to(form);

    if location.locate {
        form.address = lookup_address(config, &location.provider()).await?;
        println!("Address: {}", form.address);
    }
    Ok(())
}

async fn lookup_address(config: &Config, provider: &FixedLocation) -> anyhow::Result<String> {
    let geocoder = Geocoder::from_config(&config.geocoding).map_err(Error::from)?;
    locate_address(provider, &geocoder, config.geocoding_timeout())
        .await
        .map_err(|err| anyhow!(err.user_message()))
}

/// Turn a failed submission into the message shown on the terminal.
fn submit_error(err: Error) -> anyhow::Error {
    if err.is_rejected_input() {
        debug!("Submission rejected: {:?}", err);
    } else {
        warn!("Submission failed: {}", err);
    }
    match err {
        Error::Validation(errors) => {
            let lines: Vec<String> = errors
                .iter()
                .map(|e| format!("  {}: {}", e.field, e.message))
                .collect();
            anyhow!("Please fix the following fields:\n{}", lines.join("\n"))
        }
        other => anyhow!(other.user_message()),
    }
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let clients = store.list();
    let page = cmd.listing(config.listing.page_size, &clients).view(&clients);

    match cmd.format {
        OutputFormat::Json => print_page_json(&page)?,
        OutputFormat::Plain => {
            for client in &page.items {
                println!("{}  {} <{}>", client.id, client.full_name, client.email);
            }
        }
        OutputFormat::Table => print_page_table(&page),
    }
    Ok(())
}

fn print_page_json(page: &Page<'_>) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "clients": page.items,
        "page": page.page,
        "page_size": page.page_size,
        "total_pages": page.total_pages,
        "total_matches": page.total_matches,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_page_table(page: &Page<'_>) {
    if page.is_empty() {
        println!("No clients found.");
        return;
    }

    println!(
        "{:<8}  {:<20}  {:<26}  {:<10}  {:<6}  {:<10}  ADDRESS",
        "ID", "NAME", "EMAIL", "PHONE", "GENDER", "DOB"
    );
    for client in &page.items {
        println!(
            "{:<8}  {:<20}  {:<26}  {:<10}  {:<6}  {:<10}  {}",
            client.short_id(),
            truncate(&client.full_name, 20),
            truncate(&client.email, 26),
            client.phone,
            client.gender.as_str(),
            client.dob,
            client.address
        );
    }

    if let Some((first, last)) = page.row_range() {
        println!();
        println!(
            "Showing {first}-{last} of {} (page {} of {})",
            page.total_matches, page.page, page.total_pages
        );
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map_or_else(|| millis.to_string(), |dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
}

fn handle_show(config: &Config, cmd: &ShowCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let client = store.resolve(&cmd.id).map_err(|err| anyhow!(err.user_message()))?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&client)?);
    } else {
        print_client(&client);
    }
    Ok(())
}

fn print_client(client: &Client) {
    println!("ID:            {}", client.id);
    println!("Name:          {}", client.full_name);
    println!("Email:         {}", client.email);
    println!("Phone:         {}", client.phone);
    println!("Address:       {}", client.address);
    println!("Gender:        {}", client.gender);
    println!("Date of birth: {}", client.dob);
    match &client.avatar {
        Some(avatar) => println!("Avatar:        {} bytes", avatar.len()),
        None => println!("Avatar:        none"),
    }
    println!("Created:       {}", format_millis(client.created_at));
}

fn handle_delete(config: &Config, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let client = store.resolve(&cmd.id).map_err(|err| anyhow!(err.user_message()))?;

    if !cmd.yes && !confirm(&format!("Delete {} ({})?", client.full_name, client.short_id()))? {
        println!("Cancelled.");
        return Ok(());
    }

    if store.delete(&client.id).map_err(submit_error)? {
        println!("Deleted client {} ({})", client.full_name, client.id);
    }
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn handle_locate(config: &Config, cmd: &LocateCommand) -> anyhow::Result<()> {
    let provider = FixedLocation::from_parts(cmd.lat, cmd.lon);
    let address = lookup_address(config, &provider).await?;
    println!("{address}");
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stats = store.stats();

    if json {
        let status = serde_json::json!({
            "total_clients": stats.total_clients,
            "oldest_client": stats.oldest_client,
            "newest_client": stats.newest_client,
            "blob_bytes": stats.blob_bytes,
            "location": stats.location,
            "storage_key": store.key(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("clientflow status");
        println!("-----------------");
        println!("Storage:       {}", stats.location);
        println!("Key:           {}", store.key());
        println!("Clients:       {}", stats.total_clients);
        println!("Data size:     {} bytes", stats.blob_bytes);
        if let Some(oldest) = stats.oldest_client {
            println!("Oldest:        {}", oldest.format("%Y-%m-%d %H:%M UTC"));
        }
        if let Some(newest) = stats.newest_client {
            println!("Newest:        {}", newest.format("%Y-%m-%d %H:%M UTC"));
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Backend:            {:?}", config.storage.backend);
                println!("  Data path:          {}", config.storage_path().display());
                println!("  Key:                {}", config.storage.key);
                println!();
                println!("[Listing]");
                println!("  Page size:          {}", config.listing.page_size);
                println!();
                println!("[Geocoding]");
                println!("  Base URL:           {}", config.geocoding.base_url);
                println!(
                    "  API key:            {}",
                    if config.geocoding.api_key.is_some() { "set" } else { "not set" }
                );
                println!("  Language:           {}", config.geocoding.language);
                println!("  Timeout (secs):     {}", config.geocoding.timeout_secs);
                println!();
                println!("[Avatar]");
                println!("  Max bytes:          {}", config.avatar.max_bytes);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            println!("{}", validation_report(path));
        }
    }
    Ok(())
}

/// Load `path` on its own and describe the outcome.
fn validation_report(path: PathBuf) -> String {
    match Config::load_from(Some(path)) {
        Ok(_) => "Configuration is valid.".to_string(),
        Err(e) => format!("Configuration error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_report_for_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[listing]\npage_size = 10\n").unwrap();

        assert_eq!(validation_report(path), "Configuration is valid.");
    }

    #[test]
    fn test_validation_report_for_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[listing]\npage_size = 0\n").unwrap();

        assert!(validation_report(path).starts_with("Configuration error:"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Ann Lee", 20), "Ann Lee");
        assert_eq!(truncate("Bartholomew", 5), "Bart…");
    }
}
