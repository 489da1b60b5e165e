// UI layer: an interactive menu built on `dialoguer`.
// Logs in once, then each menu entry maps to one `PackagingClient` call.
// API failures are printed and the menu keeps going; prompt failures end it.

use crate::api::{PackagingClient, Standard};
use crate::config::{self, ClientConfig, Credentials};
use crate::error::ApiError;
use anyhow::{Context, Result};
use crossterm::style::{style, Stylize};
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

const SHELL_FILTER: (&str, &[&str]) = ("Shell package", &["zip"]);
const PACKAGE_FILTER: (&str, &[&str]) = ("CloudShell package", &["zip"]);

/// Prompt for credentials, log in, and run the menu until "Exit".
pub fn run(config: ClientConfig) -> Result<()> {
    let client = login(config)?;
    main_menu(&client)
}

/// Collect connection details and credentials, defaulting to the environment.
fn login(config: ClientConfig) -> Result<PackagingClient> {
    let host: String = Input::new()
        .with_prompt("CloudShell host")
        .default(config.host.clone())
        .interact_text()?;
    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(config.port)
        .interact_text()?;

    let mut username_prompt = Input::<String>::new();
    username_prompt.with_prompt("Username");
    if let Some(username) = config::username_from_env() {
        username_prompt.default(username);
    }
    let username = username_prompt.interact_text()?;
    // `Password` hides input in the terminal.
    let password = Password::new().with_prompt("Password").interact()?;
    let domain: String = Input::new()
        .with_prompt("Domain")
        .default(config::domain_from_env())
        .interact_text()?;

    let config = ClientConfig { host, port, ..config };
    let credentials = Credentials::new(username, password).with_domain(domain);

    let client = with_spinner("Logging in...", || {
        PackagingClient::connect(&config, &credentials)
    })?
    .with_context(|| format!("Could not log into {}:{}", config.host, config.port))?;

    println!(
        "{}",
        style(format!("Logged into {}:{}", client.host(), client.port())).green()
    );
    Ok(client)
}

/// Main interactive menu. `Select::interact()` is keyboard-driven: arrow
/// keys and Enter choose an option.
pub fn main_menu(client: &PackagingClient) -> Result<()> {
    let items = vec![
        "Add shell",
        "Update shell",
        "Get shell",
        "Delete shell",
        "Installed standards",
        "Export package",
        "Import package",
        "Exit",
    ];
    loop {
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => handle_add_shell(client)?,
            1 => handle_update_shell(client)?,
            2 => handle_get_shell(client)?,
            3 => handle_delete_shell(client)?,
            4 => handle_standards(client)?,
            5 => handle_export(client)?,
            6 => handle_import(client)?,
            7 => break,
            _ => {}
        }
    }
    Ok(())
}

fn handle_add_shell(client: &PackagingClient) -> Result<()> {
    let Some(path) = prompt_path("Shell file", SHELL_FILTER)? else {
        return Ok(());
    };
    let result = with_spinner("Uploading shell...", || client.add_shell(&path))?;
    report("Add shell", result);
    Ok(())
}

fn handle_update_shell(client: &PackagingClient) -> Result<()> {
    let Some(path) = prompt_path("Shell file", SHELL_FILTER)? else {
        return Ok(());
    };
    let derived = crate::api::shell_name_from_path(&path).unwrap_or_default();
    let name: String = Input::new()
        .with_prompt(format!("Shell name (empty for {:?})", derived))
        .allow_empty(true)
        .interact_text()?;
    let name = name.trim();
    let name = if name.is_empty() { None } else { Some(name) };

    let result = with_spinner("Updating shell...", || client.update_shell(&path, name))?;
    report("Update shell", result);
    Ok(())
}

fn handle_get_shell(client: &PackagingClient) -> Result<()> {
    let name = prompt_shell_name()?;
    let result = with_spinner("Fetching shell...", || client.get_shell(&name))?;
    if let Some(shell) = report("Get shell", result) {
        println!("{}", serde_json::to_string_pretty(&shell)?);
    }
    Ok(())
}

fn handle_delete_shell(client: &PackagingClient) -> Result<()> {
    let name = prompt_shell_name()?;
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete shell {:?}?", name))
        .default(false)
        .interact()?;
    if !confirmed {
        return Ok(());
    }
    let result = with_spinner("Deleting shell...", || client.delete_shell(&name))?;
    report("Delete shell", result);
    Ok(())
}

fn handle_standards(client: &PackagingClient) -> Result<()> {
    let result = with_spinner("Fetching standards...", || client.installed_standards())?;
    let Some(body) = report("Installed standards", result) else {
        return Ok(());
    };
    match Standard::list_from_json(&body) {
        Ok(standards) if !standards.is_empty() => {
            for standard in standards {
                println!("  {} {}", standard.standard_name, standard.versions.join(", "));
            }
        }
        Ok(_) => println!("  (none installed)"),
        // Unknown shape: show it as the server sent it.
        Err(_) => println!("{}", serde_json::to_string_pretty(&body)?),
    }
    Ok(())
}

fn handle_export(client: &PackagingClient) -> Result<()> {
    let raw: String = Input::new()
        .with_prompt("Topology names (comma separated)")
        .interact_text()?;
    let topologies = split_topologies(&raw);
    let Some(first) = topologies.first() else {
        println!("No topology names given.");
        return Ok(());
    };

    let default_out = default_export_path(first);
    let out: String = Input::new()
        .with_prompt("Save package to")
        .default(default_out.display().to_string())
        .interact_text()?;
    let out = PathBuf::from(out);
    if out.exists()
        && !Confirm::new()
            .with_prompt(format!("{} exists, overwrite?", out.display()))
            .default(false)
            .interact()?
    {
        return Ok(());
    }

    let result = with_spinner("Exporting package...", || {
        client.export_package(topologies.as_slice())
    })?;
    if let Some(bytes) = report("Export package", result) {
        std::fs::write(&out, &bytes)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        println!("Wrote {} bytes to {}", bytes.len(), out.display());
    }
    Ok(())
}

fn handle_import(client: &PackagingClient) -> Result<()> {
    let Some(path) = prompt_path("Package file", PACKAGE_FILTER)? else {
        return Ok(());
    };
    let result = with_spinner("Importing package...", || client.import_package(&path))?;
    report("Import package", result);
    Ok(())
}

fn prompt_shell_name() -> Result<String> {
    let name: String = Input::new().with_prompt("Shell name").interact_text()?;
    Ok(name.trim().to_string())
}

/// Ask for a file path; an empty answer opens the native file picker.
fn prompt_path(prompt: &str, filter: (&str, &[&str])) -> Result<Option<PathBuf>> {
    let raw: String = Input::new()
        .with_prompt(format!("{} (empty to browse)", prompt))
        .allow_empty(true)
        .interact_text()?;
    let raw = raw.trim();
    if !raw.is_empty() {
        return Ok(Some(PathBuf::from(raw)));
    }
    let picked = rfd::FileDialog::new()
        .add_filter(filter.0, filter.1)
        .pick_file();
    if picked.is_none() {
        println!("No file selected.");
    }
    Ok(picked)
}

/// Run `f` while a spinner is shown, clearing it afterwards.
fn with_spinner<T>(message: &'static str, f: impl FnOnce() -> T) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").context("Invalid spinner template")?,
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    Ok(out)
}

/// Print the outcome of an API call and hand back the value on success.
fn report<T>(label: &str, result: Result<T, ApiError>) -> Option<T> {
    match result {
        Ok(value) => {
            println!("{}", style(format!("{} succeeded", label)).green());
            Some(value)
        }
        Err(e) => {
            println!("{}", style(format!("{} failed: {}", label, e)).red());
            None
        }
    }
}

fn split_topologies(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_export_path(first_topology: &str) -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let file_name: String = first_topology
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    dir.join(format!("{}.zip", file_name))
}
