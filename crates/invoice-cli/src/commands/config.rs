use std::env;

use invoice_core::config::{normalize_base_url, API_URL_ENV};
use invoice_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::config_profiles::{client_config, default_config_path, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    global_profile: Option<&str>,
    api_url: Option<String>,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_base_url,
            request_timeout_secs,
            no_activate,
        } => run_config_init(
            global_profile,
            api_base_url.or(api_url),
            request_timeout_secs,
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(global_profile, api_url),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    apply_profile_init(
        &mut config,
        &profile_name,
        api_base_url,
        request_timeout_secs,
        no_activate,
    )?;

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );
    println!(
        "Run `invoice auth login --identifier <USERNAME_OR_EMAIL> --password <PASSWORD>` to sign in."
    );
    Ok(())
}

/// Merge init flags into a profile. Unset flags keep the stored values.
pub fn apply_profile_init(
    config: &mut CliProfilesConfig,
    profile_name: &str,
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let api_base_url = normalize_text_option(api_base_url)
        .map(|url| normalize_base_url(&url))
        .transpose()?;

    let profile = config.profile_mut_or_default(profile_name);
    if let Some(url) = api_base_url {
        profile.api_base_url = Some(url);
    }
    if let Some(secs) = request_timeout_secs {
        profile.request_timeout_secs = (secs > 0).then_some(secs);
    }

    if !no_activate {
        config.active_profile = Some(profile_name.to_string());
    }
    Ok(())
}

pub fn run_config_show(
    global_profile: Option<&str>,
    api_url: Option<String>,
) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let profile = config.profile(&profile_name);
    let client = client_config(profile, api_url, env::var(API_URL_ENV).ok())?;

    let path = default_config_path().map_err(CliError::Config)?;
    println!("Config file: {}", path.display());
    println!(
        "Profile:     {}{}",
        profile_name,
        if profile.is_some() { "" } else { " (not configured)" }
    );
    println!("API URL:     {}", client.base_url());
    match client.request_timeout {
        Some(timeout) => println!("Timeout:     {}s", timeout.as_secs()),
        None => println!("Timeout:     none"),
    }
    Ok(())
}
