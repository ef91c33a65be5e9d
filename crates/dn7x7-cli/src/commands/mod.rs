//! Command handlers

mod account;
mod admin;
mod dashboard;
mod news;

use std::io::{self, Write};

use anyhow::{bail, Result};

use crate::cli::Commands;
use crate::context::Context;

pub async fn run(command: Commands, ctx: &mut Context) -> Result<()> {
    match command {
        Commands::Login { email } => account::login(ctx, email).await,
        Commands::Logout => account::logout(ctx).await,
        Commands::Whoami => account::whoami(ctx).await,
        Commands::Signup {
            email,
            name,
            organization,
        } => account::signup(ctx, email, name, organization).await,
        Commands::Activate { uid, token } => account::activate(ctx, &uid, &token).await,
        Commands::ResetPassword { email } => account::reset_password(ctx, &email).await,
        Commands::ResetPasswordConfirm { uid, token } => {
            account::reset_password_confirm(ctx, uid, token).await
        }
        Commands::SetPassword => account::set_password(ctx).await,
        Commands::Profile {
            name,
            organization,
            image,
        } => account::update_profile(ctx, name, organization, image).await,
        Commands::Credits => dashboard::credits(ctx).await,
        Commands::Keys { command } => dashboard::keys(ctx, command).await,
        Commands::Logs { filter } => dashboard::logs(ctx, filter).await,
        Commands::Overview => dashboard::overview(ctx).await,
        Commands::Admin { command } => admin::run(ctx, command).await,
        Commands::News { api_key, command } => news::run(ctx, &api_key, command).await,
    }
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(value) => print!("{} [{}]: ", label, value),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    match (input.is_empty(), default) {
        (true, Some(value)) => Ok(value.to_string()),
        (true, None) => bail!("{} is required", label),
        (false, _) => Ok(input.to_string()),
    }
}

fn prompt_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    if password.is_empty() {
        bail!("{} is required", label);
    }
    Ok(password)
}

/// Prompt twice and require both entries to match
fn prompt_new_password() -> Result<(String, String)> {
    let password = prompt_password("New password")?;
    let again = prompt_password("Repeat new password")?;
    if password != again {
        bail!("Passwords do not match");
    }
    Ok((password, again))
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim(), "y" | "Y" | "yes"))
}
