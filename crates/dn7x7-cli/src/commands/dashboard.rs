use anyhow::Result;
use dn7x7_core::models::{ApiCallLog, ApiKey, CreditBalance, LogFilter, NewApiKey};
use serde::Serialize;
use tracing::debug;

use crate::cli::{KeysCommand, LogArgs};
use crate::context::Context;
use crate::format::{format_date, format_optional, format_timestamp, print_json, truncate_string, yes_no};

/// Rows shown by `overview`
const OVERVIEW_LOG_LIMIT: usize = 10;

pub async fn credits(ctx: &mut Context) -> Result<()> {
    let balance = ctx.client.credits().await?;
    if ctx.json {
        return print_json(&balance);
    }
    print_credits(&balance);
    Ok(())
}

fn print_credits(balance: &CreditBalance) {
    println!("{:<18} {}", "Daily free:", balance.daily_free_credits);
    println!("{:<18} {}", "Purchased:", balance.purchased_credits);
    println!("{:<18} {}", "Remaining:", balance.remaining_credits);
    if balance.is_exhausted() {
        println!("\nNo credits left. News API calls will fail until credits are added.");
    }
}

pub async fn keys(ctx: &mut Context, command: KeysCommand) -> Result<()> {
    match command {
        KeysCommand::List => {
            let keys = ctx.client.list_keys().await?;
            if ctx.json {
                return print_json(&keys);
            }
            print_keys(&keys);
        }
        KeysCommand::Create { name, daily_limit } => {
            let request = NewApiKey::new(name).with_daily_limit(daily_limit);
            let key = ctx.client.create_key(&request).await?;
            if ctx.json {
                return print_json(&key);
            }
            println!("Created key {} ({})", key.id, key.name);
            println!("\n  {}\n", key.key);
            println!("Store it now; listings only show a prefix.");
        }
        KeysCommand::Revoke { id } => {
            let response = ctx.client.revoke_key(id).await?;
            if ctx.json {
                return print_json(&response);
            }
            println!("Key {}: {}", id, response.status);
        }
    }
    Ok(())
}

fn print_keys(keys: &[ApiKey]) {
    if keys.is_empty() {
        println!("No API keys yet. Create one with `dn7x7 keys create <name>`.");
        return;
    }
    println!(
        "{:<6} {:<24} {:<14} {:<8} {:>8} {}",
        "ID", "NAME", "KEY", "ACTIVE", "LIMIT", "CREATED"
    );
    for key in keys {
        println!(
            "{:<6} {:<24} {:<14} {:<8} {:>8} {}",
            key.id,
            truncate_string(&key.name, 24),
            key.masked(),
            yes_no(key.is_active),
            key.daily_limit,
            format_date(&key.created_at)
        );
    }
}

pub async fn logs(ctx: &mut Context, args: LogArgs) -> Result<()> {
    let filter = LogFilter {
        time_range: args.time_range,
        status_filter: args.status,
    };
    let logs = ctx.client.logs(&filter).await?;
    if ctx.json {
        return print_json(&logs);
    }
    print_logs(&logs);
    Ok(())
}

pub(super) fn print_logs(logs: &[ApiCallLog]) {
    if logs.is_empty() {
        println!("No API calls in this period.");
        return;
    }
    println!(
        "{:<20} {:<7} {:<6} {:<16} {}",
        "TIME", "METHOD", "STATUS", "IP", "ENDPOINT"
    );
    for log in logs {
        println!(
            "{:<20} {:<7} {:<6} {:<16} {}",
            format_timestamp(&log.timestamp),
            log.method,
            log.status_code,
            format_optional(&log.ip_address, "-"),
            truncate_string(&log.endpoint, 60)
        );
    }
}

#[derive(Serialize)]
struct Overview {
    credits: CreditBalance,
    keys: Vec<ApiKey>,
    recent_calls: Vec<ApiCallLog>,
}

/// Fetch credits, keys and recent calls concurrently
pub async fn overview(ctx: &mut Context) -> Result<()> {
    let filter = LogFilter::default();
    let (credits, keys, mut recent_calls) = futures::try_join!(
        ctx.client.credits(),
        ctx.client.list_keys(),
        ctx.client.logs(&filter)
    )?;
    debug!(keys = keys.len(), calls = recent_calls.len(), "Overview loaded");
    recent_calls.truncate(OVERVIEW_LOG_LIMIT);

    let overview = Overview {
        credits,
        keys,
        recent_calls,
    };
    if ctx.json {
        return print_json(&overview);
    }

    print_credits(&overview.credits);
    println!();
    print_keys(&overview.keys);
    println!();
    print_logs(&overview.recent_calls);
    Ok(())
}
