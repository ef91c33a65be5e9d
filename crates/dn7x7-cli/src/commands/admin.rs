use anyhow::Result;
use dn7x7_core::models::AdminUser;

use super::confirm;
use super::dashboard::print_logs;
use crate::cli::AdminCommand;
use crate::context::Context;
use crate::format::{format_optional, print_json, truncate_string, yes_no};

pub async fn run(ctx: &mut Context, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::Users { search } => {
            let users = ctx.client.list_users(search.as_deref()).await?;
            if ctx.json {
                return print_json(&users);
            }
            print_users(&users);
        }
        AdminCommand::User { id } => {
            let user = ctx.client.get_user(id).await?;
            if ctx.json {
                return print_json(&user);
            }
            print_users(std::slice::from_ref(&user));
        }
        AdminCommand::AddCredits { id, credits } => {
            let response = ctx.client.add_credits(id, credits).await?;
            if ctx.json {
                return print_json(&response);
            }
            println!(
                "{}: user {} now has {} purchased credits",
                response.status, id, response.total_credits
            );
        }
        AdminCommand::ToggleActive { id } => {
            let response = ctx.client.toggle_active(id).await?;
            if ctx.json {
                return print_json(&response);
            }
            println!("User {} active: {}", id, yes_no(response.is_active));
        }
        AdminCommand::ToggleStaff { id } => {
            let response = ctx.client.toggle_staff(id).await?;
            if ctx.json {
                return print_json(&response);
            }
            println!("User {} staff: {}", id, yes_no(response.is_staff));
        }
        AdminCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete user {} and all of their keys?", id))? {
                println!("Cancelled");
                return Ok(());
            }
            ctx.client.delete_user(id).await?;
            println!("User {} deleted", id);
        }
        AdminCommand::Logs { id, time_range } => {
            let logs = ctx.client.user_logs(id, time_range).await?;
            if ctx.json {
                return print_json(&logs);
            }
            print_logs(&logs);
        }
    }
    Ok(())
}

fn print_users(users: &[AdminUser]) {
    if users.is_empty() {
        println!("No users found");
        return;
    }
    println!(
        "{:<6} {:<28} {:<20} {:<20} {:<6} {:<7} {}",
        "ID", "EMAIL", "NAME", "ORGANIZATION", "ROLE", "ACTIVE", "STAFF"
    );
    for user in users {
        println!(
            "{:<6} {:<28} {:<20} {:<20} {:<6} {:<7} {}",
            user.id,
            truncate_string(&user.email, 28),
            truncate_string(&user.name, 20),
            truncate_string(&format_optional(&user.organization, "-"), 20),
            user.role.to_string(),
            yes_no(user.is_active),
            yes_no(user.is_staff)
        );
    }
}
