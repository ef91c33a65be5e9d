use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use dn7x7_core::models::{NewUser, PasswordChange, PasswordResetConfirm, ProfileImage, ProfileUpdate, User};
use tracing::info;

use super::{prompt, prompt_new_password, prompt_password};
use crate::context::Context;
use crate::format::{format_date, format_optional, print_json};

pub async fn login(ctx: &mut Context, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email", ctx.config.last_email.as_deref())?,
    };
    let password = prompt_password("Password")?;

    ctx.switch_account(&email)?;
    let user = ctx.client.login(&email, &password).await?;
    ctx.remember_email(&email);

    if ctx.json {
        return print_json(&user);
    }
    println!("Logged in as {}", user.display_name());
    Ok(())
}

pub async fn logout(ctx: &mut Context) -> Result<()> {
    ctx.client.logout().await;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(ctx: &mut Context) -> Result<()> {
    match ctx.client.restore_session().await? {
        Some(user) if ctx.json => print_json(&user),
        Some(user) => {
            print_user(&user);
            Ok(())
        }
        None => bail!("Not logged in. Run `dn7x7 login` first."),
    }
}

fn print_user(user: &User) {
    println!("{:<14} {}", "Name:", user.name);
    println!("{:<14} {}", "Email:", user.email);
    println!("{:<14} {}", "Organization:", format_optional(&user.organization, "-"));
    println!("{:<14} {}", "Role:", user.role);
    if let Some(ref joined) = user.date_joined {
        println!("{:<14} {}", "Joined:", format_date(joined));
    }
}

pub async fn signup(
    ctx: &mut Context,
    email: String,
    name: String,
    organization: Option<String>,
) -> Result<()> {
    let (password, re_password) = prompt_new_password()?;
    let user = NewUser {
        email,
        name,
        password,
        re_password: Some(re_password),
        organization,
    };
    ctx.client.signup(&user).await?;
    info!(email = %user.email, "Account created");
    println!("Account created. Check {} for the activation link.", user.email);
    Ok(())
}

pub async fn activate(ctx: &mut Context, uid: &str, token: &str) -> Result<()> {
    ctx.client.activate(uid, token).await?;
    println!("Account activated. You can now log in.");
    Ok(())
}

pub async fn reset_password(ctx: &mut Context, email: &str) -> Result<()> {
    ctx.client.reset_password(email).await?;
    println!("If {} has an account, a reset link is on its way.", email);
    Ok(())
}

pub async fn reset_password_confirm(ctx: &mut Context, uid: String, token: String) -> Result<()> {
    let (new_password, re_new_password) = prompt_new_password()?;
    let confirm = PasswordResetConfirm {
        uid,
        token,
        new_password,
        re_new_password,
    };
    ctx.client.reset_password_confirm(&confirm).await?;
    println!("Password reset. You can now log in.");
    Ok(())
}

pub async fn set_password(ctx: &mut Context) -> Result<()> {
    let current_password = prompt_password("Current password")?;
    let (new_password, re_new_password) = prompt_new_password()?;
    let change = PasswordChange {
        current_password,
        new_password,
        re_new_password,
    };
    ctx.client.set_password(&change).await?;
    println!("Password changed");
    Ok(())
}

pub async fn update_profile(
    ctx: &mut Context,
    name: Option<String>,
    organization: Option<String>,
    image: Option<PathBuf>,
) -> Result<()> {
    let profile_image = image.as_deref().map(read_image).transpose()?;
    let update = ProfileUpdate {
        name,
        organization,
        profile_image,
    };
    if update.is_empty() {
        bail!("Nothing to update. Pass --name, --organization or --image.");
    }

    let user = ctx.client.update_me(&update).await?;
    if ctx.json {
        return print_json(&user);
    }
    print_user(&user);
    Ok(())
}

fn read_image(path: &Path) -> Result<ProfileImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".to_string());
    Ok(ProfileImage {
        content_type: image_content_type(path).map(str::to_string),
        file_name,
        bytes,
    })
}

fn image_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
