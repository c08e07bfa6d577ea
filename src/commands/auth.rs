use crate::app::App;
use crate::auth::{LoginRequest, RegisterRequest};
use crate::ui::style;
use anyhow::{Context, Result};

fn resolve_password(provided: Option<String>) -> Result<String> {
    match provided {
        Some(password) => Ok(password),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .context("failed to read password"),
    }
}

pub async fn login(app: &App, email: &str, password: Option<String>) -> Result<()> {
    let password = resolve_password(password)?;
    let session = app
        .login(&LoginRequest {
            email: email.to_string(),
            password,
        })
        .await?;

    let name = if session.user.nickname.is_empty() {
        email
    } else {
        &session.user.nickname
    };
    println!("{}", style::success(format!("Signed in as {name}.")));
    Ok(())
}

pub async fn register(
    app: &App,
    nickname: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = resolve_password(password)?;
    app.register(&RegisterRequest {
        nickname: nickname.to_string(),
        email: email.to_string(),
        password,
    })
    .await?;

    println!(
        "{}",
        style::success(format!("Account created; signed in as {nickname}."))
    );
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    app.logout()?;
    println!("{}", style::success("Signed out; local state cleared."));
    Ok(())
}

pub async fn status(app: &App) -> Result<()> {
    if !app.is_authenticated() {
        println!("{}", style::warn("Not signed in."));
        return Ok(());
    }
    println!("{}", style::success("Signed in."));

    match app.profile.refresh().await {
        Some(profile) => {
            let name = if profile.nickname.is_empty() {
                "(no nickname)".to_string()
            } else {
                profile.nickname.clone()
            };
            println!(
                "Profile: {} · notifications {} / {}",
                style::value(name),
                profile.notify_channel,
                profile.notify_frequency
            );
        }
        None => println!("{}", style::dim("Profile unavailable.")),
    }

    match app.chats.get() {
        Some(id) => println!("Active chat: {}", style::value(id)),
        None => println!("{}", style::dim("No active chat yet.")),
    }
    Ok(())
}
