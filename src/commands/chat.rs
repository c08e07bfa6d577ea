use crate::app::App;
use crate::chat::manager::ChatSessionManager;
use crate::chat::{ChatMessage, CliStreamSink, MessageRole};
use crate::ui::style;
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// Cancels the token on the first Ctrl-C, so an in-flight stream stops
/// cleanly instead of killing the REPL. Dropping the guard disarms it.
struct CtrlCGuard {
    token: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl CtrlCGuard {
    fn arm() -> Self {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let handle = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
        Self { token, handle }
    }
}

impl Drop for CtrlCGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn print_messages(messages: &[ChatMessage]) {
    for message in messages {
        let label = match message.role {
            MessageRole::User => style::header("you"),
            MessageRole::Assistant => style::accent("assistant"),
        };
        println!("{label}: {}", message.text);
    }
}

fn print_sessions(manager: &ChatSessionManager) {
    if manager.sessions().is_empty() {
        println!("{}", style::dim("No chats yet."));
        return;
    }
    for session in manager.sessions() {
        let marker = if Some(session.id.as_str()) == manager.active_id() {
            "*"
        } else {
            " "
        };
        let updated = session
            .last_updated
            .map(|timestamp| timestamp.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{marker} {} {}", style::value(&session.id), style::dim(updated));
    }
    let more = if manager.has_more() { ", more available" } else { "" };
    println!("{}", style::dim(format!("page {}{more}", manager.page())));
}

async fn exchange(manager: &mut ChatSessionManager, text: &str) {
    print!("{}: ", style::accent("assistant"));
    let _ = std::io::stdout().flush();

    let guard = CtrlCGuard::arm();
    manager.send(text, &guard.token, &CliStreamSink::new()).await;
    println!();
}

pub async fn run(app: &App, message: Option<String>) -> Result<()> {
    super::ensure_signed_in(app)?;
    let mut manager = app.chat_manager();
    manager.bootstrap().await;

    if let Some(message) = message {
        exchange(&mut manager, &message).await;
        return Ok(());
    }

    print_messages(manager.messages());
    println!(
        "{}",
        style::dim("Describe a purchase, or use /chats, /new, /delete, /quit.")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}: ", style::header("you"));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        match line.as_str() {
            "/quit" | "/exit" => break,
            "/new" => {
                manager.create().await;
                print_messages(manager.messages());
            }
            "/delete" => {
                manager.delete_active().await;
                print_messages(manager.messages());
            }
            "/chats" => match manager.load_page(1).await {
                Ok(()) => print_sessions(&manager),
                Err(error) => println!("{}", style::warn(error)),
            },
            _ => exchange(&mut manager, &line).await,
        }
    }
    Ok(())
}

pub async fn list(app: &App, page: u64) -> Result<()> {
    super::ensure_signed_in(app)?;
    let mut manager = app.chat_manager();
    manager.load_page(page).await?;
    print_sessions(&manager);
    Ok(())
}

pub async fn new_session(app: &App) -> Result<()> {
    super::ensure_signed_in(app)?;
    let mut manager = app.chat_manager();
    manager.create().await;

    match manager.active_id() {
        Some(id) => println!("{}", style::success(format!("Created and selected chat {id}."))),
        None => print_messages(manager.messages()),
    }
    Ok(())
}

pub async fn delete(app: &App, id: Option<String>) -> Result<()> {
    super::ensure_signed_in(app)?;
    let mut manager = app.chat_manager();
    manager.bootstrap().await;
    if let Some(id) = id {
        manager.select(&id).await;
    }
    manager.delete_active().await;

    match manager.active_id() {
        Some(id) => println!(
            "{}",
            style::success(format!("Deleted; active chat is now {id}."))
        ),
        None => print_messages(manager.messages()),
    }
    Ok(())
}
