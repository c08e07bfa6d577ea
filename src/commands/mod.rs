mod auth;
mod chat;
mod payment;
mod profile;
mod purchases;

use crate::app::App;
use crate::cli::{ChatsCommands, Commands, ProfileCommands};
use anyhow::Result;

pub(crate) fn ensure_signed_in(app: &App) -> Result<()> {
    anyhow::ensure!(
        app.is_authenticated(),
        "not signed in. Run `coolcart login --email you@example.com` first"
    );
    Ok(())
}

pub async fn dispatch(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => auth::login(app, &email, password).await,
        Commands::Register {
            nickname,
            email,
            password,
        } => auth::register(app, &nickname, &email, password).await,
        Commands::Logout => auth::logout(app),
        Commands::Status => auth::status(app).await,
        Commands::Profile { profile_command } => match profile_command {
            ProfileCommands::Show => profile::show(app).await,
            ProfileCommands::Set {
                nickname,
                income,
                budget,
                savings,
                use_savings,
                notify_channel,
                notify_frequency,
                block,
                unblock,
                ranges,
            } => {
                profile::set(
                    app,
                    profile::SetArgs {
                        nickname,
                        income,
                        budget,
                        savings,
                        use_savings,
                        notify_channel,
                        notify_frequency,
                        block,
                        unblock,
                        ranges,
                    },
                )
                .await
            }
        },
        Commands::Chat { message } => chat::run(app, message).await,
        Commands::Chats { chats_command } => match chats_command {
            ChatsCommands::List { page } => chat::list(app, page).await,
            ChatsCommands::New => chat::new_session(app).await,
            ChatsCommands::Delete { id } => chat::delete(app, id).await,
        },
        Commands::Tariffs => payment::tariffs(app).await,
        Commands::Buy { tariff_id } => payment::buy(app, &tariff_id).await,
        Commands::Analyze { price, category } => purchases::analyze(app, price, &category).await,
    }
}
