use clap::{Parser, Subcommand};

/// Coolcart — talk yourself out of impulse purchases.
#[derive(Parser, Debug)]
#[command(name = "coolcart")]
#[command(version = "0.1.0")]
#[command(about = "Terminal client for the purchase cooling-off assistant.", long_about = None)]
pub struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with an existing account
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (prompted interactively when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        nickname: String,

        #[arg(short, long)]
        email: String,

        /// Password (prompted interactively when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and clear local state
    Logout,

    /// Show authentication, profile and active-chat status
    Status,

    /// Inspect or update the financial profile
    Profile {
        #[command(subcommand)]
        profile_command: ProfileCommands,
    },

    /// Chat with the assistant (streams the reply; Ctrl-C stops it)
    Chat {
        /// Single message mode (don't enter interactive mode)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Manage chat sessions
    Chats {
        #[command(subcommand)]
        chats_command: ChatsCommands,
    },

    /// List subscription tariffs
    Tariffs,

    /// Create a payment for a tariff and print the confirmation link
    Buy {
        /// Tariff id from `coolcart tariffs`
        tariff_id: String,
    },

    /// Ask the backend how long a purchase should wait
    Analyze {
        /// Price in your account currency
        #[arg(short, long)]
        price: f64,

        /// Purchase category (matched against the blacklist)
        #[arg(short, long)]
        category: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show the normalized profile
    Show,

    /// Update profile fields. Omitted flags stay untouched; pass `none` to
    /// clear an amount.
    Set {
        #[arg(long)]
        nickname: Option<String>,

        /// Monthly income, or `none` to clear
        #[arg(long)]
        income: Option<String>,

        /// Monthly discretionary budget, or `none` to clear
        #[arg(long)]
        budget: Option<String>,

        /// Current savings, or `none` to clear
        #[arg(long)]
        savings: Option<String>,

        /// Whether savings count towards affordability
        #[arg(long)]
        use_savings: Option<bool>,

        /// Notification channel: none, email, app, tg
        #[arg(long)]
        notify_channel: Option<String>,

        /// Notification frequency: daily, weekly, monthly
        #[arg(long)]
        notify_frequency: Option<String>,

        /// Add a blacklist category (repeatable)
        #[arg(long = "block", value_name = "CATEGORY")]
        block: Vec<String>,

        /// Remove a blacklist category (repeatable)
        #[arg(long = "unblock", value_name = "CATEGORY")]
        unblock: Vec<String>,

        /// Replace the cooling ranges, repeatable, as min:max:days with an
        /// empty max meaning unbounded (e.g. --range 0:5000:1 --range 5000::7)
        #[arg(long = "range", value_name = "MIN:MAX:DAYS")]
        ranges: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ChatsCommands {
    /// List sessions, page by page
    List {
        #[arg(short, long, default_value = "1")]
        page: u64,
    },

    /// Create a new session and make it active
    New,

    /// Delete the active session (or a specific one) and land on a valid one
    Delete {
        /// Session id; defaults to the active session
        id: Option<String>,
    },
}
