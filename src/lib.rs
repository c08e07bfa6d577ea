#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::cast_precision_loss,
    clippy::return_self_not_must_use
)]

pub mod api;
pub mod app;
pub mod auth;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod payment;
pub mod profile;
pub mod purchases;
pub mod store;
pub mod ui;

pub use app::App;
pub use cli::Cli;
pub use config::Config;
pub use error::{ApiError, CoolcartError, Result};
