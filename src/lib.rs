// ABOUTME: Embeddable chat front end for an AI code assistant.
// ABOUTME: Config, concrete transports, and activation wiring around banter-core.

pub mod client;
pub mod config;
pub mod transport;
pub mod utils;

pub use client::Client;
pub use config::Config;
pub use transport::{RestTransport, SocketTransport};

// Re-export the dispatch core for convenient access
pub use banter_core::{
    classify, dispatch, registrar, render, store, testing, traits, view,
};
pub use banter_core::{Dispatcher, SendOutcome, ViewEvent};
