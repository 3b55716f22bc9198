pub mod chat;
pub mod error;
pub mod events;
pub mod game;
pub mod snapshot;
