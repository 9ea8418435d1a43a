pub mod blocking;
pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod rpc;

pub use board::BulletinBoard;
pub use client::{BusConnection, ClientHandle};
pub use config::BusAddress;
pub use error::{Error, Result};
