pub mod connection;
pub mod dao;
pub mod entities;
pub mod providers;

pub use connection::{connect, sync_schema};
