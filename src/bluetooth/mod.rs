pub mod connection;
pub mod scanner;

pub use connection::Connection;
