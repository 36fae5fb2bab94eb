mod broadcast;
mod config;
mod connection;
mod error;
mod gateway;
mod room;
mod server;
mod session;
mod signaling;
mod transport;


pub use broadcast::*;
pub use config::*;
pub use connection::*;
pub use error::*;
pub use gateway::*;
pub use room::*;
pub use server::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
