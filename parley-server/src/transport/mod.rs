mod ws_handler;
mod ws_outbound;

pub use ws_handler::*;
pub use ws_outbound::*;
