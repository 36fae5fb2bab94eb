mod room;
mod room_store;

pub use room::*;
pub use room_store::*;
