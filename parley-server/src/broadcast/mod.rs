mod event_broadcaster;
mod event_sink;

pub use event_broadcaster::*;
pub use event_sink::*;
