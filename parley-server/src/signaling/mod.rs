mod signal_router;

pub use signal_router::*;
