mod collaborators;
mod external_request;
mod payload;
mod result_gateway;
mod room_worker;

pub use collaborators::*;
pub use external_request::*;
pub use payload::*;
pub use result_gateway::*;
