mod app_state;
mod config_api;
mod router;

pub use app_state::*;
pub use config_api::*;
pub use router::*;
