pub mod connctx;
pub mod handler;
pub mod hub;

pub use handler::relay_handler;
pub use hub::RelayHub;
