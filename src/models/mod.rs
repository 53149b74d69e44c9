pub mod agreement;
pub mod chat;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod knowledge;
pub mod messages;
pub mod persona;
pub mod project;
pub mod samples;
pub mod user;

pub use agreement::*;
pub use chat::*;
pub use diagnostics::*;
pub use error::*;
pub use health::*;
pub use knowledge::*;
pub use messages::*;
pub use persona::*;
pub use project::*;
pub use samples::*;
pub use user::*;
