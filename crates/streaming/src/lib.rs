pub mod client;
pub mod protocol;
pub mod scripted;
pub mod sync;

pub use client::*;
pub use protocol::*;
pub use scripted::*;
pub use sync::*;
