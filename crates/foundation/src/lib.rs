pub mod bitmap;
pub mod elevation;
pub mod ids;
pub mod time;

// Foundation crate: small, well-tested value types only.
pub use bitmap::*;
pub use elevation::*;
pub use ids::*;
pub use time::*;
