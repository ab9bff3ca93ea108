pub mod ids;
pub mod logistics;
pub mod conversation;
pub mod proposal;

pub use ids::*;
pub use logistics::*;
pub use conversation::*;
pub use proposal::*;
