//! Convenience wrappers for common membership and listing tasks.
//!
//! Each wrapper composes the builders and the introspector and shares their
//! error and cancellation behaviour.

mod groups;
mod resources;
mod users;

pub use groups::{Groups, MEMBER_RELATION};
pub use resources::Resources;
pub use users::Users;
