//! Database layer (key-tree document store).

pub mod keys;
pub mod memory;
pub mod store;

pub use keys::artist_key;
pub use memory::MemoryTree;
pub use store::{PostsChanged, Store};

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by identity uid)
    pub const USERS: &str = "users";
    /// Artist profiles (keyed by sanitized email)
    pub const ARTISTS: &str = "Artists";
    /// Feed posts (keyed by creation time in Unix millis)
    pub const POSTS: &str = "posts";
}
