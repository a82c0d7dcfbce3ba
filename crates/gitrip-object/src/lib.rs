//! Git object model for gitrip.
//!
//! This crate decodes git's loose object encoding (zlib-compressed
//! `"<type> <size>\0<payload>"` files) and the commit and tree payload
//! formats, and provides a read-only content-addressed view over a
//! partially recovered `.git/objects` directory.

mod commit;
mod error;
mod id;
mod object;
mod store;
mod tree;

pub use commit::Commit;
pub use error::ObjectError;
pub use id::ObjectId;
pub use object::{LooseObject, ObjectType};
pub use store::DiskStore;
pub use tree::{Tree, TreeEntry};

/// Result type for object operations.
pub type Result<T> = std::result::Result<T, ObjectError>;
