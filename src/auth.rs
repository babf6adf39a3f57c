//! Auth-domain identifiers, verified claim sets, and secret wrappers.

pub mod claims;
pub mod id;
pub mod secret;

pub use claims::*;
pub use id::*;
pub use secret::*;
