//! Wire types shared between the core and the HTTP layer.

mod requests;
mod responses;

pub use requests::*;
pub use responses::*;
