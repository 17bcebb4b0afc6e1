//! Safe SQL builder: identifiers pass an allow-list, values are always parameters.

mod builder;
mod ident;
pub mod params;
pub use builder::*;
pub use ident::{is_valid_identifier, validate_identifier, MAX_IDENTIFIER_LEN};
pub use params::*;
