//! Result type definition.

use crate::error::Error;

/// The standard Result type for definition handling.
///
/// All fallible operations in this crate return this type.
/// Use the `?` operator, `match`, or combinator methods to handle results.
pub type Result<T> = std::result::Result<T, Error>;
