/// Router Module Index
///
/// Splits the `/api/v1` surface by access level. Protection is applied to a whole
/// module through a router layer, so a handler cannot be exposed by accident.

/// Routes open to anonymous clients.
pub mod public;

/// Routes behind the `AuthUser` middleware layer.
pub mod authenticated;
