/// Router Module Index
///
/// Routing is split by access level so that the authentication gate is applied once, at
/// the router layer, instead of being remembered per handler.

/// Read-only content listings. No authentication.
pub mod public;

/// Content management (uploads, replacements, deletes). Wrapped by the `AuthUser` gate
/// in `create_router`.
pub mod admin;
