/// Router Module Index
///
/// Splits the `/api` surface by who may call it. The three routers are merged into one
/// under `/api`; routers sharing a path (e.g. `GET` and `PUT /bio`) combine their methods.

/// Routes open to every visitor: reads, login and the contact form.
pub mod public;

/// Routes that need any valid token. Wrapped in the `auth_middleware` layer.
pub mod authenticated;

/// Mutations. Each handler takes the `AdminUser` extractor, which rejects missing tokens
/// (401), bad tokens (403) and non-admin roles (403).
pub mod admin;
