/// Middleware for the API server
///
/// Bearer-token authentication lives in `powercoffee_shared::auth::middleware`
/// so the services and the router share one `AuthContext`.

pub mod security;
