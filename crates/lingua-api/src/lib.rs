pub mod auth;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod session;
pub mod translations;

#[cfg(test)]
pub(crate) mod testing;
