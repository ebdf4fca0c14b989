mod client;
mod models;
mod session;

#[cfg(test)]
pub(crate) mod fake;

pub use client::CollectionApi;
pub use models::*;
pub use session::TokenSession;
