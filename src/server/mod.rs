//! HTTP exposure of the fee engine for the console backend
//!
//! Routes are stateless apart from the loaded [`FeeConfig`](crate::config::FeeConfig):
//! every request is answered from its body alone.

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::serve;
pub use handlers::AppState;
pub use router::build_router;
