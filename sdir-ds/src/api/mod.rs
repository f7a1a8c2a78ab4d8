//! HTTP API handlers for sdir-ds

pub mod buildinfo;
pub mod health;
pub mod members;
pub mod reload;
pub mod sse;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use members::{search_members, submit_member, validate_member_field};
pub use reload::{engine_status, reload_members};
pub use sse::event_stream;
