pub mod dto;
pub mod entries;
pub mod middleware;
pub mod reports;
pub mod rest;
pub mod state;
pub mod subjects;
pub mod tasks;

// Re-export the router builder so the binary and the tests share one route table.
pub use middleware::require_user;
pub use rest::api_router;
