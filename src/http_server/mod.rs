//! # filedb HTTP Server Module
//!
//! A small CRUD service over the storage driver.
//!
//! # Endpoints
//!
//! - `GET /` - Liveness banner
//! - `POST /process` - Store a user
//! - `GET /users` - List users
//! - `DELETE /delete` - Delete a user

pub mod config;
pub mod models;
pub mod server;
pub mod user_routes;

pub use config::HttpServerConfig;
pub use models::{Address, User};
pub use server::HttpServer;
pub use user_routes::{user_routes, UsersState, USERS_COLLECTION};
