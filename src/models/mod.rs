// src/models/mod.rs
pub mod app_status;
pub mod chat;
pub mod client_query;
pub mod template;

pub use app_status::{AppStatus, UpdateAppStatusRequest};
pub use chat::{Chat, ChatStatus, NewResponse, Request, Response};
pub use client_query::ClientQuery;
pub use template::Template;
