// src/services/mod.rs
pub mod app_status;
pub mod chats;
pub mod client_queries;
pub mod requests;
pub mod responses;
pub mod templates;

pub use app_status::{AppStatusService, CasOutcome};
pub use chats::ChatService;
pub use client_queries::ClientQueryService;
pub use requests::RequestService;
pub use responses::{ResponseError, ResponseService};
pub use templates::TemplateService;
