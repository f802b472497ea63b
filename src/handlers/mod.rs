pub mod analytics;
pub mod auth;
pub mod category;
pub mod department;
pub mod media;
pub mod notification;
pub mod report;

pub use auth::*;
