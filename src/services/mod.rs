pub mod analytics;
pub mod auth;
pub mod bootstrap_admin;
pub mod category;
pub mod department;
pub mod email;
pub mod hooks;
pub mod notification;
pub mod report;
pub mod upload;
