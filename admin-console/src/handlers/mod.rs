pub mod admin;
pub mod api;
pub mod app;
pub mod auth;
pub mod dashboard;
pub mod metrics;
pub mod pages;
pub mod profile;
