pub mod app;
pub mod chat;
pub mod composer;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod notify;
pub mod session;
pub mod theme;
pub mod upload;
