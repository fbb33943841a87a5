//! services/client/src/lib.rs
//!
//! Adapters and runtime for the EduConnect client: the REST adapter, local
//! storage, tab session identity, notification polling and the message
//! workflows built on the `educonnect_core` ports.

pub mod adapters;
pub mod config;
pub mod error;
pub mod i18n;
pub mod messaging;
pub mod poller;
pub mod session;
pub mod submit;
