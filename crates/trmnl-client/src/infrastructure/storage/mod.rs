//! Configuration storage for the client application.
//!
//! Only reading is supported; the client never writes its config back.

pub mod config;
