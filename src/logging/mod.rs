// file: src/logging/mod.rs
// version: 1.0.0
// guid: a3365855-c4c1-418c-bd54-5e8ef4f7336f

//! Logging setup for hosts embedding the resolver

pub mod logger;

pub use logger::{init_json_logger, init_logger, with_async_operation_span, with_operation_span};
