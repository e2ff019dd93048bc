//! Core data types for the tool protocol client

mod server;
mod tool;

pub use server::ServerConfig;
pub use tool::{qualify, ToolCallResult, ToolDescriptor, ToolParameter, CUSTOM_SCOPE};
