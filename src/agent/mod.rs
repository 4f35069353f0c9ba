pub mod dispatch;
pub mod loop_impl;
pub mod persona;

pub use dispatch::{ToolRegistry, tool_descriptors};
pub use loop_impl::{EngineConfig, EngineReply, respond};
pub use persona::Persona;
