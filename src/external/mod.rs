pub mod runner;
pub mod tools;

pub use runner::{SystemInvoker, ToolCommand, ToolInvoker};
