mod core;
pub use core::{LlmGateway, Message, Role};
