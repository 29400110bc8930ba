mod secret;
pub mod template;

pub use secret::Secret;
pub use template::{RequestTemplate, TemplateError};
