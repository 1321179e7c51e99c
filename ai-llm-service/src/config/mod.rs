pub mod default_config;
pub mod gemini_config;
