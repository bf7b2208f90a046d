pub mod gemini;
pub mod templates;

pub use gemini::GeminiGenerator;
pub use templates::TemplateGenerator;
