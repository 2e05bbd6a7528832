pub mod commentary;
pub mod gemini;

pub use commentary::CommentaryGenerator;
pub use gemini::GeminiClient;
