pub mod html;
pub mod newsapi;
pub mod ollama;
pub mod summarizer;
