pub mod client;
pub mod generate;
pub mod sse;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::GeminiHttpClient;
pub use generate::GeminiGenerationClient;
