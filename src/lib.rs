//! Relay between the image editor frontend and a generative image model
//!
//! Accepts a base64 image plus a prompt (and optional chat history), forwards
//! them to Gemini, stores any generated image under the static directory and
//! returns the text and inline image to the caller.

pub mod ai;
pub mod error;
pub mod image;
pub mod models;
pub mod storage;
pub mod web;

pub use error::{Error, Result};
