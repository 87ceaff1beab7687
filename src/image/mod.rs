//! Image payload handling
//!
//! Decodes and validates inbound base64 images, re-encodes generated images
//! as data URLs, and derives file extensions from MIME types.

pub mod codec;
pub mod mime;

pub use codec::{decode_inbound_image, encode_for_transport, ImagePayload};
