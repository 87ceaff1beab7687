/// Returns the subtype of a MIME type (`image/png; q=1` -> `png`).
pub fn subtype(mime_type: &str) -> Option<&str> {
    let (_, rest) = mime_type.split_once('/')?;
    let subtype = rest.split(';').next().unwrap_or(rest).trim();
    if subtype.is_empty() {
        None
    } else {
        Some(subtype)
    }
}

/// File extension for an image MIME type, or `None` if it is unusable in a filename.
///
/// Vendor and experimental subtypes (`x-png`, `vnd.microsoft.icon`) are kept;
/// anything that could step outside the directory is refused.
pub fn extension_for_mime(mime_type: &str) -> Option<String> {
    let subtype = subtype(mime_type)?;
    let ext = subtype.split('+').next().unwrap_or(subtype);
    let safe_chars = ext
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if ext.is_empty()
        || !safe_chars
        || ext.contains("..")
        || ext.starts_with('.')
        || ext.ends_with('.')
    {
        tracing::warn!("Cannot derive a file extension from MIME type {:?}", mime_type);
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
