use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

/// Length of a fingerprint in hex characters (128 bits).
pub const FINGERPRINT_LEN: usize = 32;

/// Computes the content fingerprint for a file.
///
/// The digest is taken over the base64 encoding of the raw bytes followed
/// by the file extension, then truncated to [`FINGERPRINT_LEN`] hex
/// characters. Folding the extension in means identical bytes served under
/// different extensions get distinct storage keys, while identical bytes
/// with the same extension dedup to one.
pub fn fingerprint_bytes(data: &[u8], extension: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(BASE64.encode(data).as_bytes());
    hasher.update(extension.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(FINGERPRINT_LEN);
    digest
}

/// Returns the extension of a path without the leading dot (empty if none).
pub fn extension_of(path: &str) -> &str {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

/// Maps a file extension to its MIME content type.
///
/// Unknown extensions fall back to a generic binary type.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "webmanifest" => "application/manifest+json",
        _ => "application/octet-stream",
    }
}
