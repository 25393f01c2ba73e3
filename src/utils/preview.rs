use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::models::SelectedFile;

const DATA_URI_PREFIX: &str = "data:";

/// Route serving the selected image when it is too large to inline.
pub const LOCAL_PREVIEW_PATH: &str = "/session/preview";

/// Largest image inlined as a `data:` URI.
pub const MAX_INLINE_PREVIEW: usize = 256 * 1024;

/// Local preview reference for an image selection, `None` for anything else.
///
/// Small images become a `data:` URI built from the blob itself. Larger ones
/// get a reference to [`LOCAL_PREVIEW_PATH`], which serves the selection out
/// of the session. Neither touches the storage backend and both die with the
/// session.
pub fn local_preview(file: &SelectedFile) -> Option<String> {
    if !file.is_image() {
        return None;
    }

    if file.size() > MAX_INLINE_PREVIEW {
        return Some(format!("{}?id={}", LOCAL_PREVIEW_PATH, uuid::Uuid::new_v4()));
    }

    Some(format!(
        "{}{};base64,{}",
        DATA_URI_PREFIX,
        file.content_type.essence_str(),
        STANDARD.encode(&file.data)
    ))
}

pub fn is_local_preview(reference: &str) -> bool {
    reference.starts_with(DATA_URI_PREFIX) || reference.starts_with(LOCAL_PREVIEW_PATH)
}
