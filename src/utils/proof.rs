use std::path::{Component, Path};

/// Upload boundary restricts proof documents to images and PDFs.
const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "pdf"];

/// Check a proof reference handed over by the upload side.
///
/// The reference must be a plain relative path (no `..`, no root) ending
/// in one of the accepted document types.
pub fn check_reference(reference: &str) -> Result<(), String> {
    let path = Path::new(reference);

    let relative = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if !relative {
        return Err("must be a relative path inside the upload area".to_string());
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err("Only images (JPEG/JPG/PNG) and PDFs are allowed".to_string()),
    }
}
