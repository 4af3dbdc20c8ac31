use std::path::Path;

/// Type used when the extension is unknown or missing.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Maps a file name to its content type by extension.
pub fn extension_to_type(path: &str) -> &'static str {
    mime_guess::from_path(Path::new(path))
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_extensions() {
        assert_eq!(extension_to_type("index.html"), "text/html");
        assert_eq!(extension_to_type("img/logo.png"), "image/png");
        assert_eq!(extension_to_type("notes.zzunknown"), DEFAULT_CONTENT_TYPE);
        assert_eq!(extension_to_type("Makefile"), DEFAULT_CONTENT_TYPE);
    }
}
