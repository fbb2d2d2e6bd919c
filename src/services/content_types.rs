//! Content-type <-> file-extension mapping and filename sanitization.
//!
//! Two independent tables are kept on purpose: several extensions map to the
//! same content type (`.jpg`/`.jpeg`), but going the other way only one
//! extension is ever chosen. Misses fall back to the broader `mime_guess`
//! database, then to a generic binary default.

/// Extension used when nothing better can be resolved.
pub const DEFAULT_EXTENSION: &str = ".bin";

/// Content type used when nothing better can be resolved.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Longest sanitized filename, in characters.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Longest blob extension in bytes: a hyphenated UUID (36 bytes) plus the
/// extension must fit in a 255-byte file name.
const MAX_EXTENSION_BYTES: usize = 255 - 36;

/// Content type -> extension.
const CONTENT_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("text/plain", ".txt"),
    ("text/html", ".html"),
    ("text/css", ".css"),
    ("application/javascript", ".js"),
    ("application/json", ".json"),
    ("application/xml", ".xml"),
    ("application/pdf", ".pdf"),
    ("application/zip", ".zip"),
    ("application/x-tar", ".tar"),
    ("application/gzip", ".gz"),
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/gif", ".gif"),
    ("image/svg+xml", ".svg"),
    ("video/mp4", ".mp4"),
    ("audio/mpeg", ".mp3"),
    ("audio/wav", ".wav"),
    ("video/x-msvideo", ".avi"),
    ("video/quicktime", ".mov"),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("application/vnd.ms-excel", ".xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    ("application/vnd.ms-powerpoint", ".ppt"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".pptx",
    ),
];

/// Extension -> content type.
const EXTENSION_CONTENT_TYPES: &[(&str, &str)] = &[
    (".txt", "text/plain"),
    (".html", "text/html"),
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".json", "application/json"),
    (".xml", "application/xml"),
    (".pdf", "application/pdf"),
    (".zip", "application/zip"),
    (".tar", "application/x-tar"),
    (".gz", "application/gzip"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
    (".svg", "image/svg+xml"),
    (".mp4", "video/mp4"),
    (".mp3", "audio/mpeg"),
    (".wav", "audio/wav"),
    (".avi", "video/x-msvideo"),
    (".mov", "video/quicktime"),
    (".doc", "application/msword"),
    (
        ".docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (".xls", "application/vnd.ms-excel"),
    (
        ".xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    (".ppt", "application/vnd.ms-powerpoint"),
    (
        ".pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
];

/// Resolve the blob extension for a content type.
///
/// Parameters after `;` are ignored and matching is case-insensitive. Never
/// fails: unknown types resolve to [`DEFAULT_EXTENSION`].
pub fn extension_for_content_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if let Some((_, ext)) = CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == essence)
    {
        return (*ext).to_string();
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| {
            exts.iter()
                .map(|ext| format!(".{}", ext))
                .find(|ext| is_path_safe_extension(ext))
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Guess a content type from a filename's extension.
///
/// Never fails: unknown extensions resolve to [`DEFAULT_CONTENT_TYPE`].
pub fn content_type_for_extension(file_name: &str) -> String {
    let ext = match file_extension(file_name) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return DEFAULT_CONTENT_TYPE.to_string(),
    };

    if let Some((_, mime)) = EXTENSION_CONTENT_TYPES.iter().find(|(e, _)| *e == ext) {
        return (*mime).to_string();
    }

    ext.strip_prefix('.')
        .and_then(|bare| mime_guess::from_ext(bare).first_raw())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

/// Neutralize path separators and traversal markers in a client filename.
///
/// The result never contains `/`, `\`, `..` or `~` and is at most
/// [`MAX_FILE_NAME_LEN`] characters long. It is only ever used for display;
/// storage paths are built from generated identifiers.
pub fn sanitize_file_name(name: &str) -> String {
    // A single pass is enough: runs of dots shrink to at most one trailing dot.
    let cleaned = name.replace(['/', '\\', '~'], "_").replace("..", "_");

    match cleaned.char_indices().nth(MAX_FILE_NAME_LEN) {
        Some((cut, _)) => cleaned[..cut].to_string(),
        None => cleaned,
    }
}

/// Suffix of the last path element of `file_name`, including the dot.
pub fn file_extension(file_name: &str) -> Option<&str> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    base.rfind('.').map(|idx| &base[idx..])
}

/// Filename suffix that is safe to append to a blob path.
///
/// `None` when the name has no suffix or the suffix cannot be part of a file
/// name; callers then fall back to [`DEFAULT_EXTENSION`].
pub fn path_safe_extension(file_name: &str) -> Option<&str> {
    file_extension(file_name).filter(|ext| is_path_safe_extension(ext))
}

/// An extension may not contain separators or control characters and must
/// leave room for the identifier. The empty extension is allowed.
pub(crate) fn is_path_safe_extension(ext: &str) -> bool {
    ext.len() <= MAX_EXTENSION_BYTES
        && !ext
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_content_types_map_to_table_extensions() {
        assert_eq!(extension_for_content_type("image/png"), ".png");
        assert_eq!(extension_for_content_type("image/jpeg"), ".jpg");
        assert_eq!(extension_for_content_type("application/javascript"), ".js");
        assert_eq!(
            extension_for_content_type(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            ".xlsx"
        );
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert_eq!(
            extension_for_content_type("text/plain; charset=utf-8"),
            ".txt"
        );
        assert_eq!(extension_for_content_type("Text/HTML ;charset=x"), ".html");
    }

    #[test]
    fn unknown_content_type_falls_back_to_bin() {
        assert_eq!(
            extension_for_content_type("application/x-unknown-made-up"),
            DEFAULT_EXTENSION
        );
        assert_eq!(extension_for_content_type(""), DEFAULT_EXTENSION);
        assert_eq!(extension_for_content_type(";;;"), DEFAULT_EXTENSION);
    }

    #[test]
    fn extensions_map_to_content_types_case_insensitively() {
        assert_eq!(content_type_for_extension("photo.JPEG"), "image/jpeg");
        assert_eq!(content_type_for_extension("photo.jpg"), "image/jpeg");
        assert_eq!(content_type_for_extension("dir/app.js"), "application/javascript");
        assert_eq!(content_type_for_extension("README"), DEFAULT_CONTENT_TYPE);
        assert_eq!(
            content_type_for_extension("data.definitely-not-real"),
            DEFAULT_CONTENT_TYPE
        );
    }

    #[test]
    fn tables_are_not_exact_inverses() {
        // Both spellings resolve to image/jpeg, only one comes back.
        assert_eq!(content_type_for_extension("a.jpeg"), "image/jpeg");
        assert_eq!(extension_for_content_type("image/jpeg"), ".jpg");
    }

    #[test]
    fn sanitize_strips_traversal() {
        let cleaned = sanitize_file_name("../../etc/passwd");
        assert!(!cleaned.contains('/'));
        assert!(!cleaned.contains(".."));
        assert!(cleaned.ends_with("etc_passwd"));

        let cleaned = sanitize_file_name("..\\..\\windows\\system32");
        assert!(!cleaned.contains('\\'));
        assert!(!cleaned.contains(".."));

        assert_eq!(sanitize_file_name("~root"), "_root");
        assert_eq!(sanitize_file_name("photo.png"), "photo.png");
        assert_eq!(sanitize_file_name(""), "");
        assert!(!sanitize_file_name(".....").contains(".."));
    }

    #[test]
    fn sanitize_truncates_on_char_boundaries() {
        let long = "a".repeat(400);
        assert_eq!(sanitize_file_name(&long).chars().count(), MAX_FILE_NAME_LEN);

        let wide = "é".repeat(300);
        let cleaned = sanitize_file_name(&wide);
        assert_eq!(cleaned.chars().count(), MAX_FILE_NAME_LEN);
    }

    #[test]
    fn file_extension_uses_last_path_element() {
        assert_eq!(file_extension("photo.png"), Some(".png"));
        assert_eq!(file_extension("archive.tar.gz"), Some(".gz"));
        assert_eq!(file_extension("some.dir/README"), None);
        assert_eq!(file_extension(""), None);
    }

    #[test]
    fn path_safe_extension_keeps_ordinary_suffixes() {
        assert_eq!(path_safe_extension("photo.png"), Some(".png"));
        assert_eq!(path_safe_extension("main.c++"), Some(".c++"));
        assert_eq!(path_safe_extension("backup.tar-v2"), Some(".tar-v2"));
        assert_eq!(path_safe_extension("data.my_ext"), Some(".my_ext"));
        assert_eq!(path_safe_extension("trailing."), Some("."));
        assert_eq!(path_safe_extension("noext"), None);
    }

    #[test]
    fn path_safe_extension_rejects_unusable_suffixes() {
        assert_eq!(path_safe_extension("bad.a\0b"), None);
        assert_eq!(path_safe_extension("bad.a\nb"), None);
        let long = format!("x.{}", "a".repeat(MAX_EXTENSION_BYTES));
        assert_eq!(path_safe_extension(&long), None);
        let fits = format!("x.{}", "a".repeat(MAX_EXTENSION_BYTES - 1));
        assert!(path_safe_extension(&fits).is_some());
    }

    #[test]
    fn misses_fall_back_to_guessed_types() {
        assert_eq!(extension_for_content_type("image/webp"), ".webp");
        assert_eq!(content_type_for_extension("photo.WEBP"), "image/webp");
    }
}
