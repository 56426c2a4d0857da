use url::Url;

pub const IMAGE_EXTENSIONS: [&str; 7] = [".jpg", ".jpeg", ".png", ".webp", ".avif", ".gif", ".svg"];

/// Accepts absolute http(s) URLs whose path ends in a known image extension.
///
/// Query strings and fragments are not part of the check. Nothing is fetched.
pub fn is_valid_image_url(candidate: Option<&str>) -> bool {
    let Some(candidate) = candidate else {
        return false;
    };

    let Ok(parsed) = Url::parse(candidate.trim()) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let path = parsed.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|extension| path.ends_with(extension))
}

/// Keeps a valid URL (trimmed) and drops anything else.
pub fn sanitize_image_url(candidate: Option<String>) -> Option<String> {
    candidate
        .map(|value| value.trim().to_string())
        .filter(|value| is_valid_image_url(Some(value)))
}
