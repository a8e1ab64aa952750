//! Suffix ⇄ image-format lookup table.

use image::ImageFormat;

/// Extension used when a URL carries no recognizable image suffix.
/// Rewritten after validation detects the real format.
pub const PLACEHOLDER_EXT: &str = "unknown";

/// Known URL suffixes and the format each implies.
const KNOWN_SUFFIXES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("jpe", ImageFormat::Jpeg),
    ("jfif", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("webp", ImageFormat::WebP),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("ico", ImageFormat::Ico),
];

/// Finds the image suffix in `url`'s path: rightmost match wins, longest on ties.
/// A match must end at a non-alphanumeric boundary, so `.jpgx` is not `.jpg`.
pub fn ext_from_url(url: &str) -> Option<&'static str> {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase(),
    };
    let bytes = path.as_bytes();

    let mut best: Option<(usize, &'static str)> = None;
    for &(suffix, _) in KNOWN_SUFFIXES {
        let needle = format!(".{}", suffix);
        for (pos, _) in path.match_indices(&needle) {
            let end = pos + needle.len();
            let bounded = bytes.get(end).map_or(true, |b| !b.is_ascii_alphanumeric());
            if !bounded {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_pos, best_suffix)) => {
                    pos > best_pos || (pos == best_pos && suffix.len() > best_suffix.len())
                }
            };
            if better {
                best = Some((pos, suffix));
            }
        }
    }
    best.map(|(_, suffix)| suffix)
}

/// Format implied by a known suffix.
pub fn format_for_ext(ext: &str) -> Option<ImageFormat> {
    KNOWN_SUFFIXES
        .iter()
        .find(|(suffix, _)| suffix.eq_ignore_ascii_case(ext))
        .map(|(_, format)| *format)
}

/// Extension written for a detected format.
pub fn ext_for_format(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::Bmp => "bmp",
        ImageFormat::WebP => "webp",
        ImageFormat::Tiff => "tif",
        ImageFormat::Ico => "ico",
        other => other.extensions_str().first().copied().unwrap_or(PLACEHOLDER_EXT),
    }
}

/// Extensions a renamed placeholder file may have ended up with.
pub fn canonical_exts() -> impl Iterator<Item = &'static str> {
    [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::Bmp,
        ImageFormat::WebP,
        ImageFormat::Tiff,
        ImageFormat::Ico,
    ]
    .into_iter()
    .map(ext_for_format)
}
