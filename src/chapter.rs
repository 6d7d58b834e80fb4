//! Chapter identification: ordinals and titles from scraped sources.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};

/// Ordinal assigned to sources with no recognizable number.
///
/// Large enough that unidentifiable chapters always sort after real ones.
pub const UNNUMBERED: u32 = 99_999;

/// Filename patterns tried from most to least specific.
static ORDINAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"chapter[_\-\s]*(\d+)").expect("chapter pattern"),
        Regex::new(r"ch(\d+)").expect("ch pattern"),
        Regex::new(r"(\d+)").expect("bare integer pattern"),
    ]
});

/// One discovered chapter HTML source.
#[derive(Debug, Clone)]
pub struct ChapterSource {
    /// Origin file path.
    pub path: PathBuf,
    /// Position in discovery order, used to keep equal-ordinal sorts stable.
    pub index: usize,
    /// Sort ordinal derived from the filename.
    pub ordinal: u32,
    /// Display title from the document, falling back to the file stem.
    pub title: String,
    /// Raw HTML content.
    pub html: String,
}

impl ChapterSource {
    /// Read a source file and derive its ordinal and title.
    pub fn from_file(path: &Path, index: usize) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let html = String::from_utf8_lossy(&bytes).into_owned();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            index,
            ordinal: identify(&stem),
            title: extract_title(&html, &stem),
            html,
        })
    }
}

/// Derive a chapter ordinal from a source name.
///
/// Total function: tries `chapter_N`, then `chN`, then the first bare
/// integer, and returns [`UNNUMBERED`] when nothing matches. Matching is
/// case-insensitive and ignores the file extension.
pub fn identify(name: &str) -> u32 {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let stem = stem.to_lowercase();

    for pattern in ORDINAL_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&stem) {
            if let Ok(n) = caps[1].parse::<u32>() {
                return n;
            }
        }
    }

    UNNUMBERED
}

/// Extract a display title from chapter HTML.
///
/// Prefers the document `<title>`, then the first `<h1>`, then the fallback
/// (normally the file stem). Never fails.
pub fn extract_title(html: &str, fallback: &str) -> String {
    let document = Html::parse_document(html);

    for css in ["title", "h1"] {
        if let Ok(selector) = Selector::parse(css) {
            if let Some(element) = document.select(&selector).next() {
                let text = element.text().collect::<Vec<_>>().join(" ");
                let text = text.trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identify_chapter_token() {
        assert_eq!(identify("chapter_1.html"), 1);
        assert_eq!(identify("chapter-42.html"), 42);
        assert_eq!(identify("Chapter 7.html"), 7);
        assert_eq!(identify("CHAPTER_310.HTML"), 310);
    }

    #[test]
    fn test_identify_ch_token() {
        assert_eq!(identify("ch3.html"), 3);
        assert_eq!(identify("novel_ch12.html"), 12);
    }

    #[test]
    fn test_identify_bare_integer() {
        assert_eq!(identify("005.html"), 5);
        assert_eq!(identify("part 9 final.html"), 9);
    }

    #[test]
    fn test_identify_sentinel() {
        assert_eq!(identify("prologue.html"), UNNUMBERED);
        assert_eq!(identify("epilogue"), UNNUMBERED);
        assert_eq!(identify(""), UNNUMBERED);
    }

    #[test]
    fn test_identify_prefers_chapter_token() {
        // The explicit token wins over earlier bare digits.
        assert_eq!(identify("2024_chapter_3.html"), 3);
    }

    #[test]
    fn test_identify_ignores_extension_digits() {
        // ".ht1ml" is not a realistic input, but extension stripping means
        // digits after the last dot never contribute.
        assert_eq!(identify("prologue.mp4"), UNNUMBERED);
    }

    #[test]
    fn test_sentinel_sorts_last() {
        let mut names = vec!["epilogue.html", "chapter_2.html", "chapter_1.html"];
        names.sort_by_key(|n| identify(n));
        assert_eq!(names, vec!["chapter_1.html", "chapter_2.html", "epilogue.html"]);
    }

    #[test]
    fn test_extract_title_from_title_tag() {
        let html = "<html><head><title> The First Step </title></head><body></body></html>";
        assert_eq!(extract_title(html, "chapter_1"), "The First Step");
    }

    #[test]
    fn test_extract_title_from_h1() {
        let html = "<html><body><h1>Awakening</h1><p>text</p></body></html>";
        assert_eq!(extract_title(html, "chapter_1"), "Awakening");
    }

    #[test]
    fn test_extract_title_fallback() {
        let html = "<html><body><p>no headings here</p></body></html>";
        assert_eq!(extract_title(html, "chapter_9"), "chapter_9");
    }

    proptest! {
        #[test]
        fn identify_is_total(name in "\\PC{0,40}") {
            // Never panics, whatever the filename looks like.
            let _ = identify(&name);
        }

        #[test]
        fn identify_finds_chapter_numbers(n in 0u32..99_000) {
            prop_assert_eq!(identify(&format!("chapter_{}.html", n)), n);
            prop_assert_eq!(identify(&format!("ch{}.html", n)), n);
        }

        #[test]
        fn digitless_names_get_sentinel(name in "[a-z _-]{0,30}") {
            prop_assert_eq!(identify(&format!("{}.html", name)), UNNUMBERED);
        }
    }
}
