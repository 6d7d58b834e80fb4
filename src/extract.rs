//! Content-area extraction and render-ready document wrapping.

use scraper::{Html, Selector};

/// CSS selector for the content container the scraper leaves behind.
pub const DEFAULT_CONTENT_SELECTOR: &str = "div.content-area";

/// Stylesheet for the wrapped document.
///
/// The font stack targets Korean text first (the source site's script) with
/// a sans-serif fallback; the fixed column width keeps long chapters
/// readable once paginated.
const DOCUMENT_STYLE: &str = "\
        body {
            font-family: 'Malgun Gothic', 'Nanum Gothic', 'NanumMyeongjo', sans-serif;
            line-height: 1.6;
            font-size: 11pt;
        }
        .content-area {
            width: 100%;
            max-width: 800px;
            margin: 0 auto;
        }";

/// Check that a configured content selector is valid CSS.
pub fn validate_selector(css: &str) -> Result<(), String> {
    Selector::parse(css)
        .map(|_| ())
        .map_err(|e| format!("invalid content selector `{}`: {}", css, e))
}

/// Extract the content container from a raw chapter document.
///
/// Returns `None` when the container is absent so callers skip the source
/// instead of aborting the run. When present, the container's markup is
/// carried over unmodified into a minimal standalone document with an
/// explicit UTF-8 declaration.
pub fn extract_content(raw_html: &str, content_selector: &str) -> Option<String> {
    let selector = Selector::parse(content_selector).ok()?;
    let document = Html::parse_document(raw_html);
    let container = document.select(&selector).next()?;

    Some(wrap_document(&container.html()))
}

/// Wrap a content fragment in a self-contained, render-ready document.
fn wrap_document(fragment: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
             <meta charset=\"UTF-8\">\n\
             <style>\n{style}\n    </style>\n\
         </head>\n\
         <body>\n\
             {fragment}\n\
         </body>\n\
         </html>\n",
        style = DOCUMENT_STYLE,
        fragment = fragment,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_present_container() {
        let html = r#"<html><body>
            <nav>site menu</nav>
            <div class="content-area"><p>First paragraph.</p><p>Second.</p></div>
            <footer>ads</footer>
        </body></html>"#;

        let doc = extract_content(html, DEFAULT_CONTENT_SELECTOR).unwrap();
        assert!(doc.contains("<p>First paragraph.</p><p>Second.</p>"));
        assert!(doc.contains("charset=\"UTF-8\""));
        // Surrounding chrome is dropped.
        assert!(!doc.contains("site menu"));
        assert!(!doc.contains("ads"));
    }

    #[test]
    fn test_extract_missing_container() {
        let html = "<html><body><p>bare page with no marker</p></body></html>";
        assert_eq!(extract_content(html, DEFAULT_CONTENT_SELECTOR), None);
    }

    #[test]
    fn test_extract_preserves_inner_markup() {
        let html = r#"<div class="content-area"><em>kept</em> <b>as-is</b></div>"#;
        let doc = extract_content(html, DEFAULT_CONTENT_SELECTOR).unwrap();
        assert!(doc.contains("<em>kept</em> <b>as-is</b>"));
    }

    #[test]
    fn test_extract_multibyte_content() {
        let html = r#"<div class="content-area"><p>안녕하세요, 독자 여러분.</p></div>"#;
        let doc = extract_content(html, DEFAULT_CONTENT_SELECTOR).unwrap();
        assert!(doc.contains("안녕하세요, 독자 여러분."));
        assert!(doc.contains("Malgun Gothic"));
    }

    #[test]
    fn test_custom_selector() {
        let html = r#"<article id="story"><p>custom container</p></article>"#;
        assert!(extract_content(html, "article#story").is_some());
        assert!(extract_content(html, DEFAULT_CONTENT_SELECTOR).is_none());
    }

    #[test]
    fn test_validate_selector() {
        assert!(validate_selector(DEFAULT_CONTENT_SELECTOR).is_ok());
        assert!(validate_selector("div..broken[").is_err());
    }
}
