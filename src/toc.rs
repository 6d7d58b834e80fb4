//! Table-of-contents synthesis.

/// First page a chapter can start on: one cover page plus one TOC page.
const FIRST_CHAPTER_PAGE: u32 = 3;

/// Rough pages-per-chapter estimate used for TOC page numbers.
///
/// The estimate is deliberately approximate; nothing downstream relies on
/// it matching the real page breaks.
const PAGES_PER_CHAPTER_ESTIMATE: u32 = 2;

/// One line of the table of contents.
#[derive(Debug, Clone)]
pub struct TocEntry {
    pub ordinal: u32,
    pub title: String,
}

/// Estimated starting page for the chapter at `position` in the plan.
pub fn estimated_page(position: usize) -> u32 {
    FIRST_CHAPTER_PAGE + position as u32 * PAGES_PER_CHAPTER_ESTIMATE
}

/// Build the TOC document for an ordinal-sorted entry list.
///
/// Entries are emitted in input order; the caller is responsible for having
/// sorted them.
pub fn build_toc(title: &str, entries: &[TocEntry]) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
             <meta charset=\"UTF-8\">\n\
             <title>Table of Contents</title>\n\
             <style>\n\
                 body {{ font-family: Arial, sans-serif; line-height: 1.6; }}\n\
                 h1 {{ text-align: center; margin-bottom: 2em; }}\n\
                 .toc-entry {{ margin-bottom: 0.5em; }}\n\
                 .toc-chapter {{ font-weight: bold; }}\n\
                 .toc-page {{ float: right; }}\n\
             </style>\n\
         </head>\n\
         <body>\n\
             <h1>{title}</h1>\n\
             <h2>Table of Contents</h2>\n\
             <div id=\"toc\">\n",
        title = escape_html(title),
    );

    for (position, entry) in entries.iter().enumerate() {
        html.push_str(&format!(
            "        <div class=\"toc-entry\"><span class=\"toc-chapter\">Chapter {}: {}</span><span class=\"toc-page\">{}</span></div>\n",
            entry.ordinal,
            escape_html(&entry.title),
            estimated_page(position),
        ));
    }

    html.push_str("    </div>\n</body>\n</html>\n");
    html
}

/// Minimal escaping for text interpolated into TOC markup.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<TocEntry> {
        vec![
            TocEntry { ordinal: 1, title: "The First Step".to_string() },
            TocEntry { ordinal: 2, title: "Down the Well".to_string() },
            TocEntry { ordinal: 5, title: "Return".to_string() },
        ]
    }

    #[test]
    fn test_toc_lists_entries_in_order() {
        let html = build_toc("My Novel", &entries());
        let first = html.find("Chapter 1: The First Step").unwrap();
        let second = html.find("Chapter 2: Down the Well").unwrap();
        let third = html.find("Chapter 5: Return").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_toc_page_estimates() {
        assert_eq!(estimated_page(0), 3);
        assert_eq!(estimated_page(1), 5);
        assert_eq!(estimated_page(2), 7);

        let html = build_toc("T", &entries());
        assert!(html.contains("<span class=\"toc-page\">3</span>"));
        assert!(html.contains("<span class=\"toc-page\">7</span>"));
    }

    #[test]
    fn test_toc_empty() {
        let html = build_toc("T", &[]);
        assert!(html.contains("Table of Contents"));
        // The stylesheet always names the class; no entry element is emitted.
        assert!(!html.contains("class=\"toc-entry\""));
    }

    #[test]
    fn test_toc_escapes_titles() {
        let entries = vec![TocEntry { ordinal: 1, title: "A < B & C".to_string() }];
        let html = build_toc("Q&A", &entries);
        assert!(html.contains("Chapter 1: A &lt; B &amp; C"));
        assert!(html.contains("<h1>Q&amp;A</h1>"));
    }
}
