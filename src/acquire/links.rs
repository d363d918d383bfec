// src/acquire/links.rs
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

// --- CSS Selectors (Lazy Static) ---
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Failed to compile ANCHOR_SELECTOR"));

// --- Regex Patterns (Lazy Static) ---
static EXCEL_HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.xlsx?\b").expect("Failed to compile EXCEL_HREF_RE"));
static EXCEL_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:excel|download)\b").expect("Failed to compile EXCEL_TEXT_RE"));

/// A workbook link found on the applications index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookLink {
    pub url: String,
    /// Name the workbook is stored under locally.
    pub file_name: String,
}

/// Collects workbook links from an index page, de-duplicated by file name.
///
/// A link qualifies when its href mentions `.xls`/`.xlsx` or its text mentions
/// "excel" or "download". Relative hrefs resolve against `page_url`.
pub fn collect_workbook_links(html: &str, page_url: &Url, limit: Option<usize>) -> Vec<WorkbookLink> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        if limit.is_some_and(|max| links.len() >= max) {
            break;
        }

        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        let text = anchor.text().collect::<String>();
        if !EXCEL_HREF_RE.is_match(href) && !EXCEL_TEXT_RE.is_match(&text) {
            continue;
        }

        let url = match page_url.join(href) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping unparseable href '{}': {}", href, e);
                continue;
            }
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }

        let file_name = file_name_for(&url);
        if !seen.insert(file_name.clone()) {
            tracing::trace!("Skipping duplicate workbook link: {}", file_name);
            continue;
        }

        links.push(WorkbookLink { url: url.to_string(), file_name });
    }

    tracing::debug!("Found {} workbook links on {}", links.len(), page_url);
    links
}

/// Last path segment of the URL (query dropped), with `.xlsx` appended when the segment
/// has no Excel extension.
fn file_name_for(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("download");

    let lower = segment.to_lowercase();
    if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        segment.to_string()
    } else {
        format!("{}.xlsx", segment)
    }
}

/// Whether a downloaded payload is plausibly a workbook: the server says so, or it starts
/// with the ZIP signature every xlsx file carries.
pub fn looks_like_workbook(content_type: Option<&str>, bytes: &[u8]) -> bool {
    let declared = content_type
        .map(|ct| {
            let ct = ct.to_lowercase();
            ct.contains("excel") || ct.contains("spreadsheet")
        })
        .unwrap_or(false);
    declared || bytes.starts_with(b"PK\x03\x04")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://www.treasurer.ca.gov/ctcac/2025/thirdround/4percent/application/index.asp").unwrap()
    }

    #[test]
    fn test_collect_workbook_links() {
        let html = r#"
            <html><body>
            <a href="/ctcac/2025/thirdround/4percent/application/CA-25-401.xlsx">CA-25-401</a>
            <a href="CA-25-402.xlsx?v=2">CA-25-402</a>
            <a href="https://example.org/files/CA-25-403">Download</a>
            <a href="/ctcac/2025/thirdround/4percent/application/CA-25-401.xlsx">again</a>
            <a href="/ctcac/notes.pdf">Notes</a>
            <a href="mailto:someone@example.org">Excel questions</a>
            </body></html>
        "#;

        let links = collect_workbook_links(html, &page(), None);
        assert_eq!(
            links,
            vec![
                WorkbookLink {
                    url: "https://www.treasurer.ca.gov/ctcac/2025/thirdround/4percent/application/CA-25-401.xlsx".into(),
                    file_name: "CA-25-401.xlsx".into(),
                },
                WorkbookLink {
                    url: "https://www.treasurer.ca.gov/ctcac/2025/thirdround/4percent/application/CA-25-402.xlsx?v=2".into(),
                    file_name: "CA-25-402.xlsx".into(),
                },
                WorkbookLink {
                    url: "https://example.org/files/CA-25-403".into(),
                    file_name: "CA-25-403.xlsx".into(),
                },
            ]
        );
    }

    #[test]
    fn test_limit() {
        let html = r#"<a href="a.xlsx">a</a><a href="b.xlsx">b</a><a href="c.xls">c</a>"#;
        let links = collect_workbook_links(html, &page(), Some(2));
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].file_name, "b.xlsx");
    }

    #[test]
    fn test_looks_like_workbook() {
        assert!(looks_like_workbook(
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            b""
        ));
        assert!(looks_like_workbook(Some("application/vnd.ms-excel"), b""));
        assert!(looks_like_workbook(None, b"PK\x03\x04rest"));
        assert!(!looks_like_workbook(Some("text/html"), b"<html>"));
    }
}
