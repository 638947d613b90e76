// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markup strategy: a self-contained HTML page with one page-break section
// per image. Used where the target can print HTML to PDF itself (web).

use std::fmt::Write as _;

use snapdoc_core::error::Result;
use snapdoc_core::types::RenderTarget;

use super::{DocumentDraft, DocumentRenderer, display_time};

const STYLE: &str = "\
      body { font-family: Arial, sans-serif; margin: 40px; }
      .page { page-break-after: always; text-align: center; }
      .page img { max-width: 100%; height: auto; margin: 20px 0; }
      h1 { color: #333; margin-bottom: 30px; }";

pub struct MarkupRenderer;

impl DocumentRenderer for MarkupRenderer {
    fn target(&self) -> RenderTarget {
        RenderTarget::Markup
    }

    fn mime_type(&self) -> &'static str {
        "text/html"
    }

    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, draft: &DocumentDraft) -> Result<Vec<u8>> {
        let title = escape(&draft.title);
        let mut html = String::with_capacity(512 + draft.pages.len() * 256);

        // `write!` into a String cannot fail.
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset=\"utf-8\">\n    \
             <meta name=\"created\" content=\"{created}\">\n    <title>{title}</title>\n    \
             <style>\n{STYLE}\n    </style>\n  </head>\n  <body>\n    <h1>{title}</h1>\n",
            created = draft.created_at.to_rfc3339(),
        );

        for page in &draft.pages {
            let _ = write!(
                html,
                "    <div class=\"page\" data-capture-id=\"{id}\">\n      \
                 <img src=\"{src}\" />\n      <p>Captured: {when}</p>\n    </div>\n",
                id = escape(page.capture_id.as_str()),
                src = escape(&page.uri),
                when = display_time(&page.captured_at),
            );
        }

        html.push_str("  </body>\n</html>\n");
        Ok(html.into_bytes())
    }
}

/// Minimal HTML escaping for text and double-quoted attribute values.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use snapdoc_core::types::PageEntry;

    fn draft(uris: &[&str]) -> DocumentDraft {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        DocumentDraft {
            title: "Camera Document".into(),
            created_at: at,
            pages: uris
                .iter()
                .enumerate()
                .map(|(i, uri)| PageEntry {
                    capture_id: format!("id-{i}").as_str().into(),
                    uri: (*uri).into(),
                    captured_at: at,
                })
                .collect(),
        }
    }

    fn render(d: &DocumentDraft) -> String {
        String::from_utf8(MarkupRenderer.render(d).unwrap()).unwrap()
    }

    #[test]
    fn one_section_per_image_in_order() {
        let html = render(&draft(&["file://b.jpg", "file://a.jpg", "file://c.jpg"]));
        assert_eq!(html.matches("<div class=\"page\"").count(), 3);

        let b = html.find("file://b.jpg").unwrap();
        let a = html.find("file://a.jpg").unwrap();
        let c = html.find("file://c.jpg").unwrap();
        assert!(b < a && a < c);
    }

    #[test]
    fn repeated_images_are_not_collapsed() {
        let html = render(&draft(&["file://a.jpg", "file://a.jpg"]));
        assert_eq!(html.matches("src=\"file://a.jpg\"").count(), 2);
    }

    #[test]
    fn caption_shows_capture_time() {
        let html = render(&draft(&["file://a.jpg"]));
        assert!(html.contains("<p>Captured: 2026-03-01 12:00:00 UTC</p>"));
    }

    #[test]
    fn uri_cannot_break_out_of_attribute() {
        let html = render(&draft(&["file://x.jpg\" onerror=\"alert(1)"]));
        assert!(!html.contains("\" onerror=\""));
        assert!(html.contains("&quot; onerror=&quot;"));
    }

    #[test]
    fn identical_drafts_render_identically() {
        let d = draft(&["file://a.jpg", "file://b.jpg"]);
        assert_eq!(MarkupRenderer.render(&d).unwrap(), MarkupRenderer.render(&d).unwrap());
    }
}
