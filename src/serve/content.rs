//! Response body rewriting.

use crate::utils::mime;

/// Inject the reload script into HTML bodies; others pass through.
pub fn maybe_inject_reload(body: Vec<u8>, content_type: &str, script: &str) -> Vec<u8> {
    if mime::is_html(content_type) {
        inject_before_body_end(&body, script.as_bytes())
    } else {
        body
    }
}

/// Insert `snippet` before the last `</body>`, or append it when absent.
fn inject_before_body_end(content: &[u8], snippet: &[u8]) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let pos = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + snippet.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(snippet);
    result.extend_from_slice(&content[pos..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mime::types::{CSS, HTML};

    const TAG: &str = "<script src=\"/r.js\"></script>";

    #[test]
    fn test_injects_before_body_end() {
        let out = maybe_inject_reload(b"<html><body><p>hi</p></body></html>".to_vec(), HTML, TAG);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<html><body><p>hi</p><script src=\"/r.js\"></script></body></html>"
        );
    }

    #[test]
    fn test_uses_last_body_tag_case_insensitive() {
        let html = b"<body><pre>&lt;/body&gt; </body></pre></BODY>".to_vec();
        let out = String::from_utf8(maybe_inject_reload(html, HTML, TAG)).unwrap();
        assert!(out.ends_with("<script src=\"/r.js\"></script></BODY>"));
    }

    #[test]
    fn test_appends_without_body_tag() {
        let out = maybe_inject_reload(b"<p>fragment</p>".to_vec(), HTML, TAG);
        assert!(String::from_utf8(out).unwrap().ends_with(TAG));
    }

    #[test]
    fn test_non_html_untouched() {
        let css = b"body{}".to_vec();
        assert_eq!(maybe_inject_reload(css.clone(), CSS, TAG), css);
    }
}
