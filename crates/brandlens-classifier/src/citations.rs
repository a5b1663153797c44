//! Citation extraction: backend-native URLs or markdown links in the text.

use regex::Regex;

use crate::types::Citation;

/// Extract citations for one response.
///
/// When the backend supplied native citations, they are used verbatim and the
/// markdown fallback is skipped entirely — the two paths are mutually
/// exclusive per call. Otherwise every markdown-style `[label](url)` link in
/// the text becomes a citation.
///
/// A citation is `brand_related` when its URL or link label contains the
/// brand name or the domain (case-insensitive substring). Native citations
/// have no label, so only the URL is checked.
pub(crate) fn extract_citations(
    text: &str,
    brand_name: &str,
    domain: Option<&str>,
    native_citations: Option<&[String]>,
) -> Vec<Citation> {
    let brand_lower = brand_name.to_lowercase();
    let domain_lower = domain.map(str::to_lowercase);

    if let Some(native) = native_citations {
        return native
            .iter()
            .map(|url| Citation {
                url: url.clone(),
                brand_related: is_brand_related(url, None, &brand_lower, domain_lower.as_deref()),
            })
            .collect();
    }

    let link_re = Regex::new(r"\[([^\]]*)\]\((https?://[^)]+)\)").expect("valid regex");
    link_re
        .captures_iter(text)
        .map(|caps| {
            let label = &caps[1];
            let url = &caps[2];
            Citation {
                url: url.to_owned(),
                brand_related: is_brand_related(
                    url,
                    Some(label),
                    &brand_lower,
                    domain_lower.as_deref(),
                ),
            }
        })
        .collect()
}

fn is_brand_related(
    url: &str,
    label: Option<&str>,
    brand_lower: &str,
    domain_lower: Option<&str>,
) -> bool {
    let url_lower = url.to_lowercase();
    let label_lower = label.map(str::to_lowercase);

    let contains = |needle: &str| {
        !needle.is_empty()
            && (url_lower.contains(needle)
                || label_lower.as_deref().is_some_and(|l| l.contains(needle)))
    };

    contains(brand_lower) || domain_lower.is_some_and(contains)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_citations_are_used_verbatim() {
        let native = vec![
            "https://acme.com/docs".to_string(),
            "https://example.org/review".to_string(),
        ];
        let citations = extract_citations(
            "irrelevant [link](https://ignored.example)",
            "Acme",
            Some("acme.com"),
            Some(&native),
        );
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].url, "https://acme.com/docs");
        assert!(citations[0].brand_related);
        assert!(!citations[1].brand_related);
    }

    #[test]
    fn markdown_fallback_is_skipped_when_native_citations_exist() {
        let native: Vec<String> = vec!["https://a.example".to_string()];
        let citations = extract_citations(
            "[Acme homepage](https://acme.com)",
            "Acme",
            None,
            Some(&native),
        );
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].url, "https://a.example");
    }

    #[test]
    fn markdown_links_are_extracted_in_order() {
        let text = "See [Acme](https://acme.com) and [a review](https://reviews.example/acme-vs-rest).";
        let citations = extract_citations(text, "Acme", None, None);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].url, "https://acme.com");
        assert!(citations[0].brand_related);
        // URL contains the brand name as a substring.
        assert!(citations[1].brand_related);
    }

    #[test]
    fn label_match_marks_brand_related() {
        let citations = extract_citations(
            "[Why Acme wins](https://blog.example/post-42)",
            "Acme",
            None,
            None,
        );
        assert_eq!(citations.len(), 1);
        assert!(citations[0].brand_related);
    }

    #[test]
    fn domain_match_marks_brand_related() {
        let citations = extract_citations(
            "[pricing page](https://www.acme.com/pricing)",
            "SomethingElse",
            Some("acme.com"),
            None,
        );
        assert!(citations[0].brand_related);
    }

    #[test]
    fn unrelated_links_are_kept_but_not_brand_related() {
        let citations = extract_citations(
            "[docs](https://docs.example/intro)",
            "Acme",
            Some("acme.com"),
            None,
        );
        assert_eq!(citations.len(), 1);
        assert!(!citations[0].brand_related);
    }

    #[test]
    fn no_links_yields_empty() {
        assert!(extract_citations("plain text only", "Acme", None, None).is_empty());
    }
}
