const FOLLOWED_SCHEME: &str = "https:";

/// Decides which raw hrefs of a fetched page become child traversals.
///
/// Links are compared as literal strings: no normalisation of trailing
/// slashes, fragments or query order is done, and no host restriction
/// applies.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinkPolicy {
    /// Follow links that contain the current page's URL.
    pub follow_self_links: bool,
}

impl LinkPolicy {
    pub fn children(&self, page_url: &str, links: Vec<String>) -> Vec<String> {
        links
            .into_iter()
            .filter(|link| link.starts_with(FOLLOWED_SCHEME))
            .filter(|link| self.follow_self_links || !link.contains(page_url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Vec<String> {
        vec![
            "https://a.example/".to_string(),
            "https://a.example/about".to_string(),
            "http://insecure.example/".to_string(),
            "HTTPS://shouty.example/".to_string(),
            "/relative".to_string(),
            "mailto:someone@a.example".to_string(),
            "https://b.example/".to_string(),
            "https://b.example/".to_string(),
            "https://b.example".to_string(),
        ]
    }

    #[test]
    fn keeps_only_https_links_outside_the_page() {
        let policy = LinkPolicy::default();
        assert_eq!(
            policy.children("https://a.example/", links()),
            vec![
                "https://b.example/".to_string(),
                "https://b.example/".to_string(),
                "https://b.example".to_string(),
            ]
        );
    }

    #[test]
    fn follows_self_links_when_enabled() {
        let policy = LinkPolicy {
            follow_self_links: true,
        };
        assert_eq!(
            policy.children("https://a.example/", links()),
            vec![
                "https://a.example/".to_string(),
                "https://a.example/about".to_string(),
                "https://b.example/".to_string(),
                "https://b.example/".to_string(),
                "https://b.example".to_string(),
            ]
        );
    }

    #[test]
    fn empty_page_has_no_children() {
        assert!(LinkPolicy::default()
            .children("https://a.example/", vec![])
            .is_empty());
    }
}
