use std::{cell::RefCell, future::Future};

use super::{body_getter::FetchError, BodyGetter};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedPage {
    /// Raw `href` values in document order, duplicates kept.
    pub links: Vec<String>,
}

pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<ParsedPage, FetchError>> + Send;
}

#[derive(Clone, Debug)]
pub struct HtmlFetcher<T = reqwest::Client> {
    client: T,
}

impl<T: BodyGetter + Clone> HtmlFetcher<T> {
    pub fn new(client: T) -> Self {
        HtmlFetcher { client }
    }
}

/// Collects the `href` of every `<a>` start tag as it appears in the source.
///
/// Tokens are read without building a tree, so misnested markup never
/// duplicates an anchor.
#[derive(Default)]
struct AnchorSink {
    links: RefCell<Vec<String>>,
}

impl TokenSink for AnchorSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(tag) = token {
            if tag.kind == TagKind::StartTag && &*tag.name == "a" {
                if let Some(href) = tag.attrs.iter().find(|attr| &*attr.name.local == "href") {
                    self.links.borrow_mut().push(href.value.to_string());
                }
            }
        }
        TokenSinkResult::Continue
    }
}

fn anchor_hrefs(body: &str) -> Vec<String> {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from(body));
    let tokenizer = Tokenizer::new(AnchorSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    tokenizer.sink.links.take()
}

impl<T: BodyGetter + Clone + Send + Sync> Fetcher for HtmlFetcher<T> {
    #[tracing::instrument(skip(self))]
    fn fetch(&self, url: &str) -> impl Future<Output = Result<ParsedPage, FetchError>> + Send {
        async move {
            let body = self.client.get_body(url).await?;
            let links = anchor_hrefs(&body);
            tracing::info!("Found {} links", links.len());
            tracing::debug!("Links {:?}", links);
            Ok(ParsedPage { links })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BodyGetter;
    use crate::fetcher::body_getter::FetchError;
    use std::collections::HashMap;

    #[derive(Clone)]
    pub struct MockBodyGetter {
        map: HashMap<String, Result<String, FetchError>>,
    }

    impl MockBodyGetter {
        pub fn new(map: HashMap<String, Result<String, FetchError>>) -> Self {
            MockBodyGetter { map }
        }
    }

    impl BodyGetter for MockBodyGetter {
        async fn get_body(&self, url: &str) -> Result<String, FetchError> {
            match self.map.get(url) {
                Some(x) => x.clone(),
                None => Ok("".to_string()),
            }
        }
    }

    use super::*;

    #[tokio::test]
    async fn fetch_collects_hrefs_in_document_order() {
        let url = "https://example.com";
        let html = r#"
<html>
  <body>
    <a href="https://www.example.com">home</a>
    <a name="no-href">anchor</a>
    <a href="two">two</a>
    <p><a href="/three/four?hello=there">nested</a></p>
    <a href="https://www.example.com">home again</a>
    <link href="https://www.example.com/style.css">
  </body>
</html>"#;
        let getter = MockBodyGetter::new(HashMap::from([(url.to_string(), Ok(html.to_string()))]));
        let fetcher = HtmlFetcher::new(getter);
        let page = fetcher.fetch(url).await;
        assert_eq!(
            page.unwrap().links,
            vec![
                "https://www.example.com".to_string(),
                "two".to_string(),
                "/three/four?hello=there".to_string(),
                "https://www.example.com".to_string(),
            ]
        )
    }

    #[tokio::test]
    async fn fetch_of_page_without_anchors_is_empty() {
        let url = "https://example.com";
        let getter = MockBodyGetter::new(HashMap::from([(
            url.to_string(),
            Ok("<html><body><p>nothing here</p></body></html>".to_string()),
        )]));
        let fetcher = HtmlFetcher::new(getter);
        assert_eq!(fetcher.fetch(url).await, Ok(ParsedPage::default()));
    }

    #[test]
    fn misnested_anchor_is_counted_once() {
        let links = anchor_hrefs(r#"<p><a href="https://b.example/">one<p>two</a>"#);
        assert_eq!(links, vec!["https://b.example/".to_string()]);
    }

    #[test]
    fn anchors_inside_formatting_are_not_reopened() {
        let html = r#"<b><a href="https://b.example/">x<i>y</b>z</i></a><a HREF="https://c.example/">c</a>"#;
        assert_eq!(
            anchor_hrefs(html),
            vec![
                "https://b.example/".to_string(),
                "https://c.example/".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn fetch_returns_error() {
        let url = "https://example.com";

        let getter = MockBodyGetter::new(HashMap::from([(
            url.to_string(),
            Err(FetchError::Status(404)),
        )]));
        let fetcher = HtmlFetcher::new(getter);
        match fetcher.fetch(url).await {
            Ok(_) => assert!(false, "should return error"),
            Err(err) => assert_eq!(err, FetchError::Status(404)),
        }
    }
}
