use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::error::FetchError;

pub const USER_AGENT: &str = "gator";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssFeed {
    pub channel: RssChannel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<RssItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: Option<DateTime<Utc>>,
}

impl RssFeed {
    /// Decodes HTML entities left in titles and descriptions after XML
    /// unescaping, e.g. a double-escaped `&amp;amp;` or a literal `&hellip;`.
    pub fn unescape_html(&mut self) {
        let channel = &mut self.channel;
        decode_in_place(&mut channel.title);
        decode_in_place(&mut channel.description);
        for item in &mut channel.items {
            decode_in_place(&mut item.title);
            decode_in_place(&mut item.description);
        }
    }
}

fn decode_in_place(text: &mut String) {
    if text.contains('&') {
        *text = html_escape::decode_html_entities(text.as_str()).into_owned();
    }
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// Fetches `url` and returns the decoded feed. Dropping the returned
    /// future abandons the request; the client timeout bounds it otherwise.
    pub async fn fetch_feed(&self, url: &str) -> Result<RssFeed, FetchError> {
        info!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus(status));
        }

        let bytes = response.bytes().await?;
        let feed = Self::parse_feed(&bytes)?;

        info!(
            "Parsed {} items from '{}'",
            feed.channel.items.len(),
            feed.channel.title
        );
        Ok(feed)
    }

    /// Parses RSS 2.0, RSS 1.0 or Atom bytes into an [`RssFeed`] with HTML
    /// entities decoded.
    pub fn parse_feed(xml_bytes: &[u8]) -> Result<RssFeed, FetchError> {
        let parsed = parser::parse(xml_bytes)?;
        debug!("Parsed {:?} document with {} entries", parsed.feed_type, parsed.entries.len());

        let items = parsed
            .entries
            .into_iter()
            .map(|entry| RssItem {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                link: entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                description: entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body))
                    .unwrap_or_default(),
                pub_date: entry.published.or(entry.updated),
            })
            .collect();

        let mut feed = RssFeed {
            channel: RssChannel {
                title: parsed.title.map(|t| t.content).unwrap_or_default(),
                link: parsed
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                description: parsed.description.map(|d| d.content).unwrap_or_default(),
                items,
            },
        };
        feed.unescape_html();

        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
            <channel>
                <title>Boot.dev &amp;amp; Friends</title>
                <link>https://blog.example.com</link>
                <description>Notes &amp;hellip; and more</description>
                <item>
                    <title>The Zen of Proverbs</title>
                    <link>https://blog.example.com/zen</link>
                    <description>Go proverbs &amp;amp; Rust</description>
                    <pubDate>Mon, 09 Dec 2024 12:00:00 GMT</pubDate>
                </item>
                <item>
                    <title>Optimize for simplicit&amp;#121; first</title>
                    <link>https://blog.example.com/simple</link>
                    <description>Plain text</description>
                </item>
            </channel>
        </rss>
    "#;

    mod parse_feed_tests {
        use super::*;

        #[test]
        fn test_parse_rss_channel() {
            let feed = Fetcher::parse_feed(RSS_XML.as_bytes()).unwrap();

            assert!(feed.channel.link.starts_with("https://blog.example.com"));
            assert_eq!(feed.channel.items.len(), 2);
            assert!(feed.channel.items[0].link.starts_with("https://blog.example.com/zen"));
            assert!(feed.channel.items[0].pub_date.is_some());
            assert!(feed.channel.items[1].pub_date.is_none());
        }

        #[test]
        fn test_channel_text_is_entity_decoded() {
            let feed = Fetcher::parse_feed(RSS_XML.as_bytes()).unwrap();

            assert_eq!(feed.channel.title, "Boot.dev & Friends");
            assert_eq!(feed.channel.description, "Notes \u{2026} and more");
        }

        #[test]
        fn test_item_text_is_entity_decoded() {
            let feed = Fetcher::parse_feed(RSS_XML.as_bytes()).unwrap();

            assert_eq!(feed.channel.items[0].description, "Go proverbs & Rust");
            assert_eq!(
                feed.channel.items[1].title,
                "Optimize for simplicity first"
            );
        }

        #[test]
        fn test_parse_atom_feed() {
            let xml = r#"<?xml version="1.0" encoding="utf-8"?>
                <feed xmlns="http://www.w3.org/2005/Atom">
                    <title>Atom &amp;amp; Eve</title>
                    <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
                    <updated>2024-12-09T18:30:02Z</updated>
                    <entry>
                        <title>First post</title>
                        <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
                        <link href="https://atom.example.com/first"/>
                        <updated>2024-12-09T18:30:02Z</updated>
                        <summary>Short summary</summary>
                    </entry>
                </feed>
            "#;

            let feed = Fetcher::parse_feed(xml.as_bytes()).unwrap();

            assert_eq!(feed.channel.title, "Atom & Eve");
            assert_eq!(feed.channel.items.len(), 1);
            assert_eq!(feed.channel.items[0].title, "First post");
            assert_eq!(feed.channel.items[0].link, "https://atom.example.com/first");
            assert_eq!(feed.channel.items[0].description, "Short summary");
            assert!(feed.channel.items[0].pub_date.is_some());
        }

        #[test]
        fn test_parse_malformed_xml() {
            let result = Fetcher::parse_feed(b"<rss><channel><title>oops</channel></rss>");
            assert!(matches!(result, Err(FetchError::Parse(_))));
        }

        #[test]
        fn test_parse_non_feed_document() {
            let result = Fetcher::parse_feed(b"<html><body>not a feed</body></html>");
            assert!(matches!(result, Err(FetchError::Parse(_))));
        }

        #[test]
        fn test_channel_without_items() {
            let xml = r#"<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
            let feed = Fetcher::parse_feed(xml.as_bytes()).unwrap();

            assert_eq!(feed.channel.title, "Empty");
            assert!(feed.channel.items.is_empty());
            assert!(feed.channel.description.is_empty());
        }
    }

    mod unescape_tests {
        use super::*;

        #[test]
        fn test_unescape_leaves_plain_text_alone() {
            let mut feed = RssFeed {
                channel: RssChannel {
                    title: "Plain".to_string(),
                    ..Default::default()
                },
            };
            let before = feed.clone();
            feed.unescape_html();
            assert_eq!(feed, before);
        }

        #[test]
        fn test_unescape_does_not_touch_links() {
            let mut feed = RssFeed {
                channel: RssChannel {
                    title: "A &lt;b&gt;".to_string(),
                    link: "https://example.com/?a=1&amp;b=2".to_string(),
                    description: String::new(),
                    items: vec![RssItem {
                        title: "&quot;quoted&quot;".to_string(),
                        link: "https://example.com/?x=1&amp;y=2".to_string(),
                        description: "caf&eacute;".to_string(),
                        pub_date: None,
                    }],
                },
            };

            feed.unescape_html();

            assert_eq!(feed.channel.title, "A <b>");
            assert_eq!(feed.channel.link, "https://example.com/?a=1&amp;b=2");
            assert_eq!(feed.channel.items[0].title, "\"quoted\"");
            assert_eq!(feed.channel.items[0].description, "caf\u{e9}");
            assert_eq!(feed.channel.items[0].link, "https://example.com/?x=1&amp;y=2");
        }
    }

    mod fetch_feed_tests {
        use super::*;

        #[tokio::test]
        async fn test_fetch_feed_success() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/index.xml"))
                .and(header("user-agent", USER_AGENT))
                .respond_with(ResponseTemplate::new(200).set_body_string(RSS_XML))
                .expect(1)
                .mount(&server)
                .await;

            let fetcher = Fetcher::new().unwrap();
            let feed = fetcher
                .fetch_feed(&format!("{}/index.xml", server.uri()))
                .await
                .unwrap();

            assert_eq!(feed.channel.title, "Boot.dev & Friends");
            assert_eq!(feed.channel.items.len(), 2);
        }

        #[tokio::test]
        async fn test_fetch_feed_not_found() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;

            let fetcher = Fetcher::new().unwrap();
            let result = fetcher
                .fetch_feed(&format!("{}/missing.xml", server.uri()))
                .await;

            match result {
                Err(FetchError::UnexpectedStatus(status)) => {
                    assert_eq!(status, StatusCode::NOT_FOUND)
                }
                other => panic!("expected unexpected status error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_fetch_feed_non_ok_success_status_rejected() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(204))
                .mount(&server)
                .await;

            let fetcher = Fetcher::new().unwrap();
            let err = fetcher.fetch_feed(&server.uri()).await.unwrap_err();

            assert_eq!(err.to_string(), "unexpected status: 204");
        }

        #[tokio::test]
        async fn test_fetch_feed_malformed_body() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_string("not xml at all"))
                .mount(&server)
                .await;

            let fetcher = Fetcher::new().unwrap();
            let result = fetcher.fetch_feed(&server.uri()).await;

            assert!(matches!(result, Err(FetchError::Parse(_))));
        }

        #[tokio::test]
        async fn test_fetch_feed_invalid_url() {
            let fetcher = Fetcher::new().unwrap();
            let result = fetcher.fetch_feed("not a url").await;

            assert!(matches!(result, Err(FetchError::Request(_))));
        }
    }
}
