//! RSS feed document handling.
//!
//! The feed is a small RSS 2.0 file written and read only by this bot, so
//! it is rebuilt whole on every publish: parse the existing document, add
//! the new entry at the top, serialize, save. A missing or unreadable file
//! falls back to an empty default channel.

use chrono::Utc;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use std::fs;
use std::path::Path;

pub const CHANNEL_TITLE: &str = "Promotion Feed";
pub const CHANNEL_LINK: &str = "http://example.com";
pub const CHANNEL_DESCRIPTION: &str = "Latest promotions and deals";
pub const CHANNEL_LANGUAGE: &str = "en";

/// Length of a feed entry title derived from post content.
pub const TITLE_PREFIX_CHARS: usize = 30;

lazy_static! {
    static ref ITEM_REGEX: Regex =
        Regex::new(r"(?s)<item>(.*?)</item>").expect("item pattern should be valid");
    static ref ENCLOSURE_REGEX: Regex =
        Regex::new(r#"<enclosure url="([^"]*)""#).expect("enclosure pattern should be valid");
    static ref TITLE_REGEX: Regex = tag_regex("title");
    static ref LINK_REGEX: Regex = tag_regex("link");
    static ref DESCRIPTION_REGEX: Regex = tag_regex("description");
    static ref LANGUAGE_REGEX: Regex = tag_regex("language");
    static ref PUB_DATE_REGEX: Regex = tag_regex("pubDate");
}

fn tag_regex(tag: &str) -> Regex {
    Regex::new(&format!("(?s)<{tag}>(.*?)</{tag}>")).expect("tag pattern should be valid")
}

/// One published promotion in the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Public image URL rendered as an `image/jpeg` enclosure.
    pub enclosure_url: Option<String>,
    pub pub_date: Option<String>,
}

impl FeedItem {
    /// Build an entry dated now. The title falls back to a prefix of the
    /// content when no explicit title is given.
    pub fn new(title: Option<String>, content: &str, enclosure_url: Option<String>) -> Self {
        Self {
            title: title.unwrap_or_else(|| entry_title(content)),
            link: CHANNEL_LINK.to_string(),
            description: content.to_string(),
            enclosure_url,
            pub_date: Some(Utc::now().to_rfc2822()),
        }
    }
}

/// The whole feed document: channel metadata plus entries, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub items: Vec<FeedItem>,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            title: CHANNEL_TITLE.to_string(),
            link: CHANNEL_LINK.to_string(),
            description: CHANNEL_DESCRIPTION.to_string(),
            language: CHANNEL_LANGUAGE.to_string(),
            items: Vec::new(),
        }
    }
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry at the top of the feed.
    pub fn add_item(&mut self, item: FeedItem) {
        self.items.insert(0, item);
    }

    /// Serialize the document as RSS 2.0 XML.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<rss version=\"2.0\">\n  <channel>\n");
        xml.push_str(&format!("    <title>{}</title>\n", escape(&self.title)));
        xml.push_str(&format!("    <link>{}</link>\n", escape(&self.link)));
        xml.push_str(&format!(
            "    <description>{}</description>\n",
            escape(&self.description)
        ));
        xml.push_str(&format!(
            "    <language>{}</language>\n",
            escape(&self.language)
        ));
        for item in &self.items {
            xml.push_str("    <item>\n");
            xml.push_str(&format!("      <title>{}</title>\n", escape(&item.title)));
            xml.push_str(&format!("      <link>{}</link>\n", escape(&item.link)));
            xml.push_str(&format!(
                "      <description>{}</description>\n",
                escape(&item.description)
            ));
            if let Some(url) = &item.enclosure_url {
                xml.push_str(&format!(
                    "      <enclosure url=\"{}\" length=\"0\" type=\"image/jpeg\"/>\n",
                    escape(url)
                ));
            }
            if let Some(date) = &item.pub_date {
                xml.push_str(&format!("      <pubDate>{}</pubDate>\n", escape(date)));
            }
            xml.push_str("    </item>\n");
        }
        xml.push_str("  </channel>\n</rss>\n");
        xml
    }

    /// Parse a document previously produced by [`Feed::to_xml`].
    pub fn parse(xml: &str) -> Option<Self> {
        let mut items = Vec::new();
        for captures in ITEM_REGEX.captures_iter(xml) {
            let block = &captures[1];
            items.push(FeedItem {
                title: tag_text(block, &TITLE_REGEX)?,
                link: tag_text(block, &LINK_REGEX).unwrap_or_else(|| CHANNEL_LINK.to_string()),
                description: tag_text(block, &DESCRIPTION_REGEX)?,
                enclosure_url: ENCLOSURE_REGEX
                    .captures(block)
                    .map(|caps| unescape(&caps[1])),
                pub_date: tag_text(block, &PUB_DATE_REGEX),
            });
        }

        // Channel fields come from the document with the item blocks cut
        // out, since items reuse the same tag names.
        let channel_only = ITEM_REGEX.replace_all(xml, "");
        Some(Self {
            title: tag_text(&channel_only, &TITLE_REGEX)?,
            link: tag_text(&channel_only, &LINK_REGEX)?,
            description: tag_text(&channel_only, &DESCRIPTION_REGEX)?,
            language: tag_text(&channel_only, &LANGUAGE_REGEX)
                .unwrap_or_else(|| CHANNEL_LANGUAGE.to_string()),
            items,
        })
    }

    /// Read the feed from disk, falling back to an empty default channel
    /// when the file is missing or unparseable.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(xml) => Feed::parse(&xml).unwrap_or_else(|| {
                warn!(
                    "Feed file {} could not be parsed; starting a fresh feed",
                    path.display()
                );
                Feed::new()
            }),
            Err(_) => Feed::new(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.to_xml())
    }
}

/// Title used for an entry without an explicit one: the first
/// `TITLE_PREFIX_CHARS` characters of the post content.
pub fn entry_title(content: &str) -> String {
    content.chars().take(TITLE_PREFIX_CHARS).collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

fn tag_text(block: &str, regex: &Regex) -> Option<String> {
    regex
        .captures(block)
        .map(|caps| unescape(caps[1].trim()))
}
