//! Tests for the RSS feed document: entry rules, persistence, rebuild.

use promobot::rss::{entry_title, Feed, FeedItem, TITLE_PREFIX_CHARS};
use tempfile::TempDir;

/// Publishing a draft with a photo adds exactly one entry with the
/// converted content as description and an image enclosure.
#[test]
fn test_publish_adds_entry_with_enclosure() {
    let mut feed = Feed::new();
    let before = feed.items.len();

    feed.add_item(FeedItem::new(
        None,
        "Great deal!",
        Some("https://raw.example/cache-image/1005-01.jpg".to_string()),
    ));

    assert_eq!(feed.items.len(), before + 1);
    let entry = &feed.items[0];
    assert_eq!(entry.description, "Great deal!");
    assert_eq!(entry.title, "Great deal!");
    assert_eq!(
        entry.enclosure_url.as_deref(),
        Some("https://raw.example/cache-image/1005-01.jpg")
    );

    let xml = feed.to_xml();
    assert!(xml.contains("<description>Great deal!</description>"));
    assert!(xml.contains("type=\"image/jpeg\""));
}

#[test]
fn test_entry_title_defaults_to_content_prefix() {
    let long_content = "An absurdly long promotion caption that keeps going and going";
    assert!(long_content.chars().count() > TITLE_PREFIX_CHARS);

    let item = FeedItem::new(None, long_content, None);
    assert_eq!(item.title, entry_title(long_content));
    assert_eq!(item.title.chars().count(), TITLE_PREFIX_CHARS);

    let item = FeedItem::new(Some("Explicit".to_string()), long_content, None);
    assert_eq!(item.title, "Explicit");
}

#[test]
fn test_load_missing_file_gives_default_channel() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rss-feed_promo.xml");

    let feed = Feed::load(&path);
    assert_eq!(feed.title, "Promotion Feed");
    assert!(feed.items.is_empty());
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rss-feed_promo.xml");

    let mut feed = Feed::new();
    feed.add_item(FeedItem::new(None, "First deal", None));
    feed.add_item(FeedItem::new(
        Some("Second".to_string()),
        "Second deal with <markup> & \"quotes\"",
        Some("https://raw.example/cache-image/2-01.jpg".to_string()),
    ));
    feed.save(&path).unwrap();

    let reloaded = Feed::load(&path);
    assert_eq!(reloaded, feed);
    // Newest entry first.
    assert_eq!(reloaded.items[0].title, "Second");
}

/// Each publish rebuilds the document: reload, add, save. Existing entries
/// survive intact across rebuilds.
#[test]
fn test_rebuild_preserves_existing_entries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rss-feed_promo.xml");

    let mut feed = Feed::load(&path);
    feed.add_item(FeedItem::new(None, "entry one", None));
    feed.save(&path).unwrap();

    let mut feed = Feed::load(&path);
    feed.add_item(FeedItem::new(None, "entry two", None));
    feed.save(&path).unwrap();

    let feed = Feed::load(&path);
    assert_eq!(feed.items.len(), 2);
    assert_eq!(feed.items[0].description, "entry two");
    assert_eq!(feed.items[1].description, "entry one");
}

#[test]
fn test_corrupt_file_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rss-feed_promo.xml");
    std::fs::write(&path, "definitely not a feed").unwrap();

    let feed = Feed::load(&path);
    assert_eq!(feed.title, "Promotion Feed");
    assert!(feed.items.is_empty());
}
