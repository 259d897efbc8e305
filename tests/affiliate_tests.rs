//! Tests for URL extraction, product-id extraction and affiliate link
//! conversion.

use promobot::affiliate::{
    apply_replacements, find_urls, is_affiliate_link, needs_conversion,
};
use promobot::aliexpress::extract_product_id;

const TRACKING_ID: &str = "promo_track";

#[test]
fn test_product_id_from_item_url() {
    assert_eq!(
        extract_product_id("https://x.aliexpress.com/item/1005006109476639.html"),
        Some("1005006109476639".to_string())
    );
}

#[test]
fn test_product_id_from_bare_url() {
    assert_eq!(
        extract_product_id("https://x.aliexpress.com/1005006109476639.html"),
        Some("1005006109476639".to_string())
    );
}

#[test]
fn test_product_id_absent() {
    assert_eq!(extract_product_id("https://x.aliexpress.com/category/shoes"), None);
}

#[test]
fn test_find_urls_in_mixed_text() {
    let text = "Grab it: https://aliexpress.com/item/1.html (was https://example.com/old)";
    let urls = find_urls(text);
    assert_eq!(urls.len(), 2);
    assert!(urls[0].starts_with("https://aliexpress.com"));
}

#[test]
fn test_same_url_twice_gets_single_replacement() {
    let url = "https://aliexpress.com/item/42.html";
    let content = format!("first {url} then again {url}");
    let converted = apply_replacements(
        &content,
        &[(
            url.to_string(),
            "https://s.click.aliexpress.com/e/_one".to_string(),
        )],
    );
    assert_eq!(
        converted,
        "first https://s.click.aliexpress.com/e/_one then again https://s.click.aliexpress.com/e/_one"
    );
}

/// Converting already-converted text is a no-op: every e-commerce URL in
/// it carries the tracking id or redirect domain, so the second pass finds
/// no conversion candidates.
#[test]
fn test_conversion_round_trip_is_idempotent() {
    let original = "Deal: https://aliexpress.com/item/42.html";
    let converted = apply_replacements(
        original,
        &[(
            "https://aliexpress.com/item/42.html".to_string(),
            format!("https://aliexpress.com/item/42.html?aff_fcid={TRACKING_ID}"),
        )],
    );

    let second_pass: Vec<&str> = find_urls(&converted)
        .into_iter()
        .filter(|url| needs_conversion(url, TRACKING_ID))
        .collect();
    assert!(second_pass.is_empty());

    // Redirect-domain links are equally left alone.
    assert!(!needs_conversion("https://s.click.aliexpress.com/e/_x", TRACKING_ID));
}

#[test]
fn test_non_ecommerce_urls_never_converted() {
    for url in [
        "https://example.com/item/1.html",
        "http://news.site/article",
    ] {
        assert!(!needs_conversion(url, TRACKING_ID));
    }
}

#[test]
fn test_affiliate_detection() {
    assert!(is_affiliate_link("https://s.click.aliexpress.com/e/_x", TRACKING_ID));
    assert!(is_affiliate_link(
        &format!("https://aliexpress.com/item/1.html?aff={TRACKING_ID}"),
        TRACKING_ID
    ));
    assert!(!is_affiliate_link("https://aliexpress.com/item/1.html", TRACKING_ID));
}
