//! Affiliate link conversion over free text.
//!
//! Finds every URL in a message, and for each AliExpress URL that is not
//! already affiliate-tagged, substitutes a freshly generated promotion
//! link. Substitution is plain text replacement, so repeated occurrences of
//! the same raw URL all get the same promotion link, and running the
//! conversion again over already-converted text is a no-op.

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::aliexpress::AliexpressClient;

/// Domain promotion links redirect through; its presence marks a URL as
/// already converted.
pub const AFFILIATE_REDIRECT_DOMAIN: &str = "s.click.aliexpress.com";

const ECOMMERCE_DOMAIN: &str = "aliexpress.com";

lazy_static! {
    static ref URL_REGEX: Regex = Regex::new(r"https?://[^\s]+").expect("URL pattern should be valid");
}

/// All URLs appearing in the text, in order, duplicates included.
pub fn find_urls(text: &str) -> Vec<&str> {
    URL_REGEX.find_iter(text).map(|m| m.as_str()).collect()
}

/// Whether a URL already carries the affiliate tag or points at the
/// affiliate redirect domain.
pub fn is_affiliate_link(url: &str, tracking_id: &str) -> bool {
    (!tracking_id.is_empty() && url.contains(tracking_id)) || url.contains(AFFILIATE_REDIRECT_DOMAIN)
}

/// Whether a URL is an e-commerce product link still in need of
/// conversion.
pub fn needs_conversion(url: &str, tracking_id: &str) -> bool {
    url.contains(ECOMMERCE_DOMAIN) && !is_affiliate_link(url, tracking_id)
}

/// Replace every occurrence of each original URL with its affiliate
/// counterpart.
pub fn apply_replacements(content: &str, replacements: &[(String, String)]) -> String {
    let mut result = content.to_string();
    for (original, affiliate) in replacements {
        result = result.replace(original, affiliate);
    }
    result
}

/// Convert every unconverted e-commerce URL in `content` to an affiliate
/// link. URLs whose lookup fails are left untouched with a logged warning.
pub async fn convert_affiliate_links(client: &AliexpressClient, content: &str) -> String {
    let mut candidates: Vec<&str> = Vec::new();
    for url in find_urls(content) {
        if needs_conversion(url, client.tracking_id()) && !candidates.contains(&url) {
            candidates.push(url);
        }
    }

    let mut replacements = Vec::new();
    for url in candidates {
        match client.get_affiliate_link(url).await {
            Ok(affiliate_url) => replacements.push((url.to_string(), affiliate_url)),
            Err(e) => warn!("Leaving URL unconverted: {e}"),
        }
    }

    apply_replacements(content, &replacements)
}
