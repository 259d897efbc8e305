//! AliExpress link resolution and affiliate API client.
//!
//! Product URLs arrive as share links that usually redirect a few times
//! before landing on a canonical `/item/<id>.html` page. The resolver
//! follows those redirects; the id is then pulled out with a regex and used
//! against the affiliate open-platform gateway for product details and
//! promotion links.

use chrono::Utc;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::errors::WorkflowError;

const API_GATEWAY: &str = "https://api-sg.aliexpress.com/sync";

lazy_static! {
    static ref ITEM_ID_REGEX: Regex =
        Regex::new(r"/item/(\d+)\.html").expect("item id pattern should be valid");
    static ref BARE_ID_REGEX: Regex =
        Regex::new(r"/(\d+)\.html").expect("bare id pattern should be valid");
}

/// Product metadata returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    pub product_id: String,
    pub product_title: String,
    pub small_image_urls: Vec<String>,
    pub promotion_link: Option<String>,
}

/// Follow redirects on a (possibly shortened) product URL and return the
/// final URL.
pub async fn resolve_shortened_url(
    http: &reqwest::Client,
    url: &str,
) -> Result<String, WorkflowError> {
    let response = http
        .head(url)
        .send()
        .await
        .map_err(|e| WorkflowError::ResolutionFailed(e.to_string()))?;
    let resolved = response.url().to_string();
    debug!("Resolved URL: {resolved}");
    Ok(resolved)
}

/// Extract the numeric product id from a resolved product URL.
///
/// Matches `/item/<digits>.html` first, then the shorter `/<digits>.html`
/// form some mobile share links use.
pub fn extract_product_id(url: &str) -> Option<String> {
    ITEM_ID_REGEX
        .captures(url)
        .or_else(|| BARE_ID_REGEX.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Client for the AliExpress affiliate open-platform gateway.
pub struct AliexpressClient {
    app_key: String,
    app_secret: String,
    tracking_id: String,
    http: reqwest::Client,
}

impl AliexpressClient {
    pub fn new(config: &Config) -> Self {
        Self {
            app_key: config.aliexpress_key.clone(),
            app_secret: config.aliexpress_secret.clone(),
            tracking_id: config.aliexpress_tracking_id.clone(),
            http: reqwest::Client::new(),
        }
    }

    pub fn tracking_id(&self) -> &str {
        &self.tracking_id
    }

    /// Generate a promotion link for a product URL. Returns the first link
    /// of the response list.
    pub async fn get_affiliate_link(&self, source_url: &str) -> Result<String, WorkflowError> {
        debug!("Generating affiliate link for URL: {source_url}");
        let mut params = BTreeMap::new();
        params.insert("source_values".to_string(), source_url.to_string());
        params.insert("promotion_link_type".to_string(), "0".to_string());
        params.insert("tracking_id".to_string(), self.tracking_id.clone());

        let response = self
            .call("aliexpress.affiliate.link.generate", params)
            .await
            .map_err(|e| WorkflowError::AffiliateLinkUnavailable(e.to_string()))?;

        parse_promotion_link(&response).ok_or_else(|| {
            WorkflowError::AffiliateLinkUnavailable(format!(
                "no promotion link in response for {source_url}"
            ))
        })
    }

    /// Fetch title, candidate images and promotion URL for a product id.
    pub async fn get_product_details(
        &self,
        product_id: &str,
    ) -> Result<ProductDetails, WorkflowError> {
        debug!("Fetching details for product id: {product_id}");
        let mut params = BTreeMap::new();
        params.insert("product_ids".to_string(), product_id.to_string());
        params.insert("tracking_id".to_string(), self.tracking_id.clone());
        params.insert("target_currency".to_string(), "USD".to_string());
        params.insert("target_language".to_string(), "EN".to_string());

        let response = self
            .call("aliexpress.affiliate.productdetail.get", params)
            .await
            .map_err(|e| WorkflowError::DetailFetchFailed(e.to_string()))?;

        parse_product_details(&response).ok_or_else(|| {
            WorkflowError::DetailFetchFailed(format!("no product in response for {product_id}"))
        })
    }

    /// Issue a signed request against the gateway.
    async fn call(
        &self,
        method: &str,
        mut params: BTreeMap<String, String>,
    ) -> anyhow::Result<serde_json::Value> {
        params.insert("app_key".to_string(), self.app_key.clone());
        params.insert("method".to_string(), method.to_string());
        params.insert("sign_method".to_string(), "md5".to_string());
        params.insert("format".to_string(), "json".to_string());
        params.insert("v".to_string(), "2.0".to_string());
        params.insert(
            "timestamp".to_string(),
            Utc::now().timestamp_millis().to_string(),
        );
        let sign = sign_request(&self.app_secret, &params);
        params.insert("sign".to_string(), sign);

        let response = self.http.get(API_GATEWAY).query(&params).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("gateway returned status {}", response.status());
        }
        let body: serde_json::Value = response.json().await?;
        if let Some(error) = body.get("error_response") {
            warn!("Gateway error response for {method}: {error}");
            anyhow::bail!("gateway error: {error}");
        }
        Ok(body)
    }
}

/// Gateway signature: uppercase hex MD5 of the secret wrapped around the
/// key-sorted parameter concatenation.
fn sign_request(secret: &str, params: &BTreeMap<String, String>) -> String {
    let mut payload = String::from(secret);
    for (key, value) in params {
        payload.push_str(key);
        payload.push_str(value);
    }
    payload.push_str(secret);
    format!("{:X}", md5::compute(payload))
}

/// Pull the first promotion link out of a link-generate response.
pub fn parse_promotion_link(response: &serde_json::Value) -> Option<String> {
    response["aliexpress_affiliate_link_generate_response"]["resp_result"]["result"]
        ["promotion_links"]["promotion_link"][0]["promotion_link"]
        .as_str()
        .map(str::to_string)
}

/// Pull the first product out of a productdetail response.
pub fn parse_product_details(response: &serde_json::Value) -> Option<ProductDetails> {
    let product = &response["aliexpress_affiliate_productdetail_get_response"]["resp_result"]
        ["result"]["products"]["product"][0];
    if product.is_null() {
        return None;
    }

    let product_id = match &product["product_id"] {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => return None,
    };
    let product_title = product["product_title"].as_str()?.to_string();
    let small_image_urls = product["product_small_image_urls"]["string"]
        .as_array()
        .map(|urls| {
            urls.iter()
                .filter_map(|u| u.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let promotion_link = product["promotion_link"].as_str().map(str::to_string);

    Some(ProductDetails {
        product_id,
        product_title,
        small_image_urls,
        promotion_link,
    })
}
