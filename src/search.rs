//! Product search boundary: response types and a thin HTTP client.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(feature = "http")]
use crate::error::SearchError;

/// One catalog entry. Unknown fields are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductItem {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub image: String,
    /// Lowest listed price; the API sends it as a string
    #[serde(rename = "lprice", deserialize_with = "de_price", serialize_with = "ser_price")]
    pub price: u64,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub display: u64,
    #[serde(default)]
    pub items: Vec<ProductItem>,
}

fn de_price<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) if s.trim().is_empty() => Ok(0),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn ser_price<S: Serializer>(price: &u64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&price.to_string())
}

/// Endpoint and static client credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub shop_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            shop_url: "https://openapi.naver.com/v1/search/shop.json".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_ms: 10_000,
        }
    }
}

impl SearchConfig {
    /// Credentials from `NAVER_CLIENT_ID` / `NAVER_CLIENT_SECRET`
    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var("NAVER_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("NAVER_CLIENT_SECRET").unwrap_or_default(),
            ..Self::default()
        }
    }
}

#[cfg(feature = "http")]
pub struct ProductSearchClient {
    client: reqwest::Client,
    config: SearchConfig,
}

#[cfg(feature = "http")]
impl ProductSearchClient {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SearchError::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Query the catalog. Failures are logged and returned to the caller.
    pub async fn get_products(&self, params: &[(&str, &str)]) -> Result<ProductResponse, SearchError> {
        let result = self.fetch(params).await;
        if let Err(e) = &result {
            log::error!("product search failed: {}", e);
        }
        result
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<ProductResponse, SearchError> {
        let res = self
            .client
            .get(&self.config.shop_url)
            .query(params)
            .header("X-Naver-Client-Id", &self.config.client_id)
            .header("X-Naver-Client-Secret", &self.config.client_secret)
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }
        let body = res.text().await.map_err(|e| SearchError::Http(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_prices_and_keeps_extra_fields() {
        let body = r#"{"total": 1, "start": 1, "display": 1, "items": [
            {"title": "<b>에어팟</b>", "link": "https://shop.test/1", "image": "https://img.test/1.jpg",
             "lprice": "199000", "hprice": "", "mallName": "네이버"}
        ]}"#;
        let res: ProductResponse = serde_json::from_str(body).unwrap();
        assert_eq!(res.items.len(), 1);
        assert_eq!(res.items[0].price, 199_000);
        assert_eq!(res.items[0].extra.get("mallName").and_then(|v| v.as_str()), Some("네이버"));
    }

    #[test]
    fn empty_price_is_zero_and_serializes_as_string() {
        let item: ProductItem =
            serde_json::from_str(r#"{"title": "t", "link": "l", "lprice": ""}"#).unwrap();
        assert_eq!(item.price, 0);
        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["lprice"], "0");
    }
}
