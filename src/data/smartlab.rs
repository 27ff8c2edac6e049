//! Coupon kind from the smart-lab.ru bond page
//!
//! The page title (`<h1 class="qn-menu__title">`) describes the coupon in
//! Russian; a handful of keywords map it onto [`CouponKind`].

use crate::bond::CouponKind;

const TITLE_CLASS: &str = "qn-menu__title";

const KEYWORDS: [(&str, CouponKind); 5] = [
    ("плавающим", CouponKind::Floating),
    ("переменным", CouponKind::Variable),
    ("фиксированным", CouponKind::Fixed),
    ("амортизацией", CouponKind::Amortizing),
    ("индексируемым", CouponKind::IndexedNominal),
];

/// Coupon kind named by a page title, first matching keyword wins
pub fn classify_title(title: &str) -> Option<CouponKind> {
    let title = title.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keyword, _)| title.contains(keyword))
        .map(|(_, kind)| *kind)
}

/// Text of the first `<h1>` carrying the title class, inner tags stripped
pub fn extract_title(html: &str) -> Option<String> {
    let mut rest = html;
    while let Some(start) = rest.find("<h1") {
        let tag = &rest[start..];
        let open_end = tag.find('>')?;
        let body = &tag[open_end + 1..];
        if tag[..open_end].contains(TITLE_CLASS) {
            let close = body.find("</h1>")?;
            return Some(strip_tags(&body[..close]).trim().to_string());
        }
        rest = body;
    }
    None
}

fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(feature = "async")]
pub use client::SmartLabClient;

#[cfg(feature = "async")]
mod client {
    use super::{classify_title, extract_title};
    use crate::bond::CouponKind;
    use crate::error::{BondError, Result};
    use reqwest::{Client, StatusCode};
    use std::time::Duration;

    const SMARTLAB_BASE_URL: &str = "https://smart-lab.ru/q/bonds";
    const MAX_RETRIES: u32 = 3;
    const RETRY_DELAY_MS: u64 = 2000;

    /// Fetches bond pages from smart-lab.ru
    pub struct SmartLabClient {
        client: Client,
        base_url: String,
    }

    impl SmartLabClient {
        pub fn new() -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| BondError::DataError(format!("Failed to create HTTP client: {}", e)))?;

            Ok(Self {
                client,
                base_url: SMARTLAB_BASE_URL.to_string(),
            })
        }

        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into();
            self
        }

        /// Coupon kind of `secid`; `None` when the page is missing or unclassified
        pub async fn coupon_kind(&self, secid: &str) -> Result<Option<CouponKind>> {
            let url = format!("{}/{}/", self.base_url, secid);

            let mut retries = 0;
            loop {
                match self.fetch_page(&url).await {
                    Ok(Some(html)) => return Ok(extract_title(&html).and_then(|t| classify_title(&t))),
                    Ok(None) => return Ok(None),
                    Err(e) if retries + 1 < MAX_RETRIES => {
                        retries += 1;
                        log::warn!("smart-lab attempt {}/{} for {}: {}", retries, MAX_RETRIES, secid, e);
                        tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        async fn fetch_page(&self, url: &str) -> Result<Option<String>> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| BondError::DataError(format!("HTTP request failed: {}", e)))?;

            if response.status() != StatusCode::OK {
                return Ok(None);
            }

            let text = response
                .text()
                .await
                .map_err(|e| BondError::DataError(format!("Failed to read response: {}", e)))?;
            Ok(Some(text))
        }
    }
}
