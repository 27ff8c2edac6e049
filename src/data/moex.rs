//! MOEX ISS client
//!
//! Listing pages come from `securities` filtered to the `stock_bonds` group;
//! per-bond specs merge the security description, the accrued interest and the
//! last trading session of the past week.

use super::iss::{first_cell, flatten, last_session, rows_to_dict};
use super::smartlab::SmartLabClient;
use super::BondSource;
use crate::error::{BondError, Result};
use crate::fields;
use crate::types::{FieldMap, RawValue, DATE_FORMAT};
use chrono::{Duration as DateDuration, NaiveDate};
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const ISS_BASE_URL: &str = "https://iss.moex.com/iss";
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

/// How far back the last trading session is looked up
const SESSION_LOOKBACK_DAYS: i64 = 7;

/// MOEX ISS market data client
pub struct MoexClient {
    client: Client,
    base_url: String,
    smartlab: Option<SmartLabClient>,
}

impl MoexClient {
    /// Create a new client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BondError::DataError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: ISS_BASE_URL.to_string(),
            smartlab: None,
        })
    }

    /// Point the client at another ISS host (mirrors, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Also look up the coupon kind of rouble bonds on smart-lab.ru
    pub fn with_coupon_kinds(mut self, smartlab: SmartLabClient) -> Self {
        self.smartlab = Some(smartlab);
        self
    }

    /// GET `{base}/{method}.json` with retry logic
    async fn query(&self, method: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}.json", self.base_url, method);

        let mut retries = 0;
        loop {
            match self.fetch_json(&url, params).await {
                Ok(doc) => return Ok(doc),
                Err(e) if retries + 1 < MAX_RETRIES => {
                    retries += 1;
                    warn!("ISS attempt {}/{} for {}: {}", retries, MAX_RETRIES, method, e);
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * retries as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| BondError::DataError(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(BondError::DataError(format!(
                "ISS returned error: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BondError::DataError(format!("JSON parse error: {}", e)))
    }

    /// One listing page of exchange bonds, traded or not (1-based `page`)
    pub async fn get_bonds(&self, page: u32, limit: u32) -> Result<Vec<FieldMap>> {
        let start = page.saturating_sub(1) * limit;
        let doc = self
            .query(
                "securities",
                &[
                    ("group_by", "group".to_string()),
                    ("group_by_filter", "stock_bonds".to_string()),
                    ("limit", limit.to_string()),
                    ("start", start.to_string()),
                ],
            )
            .await?;

        let rows = flatten(&doc, "securities");
        debug!("ISS listing page {}: {} bonds", page, rows.len());
        Ok(rows)
    }

    /// Accrued interest as reported by the bond market, if any
    pub async fn get_nkd(&self, secid: &str) -> Result<Option<RawValue>> {
        let doc = self
            .query(
                &format!("engines/stock/markets/bonds/securities/{}", secid),
                &[
                    ("iss.only", "securities".to_string()),
                    ("iss.meta", "off".to_string()),
                    ("securities.columns", "ACCRUEDINT".to_string()),
                ],
            )
            .await?;
        Ok(first_cell(&doc, "securities").filter(|v| !v.is_blank()))
    }

    /// Price, yield, trade date and volume of the last session in the past week
    pub async fn get_last_session(&self, secid: &str, today: NaiveDate) -> Result<FieldMap> {
        let from = today - DateDuration::days(SESSION_LOOKBACK_DAYS);
        let doc = self
            .query(
                &format!(
                    "history/engines/stock/markets/bonds/sessions/3/securities/{}",
                    secid
                ),
                &[("from", from.format(DATE_FORMAT).to_string())],
            )
            .await?;
        Ok(last_session(&flatten(&doc, "history"), today))
    }

    /// Full raw specs of one bond
    pub async fn get_specs(&self, secid: &str, today: NaiveDate) -> Result<FieldMap> {
        let doc = self.query(&format!("securities/{}", secid), &[]).await?;
        let mut specs = rows_to_dict(&doc, "description", "name", "value");

        // null clears a stored value the exchange no longer reports
        match self.get_nkd(secid).await {
            Ok(nkd) => {
                specs.insert("accruedint".to_string(), nkd.unwrap_or(RawValue::Null));
            }
            Err(e) => warn!("Failed to fetch accrued interest for {}: {}", secid, e),
        }

        match self.get_last_session(secid, today).await {
            Ok(session) => specs.extend(session),
            Err(e) => warn!("Failed to fetch last session for {}: {}", secid, e),
        }

        if let Some(smartlab) = &self.smartlab {
            let rouble = fields::decode(&specs).facts.is_rouble();
            if rouble {
                match smartlab.coupon_kind(secid).await {
                    Ok(Some(kind)) => {
                        specs.insert("bondtype".to_string(), RawValue::from(kind.as_str()));
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Failed to fetch coupon kind for {}: {}", secid, e),
                }
            }
        }

        Ok(specs)
    }
}

impl BondSource for MoexClient {
    async fn listing_page(&self, page: u32, limit: u32) -> Result<Vec<FieldMap>> {
        self.get_bonds(page, limit).await
    }

    async fn specs(&self, secid: &str, today: NaiveDate) -> Result<FieldMap> {
        self.get_specs(secid, today).await
    }

    fn name(&self) -> &str {
        "moex-iss"
    }
}
