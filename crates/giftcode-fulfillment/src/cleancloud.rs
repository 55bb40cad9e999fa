use crate::error::FulfillmentError;
use crate::vendor::{GiftCardOrder, GiftCardVendor, VendorReply};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://cleancloudapp.com/api/";

#[derive(Debug, Clone)]
pub struct CleanCloudConfig {
    pub api_token: String,
    /// Base URL ending in `/`; endpoint names are appended verbatim.
    pub api_url: String,
    pub timeout: Duration,
}

impl CleanCloudConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_url: DEFAULT_API_URL.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        let mut api_url = api_url.into();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        self.api_url = api_url;
        self
    }
}

/// CleanCloud gift-card API client.
#[derive(Debug, Clone)]
pub struct CleanCloudClient {
    client: reqwest::Client,
    api_token: String,
    api_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GiftCardBuyRequest<'a> {
    #[serde(rename = "api_token")]
    api_token: &'a str,
    #[serde(rename = "customerID")]
    customer_id: &'a str,
    to_name: &'a str,
    to_email: Option<&'a str>,
    to_tel: Option<&'a str>,
    send_date: &'a str,
    send_hour: &'a str,
    amount: f64,
    message: &'a str,
    notify_by: u8,
}

impl CleanCloudClient {
    pub fn new(config: CleanCloudConfig) -> Result<Self, FulfillmentError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_token: config.api_token,
            api_url: config.api_url,
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}{}", self.api_url, name)
    }
}

#[async_trait]
impl GiftCardVendor for CleanCloudClient {
    async fn buy_gift_card(
        &self,
        account: &str,
        order: &GiftCardOrder,
    ) -> Result<VendorReply, FulfillmentError> {
        let body = GiftCardBuyRequest {
            api_token: &self.api_token,
            customer_id: account,
            to_name: &order.to_name,
            to_email: order.to_email.as_deref(),
            to_tel: order.to_tel.as_deref(),
            send_date: &order.send_date,
            send_hour: &order.send_hour,
            amount: order.amount,
            message: &order.message,
            notify_by: order.notify_by.code(),
        };

        debug!(account, amount = order.amount, "posting giftCardBuy");
        let response = self
            .client
            .post(self.endpoint("giftCardBuy"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(FulfillmentError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map(VendorReply)
            .map_err(|e| FulfillmentError::Decode(format!("{e}: {text}")))
    }
}
