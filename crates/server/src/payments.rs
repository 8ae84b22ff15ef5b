//! Payment provider seam. The HTTP implementation speaks the Stripe
//! payment-intents API with form-encoded requests.

use std::time::Duration;

use async_trait::async_trait;
use dropshop_core::config::PaymentsConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider is not configured")]
    NotConfigured,
    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("payment provider returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    pub fn is_canceled(&self) -> bool {
        self.status == "canceled"
    }
}

#[derive(Clone, Debug, Default)]
pub struct PaymentMetadata {
    pub customer_email: Option<String>,
    pub order_number: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &PaymentMetadata,
    ) -> Result<PaymentIntent, PaymentError>;

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;
}

pub struct StripeGateway {
    http: reqwest::Client,
    base_url: String,
    secret_key: Option<SecretString>,
}

impl StripeGateway {
    pub fn from_config(config: &PaymentsConfig, timeout_secs: u64) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs)).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn secret(&self) -> Result<&str, PaymentError> {
        self.secret_key.as_ref().map(ExposeSecret::expose_secret).ok_or(PaymentError::NotConfigured)
    }
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: String,
}

async fn read_intent(response: reqwest::Response) -> Result<PaymentIntent, PaymentError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .map(|parsed| parsed.error.message)
            .unwrap_or(body);
        return Err(PaymentError::Rejected { status: status.as_u16(), message });
    }
    Ok(response.json::<PaymentIntent>().await?)
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &PaymentMetadata,
    ) -> Result<PaymentIntent, PaymentError> {
        let secret = self.secret()?;
        let form = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_ascii_lowercase()),
            ("payment_method_types[]", "card".to_string()),
            ("metadata[customer_email]", metadata.customer_email.clone().unwrap_or_default()),
            ("metadata[order_number]", metadata.order_number.clone()),
        ];
        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(secret)
            .form(&form)
            .send()
            .await?;
        read_intent(response).await
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        let secret = self.secret()?;
        let response = self
            .http
            .get(format!("{}/v1/payment_intents/{id}", self.base_url))
            .bearer_auth(secret)
            .send()
            .await?;
        read_intent(response).await
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{PaymentError, PaymentGateway, PaymentIntent, PaymentMetadata};

    /// Records created intents and reports them with a fixed status.
    #[derive(Default)]
    pub struct FakeGateway {
        pub created: Mutex<Vec<(i64, String, PaymentMetadata)>>,
        pub status: Mutex<String>,
        pub fail: bool,
    }

    impl FakeGateway {
        pub fn with_status(status: &str) -> Self {
            Self { status: Mutex::new(status.to_string()), ..Self::default() }
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_payment_intent(
            &self,
            amount_minor: i64,
            currency: &str,
            metadata: &PaymentMetadata,
        ) -> Result<PaymentIntent, PaymentError> {
            if self.fail {
                return Err(PaymentError::Rejected {
                    status: 402,
                    message: "card declined".to_string(),
                });
            }
            let mut created = self.created.lock().expect("lock");
            created.push((amount_minor, currency.to_string(), metadata.clone()));
            let id = format!("pi_test_{}", created.len());
            Ok(PaymentIntent {
                client_secret: Some(format!("{id}_secret")),
                id,
                status: "requires_payment_method".to_string(),
            })
        }

        async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
            Ok(PaymentIntent {
                id: id.to_string(),
                client_secret: None,
                status: self.status.lock().expect("lock").clone(),
            })
        }
    }
}
