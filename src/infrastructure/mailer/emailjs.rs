use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::{
    entities::contact_me::ContactPayload,
    errors::AppError,
    repositories::mailer::EmailRelay,
    settings::AppConfig,
};

/// Sends contact messages through the EmailJS REST API.
#[derive(Clone)]
pub struct EmailJsRelay {
    client: Client,
    api_url: String,
    service_id: String,
    template_id: String,
    public_key: String,
    private_key: Option<Zeroizing<String>>,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a ContactPayload,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
}

impl EmailJsRelay {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.delivery_timeout_secs))
            .build()?;

        Ok(EmailJsRelay {
            client,
            api_url: config.emailjs_api_url.clone(),
            service_id: config.emailjs_service_id.clone(),
            template_id: config.emailjs_template_id.clone(),
            public_key: config.emailjs_public_key.clone(),
            private_key: config.emailjs_private_key.clone().map(Zeroizing::new),
        })
    }
}

#[async_trait]
impl EmailRelay for EmailJsRelay {
    async fn send(&self, payload: &ContactPayload) -> Result<(), AppError> {
        let request = SendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.public_key,
            template_params: payload,
            access_token: self.private_key.as_ref().map(|k| k.as_str()),
        };

        let response = self.client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Relay(format!("EmailJS responded {}: {}", status, body)))
        }
    }
}
