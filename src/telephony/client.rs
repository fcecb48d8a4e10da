use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TelephonyConfig;
use crate::error::{ProviderError, ProviderResult};

/// Response of the create-call endpoint (only the fields we use)
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedCall {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}

/// Telephony REST API client (account SID + auth token basic auth)
#[derive(Clone)]
pub struct TelephonyClient {
    client: reqwest::Client,
    api_base_url: String,
    account_sid: Option<String>,
    auth_token: Option<String>,
}

impl TelephonyClient {
    pub fn new(config: &TelephonyConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone().filter(|s| !s.is_empty()),
            auth_token: config.auth_token.clone().filter(|s| !s.is_empty()),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some()
    }

    fn credentials(&self) -> ProviderResult<(&str, &str)> {
        match (&self.account_sid, &self.auth_token) {
            (Some(sid), Some(token)) => Ok((sid.as_str(), token.as_str())),
            _ => Err(ProviderError::Unavailable(
                "telephony account_sid/auth_token not configured".to_string(),
            )),
        }
    }

    pub fn calls_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base_url, account_sid
        )
    }

    /// Place an outbound call whose TwiML is fetched from `twiml_url`
    pub async fn create_call(
        &self,
        to: &str,
        from: &str,
        twiml_url: &str,
    ) -> ProviderResult<CreatedCall> {
        let (sid, token) = self.credentials()?;

        info!("Creating outbound call to {} (from {})", to, from);

        let response = self
            .client
            .post(self.calls_url(sid))
            .basic_auth(sid, Some(token))
            .form(&[
                ("To", to),
                ("From", from),
                ("Url", twiml_url),
                ("Method", "POST"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    /// Whether `url` is served by the configured API (same scheme, host and port)
    pub fn is_api_url(&self, url: &str) -> bool {
        match (Url::parse(&self.api_base_url), Url::parse(url)) {
            (Ok(api), Ok(target)) => api.origin() == target.origin(),
            _ => false,
        }
    }

    /// Download a call recording. Credentials are only sent to the API origin.
    pub async fn download_recording(&self, url: &str) -> ProviderResult<Vec<u8>> {
        debug!("Downloading recording {}", url);

        let mut request = self.client.get(url);
        match (&self.account_sid, &self.auth_token) {
            (Some(sid), Some(token)) if self.is_api_url(url) => {
                request = request.basic_auth(sid, Some(token));
            }
            (Some(_), Some(_)) => {
                warn!(
                    "Recording {} is not on the telephony API host; fetching without credentials",
                    url
                );
            }
            _ => {}
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: format!("recording download failed: {}", url),
            });
        }

        let bytes = response.bytes().await?;
        info!("Downloaded {} bytes of recording", bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Recording URLs default to WAV when no extension is given
pub fn recording_media_url(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    let has_extension = path
        .rsplit('/')
        .next()
        .map(|last| last.contains('.'))
        .unwrap_or(false);

    if has_extension {
        url.to_string()
    } else {
        format!("{}.wav", url)
    }
}
