//! AWS Signature Version 4 request signing.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::domain::ports::ApiError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Static AWS credentials.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl AwsCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    #[must_use]
    pub fn with_session_token(mut self, session_token: Option<String>) -> Self {
        self.session_token = session_token;
        self
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Format a timestamp as `YYYYMMDDTHHMMSSZ`, the value of `X-Amz-Date`.
pub fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Signs requests for one service in one region.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl RequestSigner {
    pub fn new(
        credentials: AwsCredentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    pub const fn credentials(&self) -> &AwsCredentials {
        &self.credentials
    }

    /// Compute the `Authorization` header value.
    ///
    /// `headers` must contain every header to be signed, including `host`
    /// and `x-amz-date`; names are matched case-insensitively.
    pub fn authorization(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<String, ApiError> {
        let mut canonical_headers: Vec<(String, String)> = headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        canonical_headers.sort();

        let signed_headers = canonical_headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let mut canonical_request = format!("{method}\n{path}\n\n");
        for (name, value) in &canonical_headers {
            canonical_request.push_str(name);
            canonical_request.push(':');
            canonical_request.push_str(value);
            canonical_request.push('\n');
        }
        canonical_request.push('\n');
        canonical_request.push_str(&signed_headers);
        canonical_request.push('\n');
        canonical_request.push_str(&hex::encode(Sha256::digest(payload)));

        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{}\n{scope}\n{}",
            amz_date(now),
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = self.signing_key(&date)?;
        let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

        Ok(format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id
        ))
    }

    fn signing_key(&self, date: &str) -> Result<Vec<u8>, ApiError> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac(secret.as_bytes(), date.as_bytes())?;
        let k_region = hmac(&k_date, self.region.as_bytes())?;
        let k_service = hmac(&k_region, self.service.as_bytes())?;
        hmac(&k_service, b"aws4_request")
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ApiError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|_| ApiError::Signing("failed to initialize hmac".to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
