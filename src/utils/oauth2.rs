use std::fmt::{Display, Formatter};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use crate::errors::SourceError::{ConnectionError, CredentialError, OAuth2Error};
use crate::errors::SourceResult;
use crate::utils::credential::Credential;
use crate::utils::credential::service_account::ServiceAccountKey;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
// Google rejects assertions valid for more than one hour.
const ASSERTION_LIFETIME: Duration = Duration::hours(1);

/// Access token obtained for one hook invocation. It is never refreshed.
#[derive(Clone, Debug)]
pub struct Token {
    scopes: Vec<String>,
    access_token: String,
    expires_at: OffsetDateTime,
}

impl Token {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token\nscope: [{}]\naccess_token: *****\nexpires_at: '{}'",
               self.scopes.join(", "), self.expires_at.unix_timestamp())
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Sign the RS256 JWT assertion for the service-account grant.
///
/// # Arguments
///
/// * `key` - Service-account key holding the PEM private key and the token endpoint.
/// * `scopes` - Scopes requested for the access token.
/// * `issued_at` - Issue time of the assertion.
///
/// # Returns
///
/// `SourceResult<String>` - The encoded assertion, or [CredentialError] if the private key is not a valid RSA PEM.
pub(crate) fn build_assertion(key: &ServiceAccountKey, scopes: &[String], issued_at: OffsetDateTime) -> SourceResult<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id().map(String::from);

    let claims = AssertionClaims {
        iss: key.client_email().to_string(),
        scope: scopes.join(" "),
        aud: key.token_uri().to_string(),
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + ASSERTION_LIFETIME).unix_timestamp(),
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key().as_bytes())
        .map_err(|e| {
            error!("Failed to read the service-account private key: {:?}", e);
            CredentialError(format!("Invalid private key: {}", e))
        })?;

    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .map_err(|e| OAuth2Error(format!("Failed to sign the assertion: {}", e)))
}

/// Exchange a signed assertion for an access token at the key's token endpoint.
pub async fn fetch_access_token<C>(client: &Client, credential: &C) -> SourceResult<Token>
where
    C: Credential<CredentialType = ServiceAccountKey>,
{
    let key = credential.get_credential();
    let scopes = credential.get_scopes();
    let now = OffsetDateTime::now_utc();
    let assertion = build_assertion(key, scopes, now)?;

    debug!("Requesting access token for {}", key.client_email());
    let response = client
        .post(key.token_uri())
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| {
            error!("Failed to send request to the token endpoint: {:#?}", e);
            ConnectionError(format!("Failed to send request to the token endpoint: {:?}", e))
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("Token endpoint rejected the assertion: {} {}", status, body);
        return Err(OAuth2Error(format!("Token endpoint returned {}: {}", status, body)));
    }

    let token_response = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| OAuth2Error(format!("Failed to parse token response: {:#?}", e)))?;

    let expires_in = token_response.expires_in.unwrap_or(3600);
    let token = Token {
        scopes: scopes.to_vec(),
        access_token: token_response.access_token,
        expires_at: now + Duration::seconds(expires_in),
    };
    info!("Obtained access token:\n{}", token);

    Ok(token)
}
