//! Google 서비스 계정 인증.
//!
//! 처리 흐름:
//! 1. 서비스 계정 키(PKCS#8 PEM)로 RS256 JWT assertion 서명
//! 2. 토큰 엔드포인트에 `jwt-bearer` grant로 POST
//! 3. 응답의 `access_token` 반환
//!
//! 토큰은 호출 간에 캐시하지 않습니다.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ratio_core::InvocationLog;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{Result, SheetsError};

/// 스프레드시트 읽기/쓰기 scope.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// 기본 토큰 엔드포인트 (assertion의 `aud`로도 사용).
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// assertion 유효 시간 (초).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// 서비스 계정 자격 증명.
#[derive(Clone)]
pub struct ServiceAccount {
    pub client_email: String,
    private_key: SecretString,
}

impl ServiceAccount {
    /// 새 자격 증명 생성.
    ///
    /// 환경 변수에 한 줄로 저장된 키의 `\n` 이스케이프를 실제 줄바꿈으로 바꿉니다.
    pub fn new(client_email: impl Into<String>, private_key: &SecretString) -> Self {
        let unescaped = private_key.expose_secret().replace("\\n", "\n");
        Self {
            client_email: client_email.into(),
            private_key: SecretString::from(unescaped),
        }
    }

    pub fn private_key(&self) -> &SecretString {
        &self.private_key
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// JWT-bearer assertion 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Issuer - 서비스 계정 이메일
    pub iss: String,
    pub scope: String,
    /// Audience - 토큰 엔드포인트
    pub aud: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(client_email: &str, audience: &str, issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        Self {
            iss: client_email.to_string(),
            scope: SPREADSHEETS_SCOPE.to_string(),
            aud: audience.to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// 접근 토큰.
#[derive(Debug, Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// `Authorization: Bearer` 헤더 값에 사용할 원문.
    pub fn secret(&self) -> &str {
        self.0.expose_secret()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// 서비스 계정 토큰 발급기.
pub struct ServiceAccountAuth {
    client: Client,
    account: ServiceAccount,
    token_url: String,
}

impl ServiceAccountAuth {
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `SheetsError::Network`를 반환합니다.
    pub fn new(account: ServiceAccount, token_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            account,
            token_url: token_url.into(),
        })
    }

    /// `issued_at` 기준으로 서명된 assertion.
    ///
    /// `aud`는 Google 토큰 엔드포인트로 고정됩니다 (토큰 URL을 바꿔도 동일).
    pub fn sign_assertion(&self, issued_at: DateTime<Utc>) -> Result<String> {
        let key = EncodingKey::from_rsa_pem(self.account.private_key().expose_secret().as_bytes())
            .map_err(|e| SheetsError::Authentication(format!("invalid private key: {}", e)))?;
        let claims = AssertionClaims::new(&self.account.client_email, DEFAULT_TOKEN_URL, issued_at);

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SheetsError::Authentication(format!("assertion signing failed: {}", e)))
    }

    /// 접근 토큰 발급.
    ///
    /// # Errors
    /// 키 오류, 전송 오류, 2xx 외 응답, 응답 파싱 실패는 모두
    /// `SheetsError::Authentication`입니다.
    pub async fn fetch_token(&self, log: &InvocationLog) -> Result<AccessToken> {
        let assertion = self.sign_assertion(Utc::now())?;

        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SheetsError::Authentication(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SheetsError::Authentication(format!("token response unreadable: {}", e)))?;

        if !status.is_success() {
            tracing::error!(%status, body = %body, "Token request failed");
            return Err(SheetsError::Authentication(format!(
                "token endpoint returned {}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            SheetsError::Authentication(format!("failed to parse token response: {}", e))
        })?;

        log.debug("sheets:token.ok", None);
        Ok(AccessToken::new(token.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const PRIVATE_KEY: &str = include_str!("../tests/fixtures/service_account_key.pem");
    const PUBLIC_KEY: &str = include_str!("../tests/fixtures/service_account_pub.pem");

    fn account() -> ServiceAccount {
        ServiceAccount::new(
            "ledger@project.iam.gserviceaccount.com",
            &SecretString::from(PRIVATE_KEY.to_string()),
        )
    }

    #[test]
    fn test_escaped_newlines_are_restored() {
        let escaped = PRIVATE_KEY.trim_end().replace('\n', "\\n");
        let account = ServiceAccount::new("a@b.c", &SecretString::from(escaped));
        assert_eq!(account.private_key().expose_secret(), PRIVATE_KEY.trim_end());
    }

    #[test]
    fn test_debug_redacts_key() {
        let printed = format!("{:?}", account());
        assert!(printed.contains("ledger@project.iam.gserviceaccount.com"));
        assert!(!printed.contains("PRIVATE KEY"));
    }

    #[test]
    fn test_claims() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = AssertionClaims::new("a@b.c", DEFAULT_TOKEN_URL, at);
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_003_600);
        assert_eq!(claims.scope, SPREADSHEETS_SCOPE);
    }

    #[test]
    fn test_sign_assertion_verifies_with_public_key() {
        let auth = ServiceAccountAuth::new(account(), DEFAULT_TOKEN_URL).unwrap();
        let jwt = auth.sign_assertion(Utc::now()).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[DEFAULT_TOKEN_URL]);
        let data = decode::<AssertionClaims>(
            &jwt,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(data.header.alg, Algorithm::RS256);
        assert_eq!(data.claims.iss, "ledger@project.iam.gserviceaccount.com");
        assert_eq!(data.claims.aud, DEFAULT_TOKEN_URL);
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
    }

    #[test]
    fn test_invalid_key_is_authentication_error() {
        let account = ServiceAccount::new("a@b.c", &SecretString::from("not a key".to_string()));
        let auth = ServiceAccountAuth::new(account, DEFAULT_TOKEN_URL).unwrap();
        assert!(matches!(
            auth.sign_assertion(Utc::now()),
            Err(SheetsError::Authentication(_))
        ));
    }
}
