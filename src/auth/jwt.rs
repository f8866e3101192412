//! JWT token generation and validation
//! 单令牌模型：登录签发，之后每个请求验证，不做服务端吊销

use crate::{config::AppConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// JWT service
/// 密钥在进程启动时加载一次，之后只读
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        Ok(Self {
            encoding_key,
            decoding_key,
            token_exp_secs: config.security.token_exp_secs,
        })
    }

    /// 签发绑定主体（邮箱）的访问令牌
    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.token_exp_secs as i64);

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// 验证并解码令牌
    /// 过期与结构/签名损坏是两类不同的拒绝，均不产生部分信任
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token rejected: expired");
                    AppError::TokenExpired
                }
                _ => {
                    tracing::debug!("Token rejected: {:?}", e);
                    AppError::TokenMalformed
                }
            })
    }

    /// 令牌有效期（秒）
    pub fn token_exp_secs(&self) -> u64 {
        self.token_exp_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig};
    use secrecy::Secret;

    const TEST_SECRET: &str = "test_secret_key_32_characters_long!";

    // Mock config for testing
    fn test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                addr: "127.0.0.1:3000".to_string(),
                graceful_shutdown_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: Secret::new("postgresql://localhost/test".to_string()),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_secs: 30,
                idle_timeout_secs: 600,
                max_lifetime_secs: 1800,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: Secret::new(TEST_SECRET.to_string()),
                token_exp_secs: 86400,
                identity_cache_capacity: 1024,
                identity_cache_ttl_secs: 300,
            },
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = JwtService::from_config(&test_config()).unwrap();

        let token = service.issue("a@x.com").unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, "a@x.com");
        assert!(claims.exp > claims.iat);
        assert_eq!((claims.exp - claims.iat) as u64, service.token_exp_secs());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::from_config(&test_config()).unwrap();

        // 直接用同一密钥编码一个已过期的令牌（超出默认 60 秒容差）
        let now = Utc::now();
        let claims = Claims {
            sub: "a@x.com".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        match service.verify(&token) {
            Err(AppError::TokenExpired) => {}
            other => panic!("expected TokenExpired, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let service = JwtService::from_config(&test_config()).unwrap();

        match service.verify("not.a.jwt") {
            Err(AppError::TokenMalformed) => {}
            other => panic!("expected TokenMalformed, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_token_signed_with_other_secret_is_malformed() {
        let service = JwtService::from_config(&test_config()).unwrap();

        let mut other = test_config();
        other.security.jwt_secret =
            Secret::new("another_secret_key_32_characters!!!".to_string());
        let other_service = JwtService::from_config(&other).unwrap();

        let token = other_service.issue("a@x.com").unwrap();
        match service.verify(&token) {
            Err(AppError::TokenMalformed) => {}
            other => panic!("expected TokenMalformed, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = test_config();
        config.security.jwt_secret = Secret::new("short".to_string());
        assert!(JwtService::from_config(&config).is_err());
    }
}
