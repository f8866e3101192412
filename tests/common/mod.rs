//! 测试公共工具
//! 测试配置与内存版用户存储替身

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use ems_system::config::{
    AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig,
};
use ems_system::error::AppError;
use ems_system::models::user::{Identity, NewIdentity};
use ems_system::repository::user_repo::UserStore;
use secrecy::Secret;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
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
            jwt_secret: Secret::new("test_secret_key_32_characters_long!".to_string()),
            token_exp_secs: 86400,
            identity_cache_capacity: 1024,
            identity_cache_ttl_secs: 300,
        },
    }
}

/// 内存版用户存储替身
/// 统计 find_by_email 调用次数，用于断言缓存命中后不再访问存储
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, Identity>>,
    lookups: AtomicUsize,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// find_by_email 的累计调用次数
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// 已持久化的记录数
    pub fn record_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// 直接篡改存储的哈希，模拟数据损坏
    pub fn corrupt_hash(&self, email: &str) {
        let mut users = self.users.lock().unwrap();
        if let Some(identity) = users.get_mut(email) {
            identity.password_hash = "corrupt".to_string();
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn create(&self, identity: &NewIdentity) -> Result<Identity, AppError> {
        let mut users = self.users.lock().unwrap();

        // 与存储层唯一索引等价的权威防线
        if users.contains_key(&identity.email) {
            return Err(AppError::DuplicateIdentity);
        }

        let now = Utc::now();
        let created = Identity {
            id: Uuid::new_v4(),
            email: identity.email.clone(),
            password_hash: identity.password_hash.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            role: identity.role,
            created_at: now,
            updated_at: now,
        };

        users.insert(identity.email.clone(), created.clone());
        Ok(created)
    }
}
