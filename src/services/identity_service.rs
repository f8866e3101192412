//! 身份解析服务
//! 每个已认证请求都要把令牌主体解析为身份 + 权限；
//! 缓存把"每请求一次存储往返"摊薄掉

use crate::{
    auth::cache::IdentityCache,
    error::AppError,
    models::user::AuthorizedIdentity,
    repository::user_repo::UserStore,
};
use std::sync::Arc;

pub struct IdentityService {
    store: Arc<dyn UserStore>,
    cache: IdentityCache,
}

impl IdentityService {
    pub fn new(store: Arc<dyn UserStore>, cache: IdentityCache) -> Self {
        Self { store, cache }
    }

    /// 解析邮箱为身份投影（身份 + 规范化权限）
    ///
    /// 命中缓存不触发存储访问；未命中时查存储并回填缓存。
    /// 已验证令牌的主体解析失败按未认证处理，向调用方传播
    pub async fn resolve(&self, email: &str) -> Result<AuthorizedIdentity, AppError> {
        if let Some(hit) = self.cache.get(email) {
            metrics::counter!("identity_cache_hits_total").increment(1);
            return Ok(hit);
        }

        metrics::counter!("identity_cache_misses_total").increment(1);
        tracing::debug!(email = %email, "Identity cache miss, querying store");

        let identity = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::IdentityNotFound)?;

        let resolved = AuthorizedIdentity::from(&identity);
        self.cache.insert(email.to_string(), resolved.clone());

        Ok(resolved)
    }

    /// 当前缓存条目数（用于指标暴露）
    pub fn cached_identities(&self) -> usize {
        self.cache.len()
    }
}
