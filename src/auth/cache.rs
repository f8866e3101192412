//! 身份缓存
//! 以邮箱为键缓存已解析的身份投影，避免每个已认证请求都查询存储
//! 显式对象，通过依赖注入传给解析器，不做进程级单例

use crate::models::user::AuthorizedIdentity;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    identity: AuthorizedIdentity,
    inserted_at: Instant,
}

/// 有界 + TTL 的并发身份缓存
///
/// 写入是按键幂等的 upsert：并发未命中竞争写同一个键是安全的
/// （最后写入者胜出，不会损坏状态）
pub struct IdentityCache {
    entries: DashMap<String, CacheEntry>,
    capacity: usize,
    ttl: Duration,
}

impl IdentityCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// 查找缓存条目；过期条目视为未命中并被移除
    pub fn get(&self, email: &str) -> Option<AuthorizedIdentity> {
        let expired = match self.entries.get(email) {
            Some(entry) => {
                if entry.inserted_at.elapsed() <= self.ttl {
                    return Some(entry.identity.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove(email);
        }
        None
    }

    /// 幂等 upsert；容量满时先清理过期条目，仍满则淘汰最旧条目
    pub fn insert(&self, email: String, identity: AuthorizedIdentity) {
        if !self.entries.contains_key(&email) && self.entries.len() >= self.capacity {
            self.purge_expired();

            while self.entries.len() >= self.capacity {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        self.entries.insert(
            email,
            CacheEntry {
                identity,
                inserted_at: Instant::now(),
            },
        );
    }

    /// 当前缓存条目数（含未清理的过期条目）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 移除全部过期条目
    fn purge_expired(&self) {
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
    }

    /// 淘汰插入时间最早的条目，返回是否有条目被移除
    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().inserted_at)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn projection(email: &str, role: Role) -> AuthorizedIdentity {
        AuthorizedIdentity {
            email: email.to_string(),
            role,
            authority: role.authority(),
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = IdentityCache::new(16, Duration::from_secs(60));

        assert!(cache.get("a@x.com").is_none());

        cache.insert("a@x.com".to_string(), projection("a@x.com", Role::Employee));

        let hit = cache.get("a@x.com").expect("expected cache hit");
        assert_eq!(hit.authority, "ROLE_EMPLOYEE");
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let cache = IdentityCache::new(16, Duration::from_secs(60));

        cache.insert("a@x.com".to_string(), projection("a@x.com", Role::Employee));
        cache.insert(
            "a@x.com".to_string(),
            projection("a@x.com", Role::DepartmentManager),
        );

        // 最后写入者胜出，条目数不增长
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a@x.com").unwrap().authority, "ROLE_DEPARTMENT_MANAGER");
    }

    #[test]
    fn test_ttl_expiry_is_a_miss() {
        let cache = IdentityCache::new(16, Duration::from_millis(10));

        cache.insert("a@x.com".to_string(), projection("a@x.com", Role::Employee));
        std::thread::sleep(Duration::from_millis(30));

        assert!(cache.get("a@x.com").is_none());
        // 过期条目在读取时被移除
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_bound_evicts_oldest() {
        let cache = IdentityCache::new(2, Duration::from_secs(60));

        cache.insert("a@x.com".to_string(), projection("a@x.com", Role::Employee));
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("b@x.com".to_string(), projection("b@x.com", Role::Employee));
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("c@x.com".to_string(), projection("c@x.com", Role::Employee));

        assert!(cache.len() <= 2);
        // 最旧的条目被淘汰
        assert!(cache.get("a@x.com").is_none());
        assert!(cache.get("c@x.com").is_some());
    }
}
