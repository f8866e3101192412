//! User repository (数据库访问层)
//! 核心通过 UserStore trait 消费存储：按邮箱查找 + 保存

use crate::{
    error::AppError,
    models::user::{Identity, NewIdentity},
};
use async_trait::async_trait;
use sqlx::PgPool;

/// 用户记录存储（外部协作者的接缝）
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 按邮箱查找身份记录（邮箱是区分大小写的唯一键）
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError>;

    /// 持久化新身份记录
    ///
    /// 存储层的邮箱唯一约束是重复注册的权威防线；
    /// 违反唯一约束必须映射为 DuplicateIdentity
    async fn create(&self, identity: &NewIdentity) -> Result<Identity, AppError>;
}

/// PostgreSQL 实现
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT * FROM users WHERE email = $1"
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(identity)
    }

    async fn create(&self, identity: &NewIdentity) -> Result<Identity, AppError> {
        let created = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(identity.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            // 23505 = unique_violation：并发注册竞争中输掉的一方
            // 与快速路径得到相同的 DuplicateIdentity
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.code().as_deref() == Some("23505") {
                    return AppError::DuplicateIdentity;
                }
            }
            AppError::from(e)
        })?;

        Ok(created)
    }
}
