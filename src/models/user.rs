//! User identity domain models

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 角色闭集
/// 注册与授权共用同一验证点，避免双处校验漂移
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "HR Administrator")]
    HrAdministrator,
    #[serde(rename = "Department Manager")]
    DepartmentManager,
    #[serde(rename = "Employee")]
    Employee,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::HrAdministrator, Role::DepartmentManager, Role::Employee];

    /// 解析角色字符串，闭集外的值一律拒绝
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "HR Administrator" => Ok(Role::HrAdministrator),
            "Department Manager" => Ok(Role::DepartmentManager),
            "Employee" => Ok(Role::Employee),
            _ => Err(AppError::InvalidRole(format!(
                "Role must be one of: HR Administrator, Department Manager, Employee (got '{}')",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::HrAdministrator => "HR Administrator",
            Role::DepartmentManager => "Department Manager",
            Role::Employee => "Employee",
        }
    }

    /// 派生权限标识：ROLE_ 前缀 + 大写 + 空格转下划线
    /// 例如 "HR Administrator" -> "ROLE_HR_ADMINISTRATOR"
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str().to_uppercase().replace(' ', "_"))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Role {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Role::parse(&s)
    }
}

/// 用户身份记录（数据库行）
/// password_hash 不参与序列化，任何响应与日志都不得携带
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建身份（尚未持久化）
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// 已解析的身份投影（进入身份缓存的单元）
/// 只携带授权判定所需的字段，绝不回写存储
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedIdentity {
    pub email: String,
    pub role: Role,
    pub authority: String,
}

impl From<&Identity> for AuthorizedIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            email: identity.email.clone(),
            role: identity.role,
            authority: identity.role.authority(),
        }
    }
}

/// 注册请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    // 角色以字符串接收，由服务层按闭集解析，确保闭集外的值返回 400 而非反序列化失败
    pub role: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// 身份响应（不含敏感数据）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            first_name: identity.first_name,
            last_name: identity.last_name,
            role: identity.role,
            created_at: identity.created_at,
        }
    }
}
