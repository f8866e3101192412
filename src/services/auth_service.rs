//! 认证服务：注册与登录

use crate::{
    auth::jwt::JwtService,
    auth::password::PasswordHasher,
    error::AppError,
    models::auth::{LoginRequest, LoginResponse},
    models::user::{NewIdentity, Role, SignupRequest},
    repository::user_repo::UserStore,
};
use std::sync::Arc;

pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            store,
            jwt_service,
            hasher: PasswordHasher::new(),
        }
    }

    /// 用户注册
    /// 校验输入与角色 → 查重 → 哈希密码 → 持久化
    pub async fn signup(&self, req: SignupRequest) -> Result<(), AppError> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AppError::InvalidInput(
                "Email and password cannot be empty.".to_string(),
            ));
        }

        // 角色闭集校验，唯一校验点
        let role = Role::parse(&req.role)?;

        // 查重只是快速路径；存储层的唯一索引才是权威防线
        if self.store.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::DuplicateIdentity);
        }

        let password_hash = self.hasher.hash(&req.password)?;

        let identity = NewIdentity {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            role,
        };

        let created = self.store.create(&identity).await?;

        tracing::info!(
            email = %created.email,
            role = %created.role,
            "User registered"
        );

        Ok(())
    }

    /// 用户登录
    /// "用户不存在"与"密码错误"在此处坍缩为同一个对外错误，
    /// 防止账号枚举
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AppError::InvalidInput(
                "Email and password must be provided.".to_string(),
            ));
        }

        let identity = match self.store.find_by_email(&req.email).await? {
            Some(identity) => identity,
            None => {
                tracing::debug!("Login rejected: unknown email");
                return Err(AppError::AuthenticationFailed);
            }
        };

        // Ok(false) 是密码不匹配；Err 是存储的哈希损坏，原样向上传播
        if !self.hasher.verify(&req.password, &identity.password_hash)? {
            tracing::debug!(email = %identity.email, "Login rejected: password mismatch");
            return Err(AppError::AuthenticationFailed);
        }

        let token = self.jwt_service.issue(&identity.email)?;

        tracing::info!(email = %identity.email, "User logged in");

        Ok(LoginResponse {
            token,
            expires_in: self.jwt_service.token_exp_secs(),
        })
    }
}
