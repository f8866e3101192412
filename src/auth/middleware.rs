//! JWT 认证中间件
//! 请求门控：提取令牌 → 验证 → 解析身份（缓存/存储）→ 附加认证上下文

use crate::{error::AppError, middleware::AppState};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub email: String,
    pub role: crate::models::user::Role,
    pub authority: String,
}

impl AuthContext {
    /// 授权判定：权限不匹配返回 Forbidden（区别于未认证的 401）
    pub fn require_authority(&self, required: &str) -> Result<(), AppError> {
        if self.authority == required {
            Ok(())
        } else {
            tracing::debug!(
                email = %self.email,
                authority = %self.authority,
                required = %required,
                "Authority mismatch"
            );
            Err(AppError::Forbidden)
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::AuthenticationFailed)
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(|t| t.to_string()))
        .ok_or(AppError::AuthenticationFailed)
}

/// JWT 认证中间件 - 必须认证
///
/// 任一环节失败都整体拒绝请求，不存在"部分信任"的降级路径
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 从 Authorization 头提取令牌
    let token = extract_token(req.headers())?;

    // 验证令牌
    let claims = state.jwt_service.verify(&token)?;

    // 解析主体身份（优先缓存，回退存储）
    let resolved = state.identity_service.resolve(&claims.sub).await?;

    let auth_context = AuthContext {
        email: resolved.email,
        role: resolved.role,
        authority: resolved.authority,
    };

    // 附加到请求扩展
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
