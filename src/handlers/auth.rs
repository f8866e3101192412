//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::auth::{LoginRequest, SignupResponse},
    models::user::{Role, SignupRequest},
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// 注册
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 结构校验（邮箱格式、非空密码）；业务校验在服务层
    req.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    state.auth_service.signup(req).await?;

    Ok(Json(SignupResponse {
        message: "User registered successfully".to_string(),
    }))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}

/// 获取当前用户信息（验证 + 解析路径的下游示例端点）
pub async fn get_current_user(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    Ok(Json(json!({
        "email": auth_context.email,
        "role": auth_context.role,
        "authority": auth_context.authority,
    })))
}

/// 按邮箱查询任意用户的身份投影，仅限 HR 管理员
pub async fn get_identity(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require_authority(&Role::HrAdministrator.authority())?;

    let resolved = state
        .identity_service
        .resolve(&email)
        .await
        .map_err(|e| match e {
            // 调用方已通过认证，管理查询里"查无此人"是 404 而非认证失败
            AppError::IdentityNotFound => AppError::NotFound,
            other => other,
        })?;

    Ok(Json(resolved))
}
