//! 数据模型模块
//! 用户身份、角色与认证 DTO

pub mod auth;
pub mod user;
