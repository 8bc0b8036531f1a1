/// 健康检查
pub mod health;

/// 背景移除转发
pub mod removal;
