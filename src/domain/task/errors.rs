//! Task Context - Domain Errors

use thiserror::Error;

/// 状态规范化错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// 响应体不是任何可识别的结构（非 JSON 或非对象）
    #[error("Malformed status response: {0}")]
    MalformedResponse(String),
}
