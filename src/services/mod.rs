//! 外围协作方契约
//!
//! 粒子背景之上的查询界面依赖两个外部协作方：推荐查询服务和 Markdown 渲染器。
//! 这里只声明契约与传输格式，不提供实现。

use crate::config::ServiceConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 查询请求（POST `{endpoint}` 的 JSON 正文）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub top_k: u32,
}

impl QueryRequest {
    /// 使用配置中的 `top_k` 构造请求
    pub fn new(query: impl Into<String>, config: &ServiceConfig) -> Self {
        Self {
            query: query.into(),
            top_k: config.top_k,
        }
    }
}

/// 查询响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub generated_response: String,
}

/// 推荐文本（Markdown）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub text: String,
}

impl From<QueryResponse> for Recommendation {
    fn from(response: QueryResponse) -> Self {
        Self {
            text: response.generated_response,
        }
    }
}

/// 查询服务错误
///
/// 任何传输或解析失败都以同一条面向用户的消息呈现。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to search documents. Please try again.")]
pub struct ServiceError {
    /// 底层原因，仅用于日志
    pub cause: String,
}

/// 推荐查询服务
pub trait RecommendationService {
    fn submit(&self, query: &str) -> Result<Recommendation, ServiceError>;
}

/// Markdown 渲染器，输出由宿主 UI 决定
pub trait MarkdownRenderer {
    type Output;

    fn render(&self, markdown: &str) -> Self::Output;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = QueryRequest::new("travel rewards", &ServiceConfig::default());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "query": "travel rewards", "top_k": 5 })
        );
    }

    #[test]
    fn test_response_into_recommendation() {
        let response: QueryResponse =
            serde_json::from_str(r#"{"generated_response":"**Card A**"}"#).unwrap();
        let recommendation = Recommendation::from(response);
        assert_eq!(recommendation.text, "**Card A**");
    }

    #[test]
    fn test_error_message_is_user_facing() {
        let error = ServiceError {
            cause: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to search documents. Please try again."
        );
    }
}
