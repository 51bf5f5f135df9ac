// GET / ハンドラー
//
// ページングエンベロープではなく、`{"message": "Hello from <path>"}` という
// 単純な形を返す（エンベロープはエンドポイントごとの選択であることを示す）。

use async_trait::async_trait;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use serde::Serialize;

use super::response::json_response;
use super::router::{HandlerError, RouteHandler};
use super::RequestContext;

/// メッセージのみのレスポンスボディ
#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

/// ルートハンドラー
#[derive(Debug, Clone, Default)]
pub struct RootHandler;

impl RootHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RouteHandler for RootHandler {
    async fn handle(&self, ctx: &RequestContext<'_>) -> Result<Response<Body>, HandlerError> {
        let body = MessageBody {
            message: format!("Hello from {}", ctx.path()),
        };
        Ok(json_response(StatusCode::OK, &body)?)
    }
}
