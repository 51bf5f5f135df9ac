// GET /login ハンドラー
//
// ログインアクションは未実装のため、空のページングエンベロープを返す。

use async_trait::async_trait;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use serde_json::Value;

use super::response::json_response;
use super::router::{HandlerError, RouteHandler};
use super::RequestContext;
use crate::domain::PagedResponse;

#[derive(Debug, Clone, Default)]
pub struct LoginHandler;

impl LoginHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RouteHandler for LoginHandler {
    async fn handle(&self, _ctx: &RequestContext<'_>) -> Result<Response<Body>, HandlerError> {
        Ok(json_response(StatusCode::OK, &PagedResponse::<Value>::empty())?)
    }
}
