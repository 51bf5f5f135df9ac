// リクエストルーター
//
// メソッドとパステンプレートでリクエストをハンドラーに振り分け、
// ハンドラーのエラーを構造化されたJSONエラーレスポンスに変換する。
//
// ルートテーブルは起動時に一度だけ構築し、以後は読み取り専用。
// 共有可変状態を持たないため、並行するリクエストを協調なしに処理できる。

use std::collections::{HashMap, HashSet};
use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, error, info_span, warn};

use super::middleware::Middleware;
use super::request_context::{PathParams, RequestContext, correlation_id, routing_path};
use super::response::error_response;
use crate::domain::{ServiceError, ThrottleSetting, UserError};
use crate::infrastructure::RepositoryError;

/// ルート不一致時のメッセージ
pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Not found";

/// ハンドラーのエラー型
///
/// - `Service`: 宣言済みのエラー種別。ステータスとメッセージをそのまま返す
/// - `Unexpected`: 未宣言のエラー。500 Internalに包み、メッセージを保持する
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Unexpected(Box<dyn StdError + Send + Sync>),
}

impl HandlerError {
    /// 任意のエラーを未宣言エラーとして包む
    pub fn unexpected(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Unexpected(err.into())
    }

    /// クライアントに返すサービスエラーへ変換
    pub fn into_service_error(self) -> ServiceError {
        match self {
            Self::Service(err) => err,
            Self::Unexpected(err) => ServiceError::internal(err.to_string()),
        }
    }
}

impl From<UserError> for HandlerError {
    fn from(err: UserError) -> Self {
        Self::Service(err.into())
    }
}

/// エンティティの検証エラーは400、それ以外のリポジトリエラーは500
impl From<RepositoryError> for HandlerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidEntity(err) => Self::Service(err.into()),
            other => Self::unexpected(other),
        }
    }
}

/// ルートハンドラー
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, ctx: &RequestContext<'_>) -> Result<Response<Body>, HandlerError>;
}

/// ルート登録のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("Duplicate route: {method} {template}")]
    DuplicateRoute { method: Method, template: String },

    #[error("Invalid route template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Route {method} {template} conflicts with {with}")]
    Conflict {
        method: Method,
        template: String,
        with: String,
    },
}

/// デプロイ境界に受け渡すルートのメタデータ
///
/// 本ランタイムでは認証もスロットリングも強制しない。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteOptions {
    /// API Gatewayで`x-api-key`を要求するか
    pub api_key_required: bool,
    /// メソッド単位のスロットリング（`None`は使用量プランの値に従う）
    pub throttle: Option<ThrottleSetting>,
}

impl RouteOptions {
    /// APIキー必須のルート
    pub fn api_key() -> Self {
        Self {
            api_key_required: true,
            throttle: None,
        }
    }

    pub fn with_throttle(mut self, throttle: ThrottleSetting) -> Self {
        self.throttle = Some(throttle);
        self
    }
}

/// 登録済みルート
pub struct Route {
    method: Method,
    template: String,
    options: RouteOptions,
    handler: Box<dyn RouteHandler>,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// パステンプレートの検証
///
/// - `/`で始まる
/// - 各セグメントはリテラル（`{`/`}`を含まない）または`{name}`（英数字と`_`）
/// - 空セグメント（末尾スラッシュ、`//`）とキャッチオールは不可
/// - パラメータ名はテンプレート内で一意
fn validate_template(template: &str) -> Result<(), RouteError> {
    let invalid = |reason: &str| RouteError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let rest = template
        .strip_prefix('/')
        .ok_or_else(|| invalid("must start with '/'"))?;
    if rest.is_empty() {
        return Ok(());
    }

    let mut names = HashSet::new();
    for segment in rest.split('/') {
        if segment.is_empty() {
            return Err(invalid("empty path segment"));
        }
        if let Some(inner) = segment.strip_prefix('{') {
            let name = inner
                .strip_suffix('}')
                .ok_or_else(|| invalid("parameter segment must be '{name}'"))?;
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("parameter name must be [A-Za-z0-9_]+"));
            }
            if !names.insert(name) {
                return Err(invalid("duplicate parameter name"));
            }
        } else if segment.contains(['{', '}']) {
            return Err(invalid("literal segment must not contain '{' or '}'"));
        }
    }
    Ok(())
}

/// リクエストルーター
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    matchers: HashMap<Method, matchit::Router<usize>>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// ミドルウェアを追加（呼び出し順は追加順）
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// ルートを登録（メタデータなし）
    pub fn register<H>(&mut self, method: Method, template: &str, handler: H) -> Result<(), RouteError>
    where
        H: RouteHandler + 'static,
    {
        self.register_with(method, template, RouteOptions::default(), handler)
    }

    /// ルートをメタデータ付きで登録
    ///
    /// 同じ(メソッド, テンプレート)の重複登録、不正なテンプレート、
    /// 既存ルートと曖昧になるテンプレートは起動時の設定エラーとして拒否する。
    pub fn register_with<H>(
        &mut self,
        method: Method,
        template: &str,
        options: RouteOptions,
        handler: H,
    ) -> Result<(), RouteError>
    where
        H: RouteHandler + 'static,
    {
        validate_template(template)?;

        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.template == template)
        {
            return Err(RouteError::DuplicateRoute {
                method,
                template: template.to_string(),
            });
        }

        let index = self.routes.len();
        self.matchers
            .entry(method.clone())
            .or_insert_with(matchit::Router::new)
            .insert(template, index)
            .map_err(|err| match err {
                matchit::InsertError::Conflict { with } => RouteError::Conflict {
                    method: method.clone(),
                    template: template.to_string(),
                    with,
                },
                other => RouteError::InvalidTemplate {
                    template: template.to_string(),
                    reason: other.to_string(),
                },
            })?;

        self.routes.push(Route {
            method,
            template: template.to_string(),
            options,
            handler: Box::new(handler),
        });
        Ok(())
    }

    /// 登録済みルート（登録順）
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// メソッドとパスに一致するルートを探す
    ///
    /// パラメータセグメントは空でない1セグメントにのみ一致する（matchitの`{name}`）。
    fn resolve(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        let matched = self.matchers.get(method)?.at(path).ok()?;

        let mut params = PathParams::new();
        for (name, value) in matched.params.iter() {
            params.push(name, value);
        }

        self.routes.get(*matched.value).map(|route| (route, params))
    }

    /// リクエストを処理して必ず1つのレスポンスを返す
    ///
    /// - ルート不一致: 404 NotFound
    /// - 宣言済みエラー: そのステータスとメッセージ
    /// - 未宣言エラー: 500 Internal（原因のメッセージを保持）
    pub async fn dispatch(&self, request: Request) -> Response<Body> {
        let request_id = correlation_id(&request);
        let span = info_span!(
            "dispatch",
            method = %request.method(),
            path = routing_path(&request),
            request_id = request_id.as_deref(),
        );

        self.dispatch_request(&request, request_id)
            .instrument(span)
            .await
    }

    async fn dispatch_request(
        &self,
        request: &Request,
        request_id: Option<String>,
    ) -> Response<Body> {
        let path = routing_path(request);
        let Some((route, params)) = self.resolve(request.method(), path) else {
            warn!(method = %request.method(), path, "一致するルートがない");
            return error_response(&ServiceError::not_found(ROUTE_NOT_FOUND_MESSAGE));
        };

        let ctx = RequestContext::new(request, params).with_request_id(request_id);

        for middleware in &self.middlewares {
            middleware.before(&ctx);
        }

        let response = match route.handler.handle(&ctx).await {
            Ok(response) => response,
            Err(HandlerError::Service(err)) => {
                warn!(
                    route = route.template(),
                    status = err.status_code(),
                    error = %err,
                    "ハンドラーがサービスエラーを返却"
                );
                error_response(&err)
            }
            Err(err @ HandlerError::Unexpected(_)) => {
                error!(route = route.template(), error = %err, "ハンドラーで想定外のエラー");
                error_response(&err.into_service_error())
            }
        };

        for middleware in &self.middlewares {
            middleware.after(&ctx, &response);
        }

        response
    }
}
