// ミドルウェア（前後フック）
//
// ルーターはハンドラー呼び出しの前後で、登録順にフックを呼び出す。
// フックは観測用の副作用のみを持ち、失敗したりレスポンスを書き換えたりはできない。

use std::collections::BTreeMap;

use lambda_http::http::HeaderMap;
use lambda_http::http::header::{AUTHORIZATION, COOKIE, HeaderName};
use lambda_http::{Body, Response};
use tracing::info;

use super::RequestContext;

/// マスク後に出力する値
const REDACTED: &str = "***";

/// API Gatewayが検証するAPIキーのヘッダー名
const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

/// ハンドラー前後に呼ばれるフック
pub trait Middleware: Send + Sync {
    /// ハンドラー呼び出し前
    fn before(&self, _ctx: &RequestContext<'_>) {}

    /// レスポンス確定後（エラーレスポンスを含む）
    fn after(&self, _ctx: &RequestContext<'_>, _response: &Response<Body>) {}
}

/// アクセスログ
///
/// リクエストのメソッド、パス、相関ID、ヘッダー、クエリパラメータと
/// レスポンスのステータスを構造化ログに出力する。
/// 秘匿ヘッダー（APIキー、Authorization、Cookie）の値はマスクする。
#[derive(Debug, Clone)]
pub struct AccessLogMiddleware {
    redacted_headers: Vec<HeaderName>,
}

impl Default for AccessLogMiddleware {
    fn default() -> Self {
        Self {
            redacted_headers: vec![X_API_KEY, AUTHORIZATION, COOKIE],
        }
    }
}

impl AccessLogMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// マスク対象のヘッダーを追加
    pub fn redact(mut self, header: HeaderName) -> Self {
        self.redacted_headers.push(header);
        self
    }

    /// ログ出力用にヘッダーを整形
    ///
    /// 同名ヘッダーが複数ある場合は`, `で連結する。
    pub fn loggable_headers(&self, headers: &HeaderMap) -> BTreeMap<String, String> {
        let mut result: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers {
            let value = if self.redacted_headers.contains(name) {
                REDACTED
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            result
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
        result
    }
}

impl Middleware for AccessLogMiddleware {
    fn before(&self, ctx: &RequestContext<'_>) {
        let headers = self.loggable_headers(ctx.headers());
        let query = ctx.query_pairs();
        info!(
            method = %ctx.method(),
            path = ctx.path(),
            request_id = ctx.request_id(),
            headers = ?headers,
            query = ?query,
            params = ?ctx.params(),
            "リクエスト受信"
        );
    }

    fn after(&self, ctx: &RequestContext<'_>, response: &Response<Body>) {
        info!(
            method = %ctx.method(),
            path = ctx.path(),
            request_id = ctx.request_id(),
            status = response.status().as_u16(),
            "レスポンス送信"
        );
    }
}
