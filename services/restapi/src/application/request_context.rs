// リクエストコンテキスト
//
// ハンドラーとミドルウェアに渡す読み取り専用のリクエストビュー。
// ルーターが抽出したパスパラメータと相関IDを合わせて保持する。

use lambda_http::http::{HeaderMap, Method};
use lambda_http::request::RequestContext as LambdaRequestContext;
use lambda_http::{Request, RequestExt};

use crate::domain::ServiceError;

/// パステンプレートから抽出したパラメータ
///
/// テンプレート内の出現順を保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// パラメータを追加
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// 名前でパラメータ値を取得
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// ルーティングに使うパス
///
/// API Gateway REST APIのイベントではURIの先頭にステージ名（`/prod/users`など）が
/// 付くため、イベントの`path`（リソースパス）を優先する。
/// イベント由来でないリクエストはURIのパスをそのまま使う。
pub fn routing_path(request: &Request) -> &str {
    let raw_path = request.raw_http_path();
    if raw_path.is_empty() {
        request.uri().path()
    } else {
        raw_path
    }
}

/// 相関ID
///
/// API Gatewayの`requestContext.requestId`を使い、
/// なければLambda呼び出しのリクエストIDにフォールバックする。
pub fn correlation_id(request: &Request) -> Option<String> {
    let gateway_id = match request.request_context_ref() {
        Some(LambdaRequestContext::ApiGatewayV1(context)) => context.request_id.clone(),
        Some(LambdaRequestContext::ApiGatewayV2(context)) => context.request_id.clone(),
        _ => None,
    };

    gateway_id
        .filter(|id| !id.is_empty())
        .or_else(|| {
            request
                .lambda_context_ref()
                .map(|context| context.request_id.clone())
                .filter(|id| !id.is_empty())
        })
}

/// ハンドラーに渡すリクエストコンテキスト
#[derive(Debug)]
pub struct RequestContext<'a> {
    request: &'a Request,
    params: PathParams,
    request_id: Option<String>,
}

impl<'a> RequestContext<'a> {
    /// リクエストとパスパラメータから作成（相関IDなし）
    pub fn new(request: &'a Request, params: PathParams) -> Self {
        Self {
            request,
            params,
            request_id: None,
        }
    }

    /// ルーターが算出した相関IDを設定
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// 元のリクエスト
    pub fn request(&self) -> &'a Request {
        self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// ルーティングに使ったパス（ステージ名を含まない）
    pub fn path(&self) -> &'a str {
        routing_path(self.request)
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// ヘッダー値を取得（名前の大文字小文字は区別しない）
    ///
    /// UTF-8として解釈できない値は`None`になる。
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// クエリパラメータの先頭の値を取得
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request
            .query_string_parameters_ref()
            .and_then(|params| params.first(name))
    }

    /// クエリパラメータの全ての値を取得（複数値クエリ対応）
    pub fn query_all(&self, name: &str) -> Vec<&str> {
        self.request
            .query_string_parameters_ref()
            .and_then(|params| params.all(name))
            .unwrap_or_default()
    }

    /// クエリパラメータを(キー, 値)の列として取得
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.request
            .query_string_parameters_ref()
            .map(|params| params.iter().collect())
            .unwrap_or_default()
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// パスパラメータを取得
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// 必須のパスパラメータを取得
    ///
    /// 存在しない場合は`ServiceError::BadRequest`を返す。
    pub fn require_param(&self, name: &str) -> Result<&str, ServiceError> {
        self.param(name)
            .ok_or_else(|| ServiceError::bad_request(format!("Missing path parameter: {}", name)))
    }

    /// 相関ID
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

/// ステージ`prod`のAPI Gateway REST APIプロキシイベントから作ったリクエスト
#[cfg(test)]
pub(crate) fn rest_proxy_event(method: &str, path: &str) -> Request {
    let event = serde_json::json!({
        "resource": path,
        "path": path,
        "httpMethod": method,
        "headers": {
            "x-api-key": "N1FJqKmufg2ammusFO5Q3Ase036MKEu4OXCppYa4"
        },
        "multiValueHeaders": {
            "x-api-key": ["N1FJqKmufg2ammusFO5Q3Ase036MKEu4OXCppYa4"]
        },
        "queryStringParameters": null,
        "multiValueQueryStringParameters": null,
        "pathParameters": null,
        "stageVariables": null,
        "requestContext": {
            "accountId": "123456789012",
            "resourceId": "abc123",
            "stage": "prod",
            "requestId": "c6af9ac6-7b61-11e6-9a41-93e8deadbeef",
            "requestTime": "09/Apr/2015:12:34:56 +0000",
            "requestTimeEpoch": 1428582896000_i64,
            "protocol": "HTTP/1.1",
            "identity": {
                "sourceIp": "127.0.0.1"
            },
            "resourcePath": path,
            "httpMethod": method,
            "apiId": "1234567890",
            "path": format!("/prod{}", path)
        },
        "body": null,
        "isBase64Encoded": false
    });
    lambda_http::request::from_str(&event.to_string()).unwrap()
}
