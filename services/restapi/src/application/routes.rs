// REST APIのルート定義
//
// | Method | Path           | API key | Throttle       |
// |--------|----------------|---------|----------------|
// | GET    | /              | 不要    | プラン既定     |
// | GET    | /users         | 必須    | users_throttle |
// | GET    | /users/{uid}   | 必須    | プラン既定     |
// | GET    | /login         | 必須    | login_throttle |

use std::sync::Arc;

use lambda_http::http::Method;
use serde::Serialize;

use super::login_handler::LoginHandler;
use super::middleware::AccessLogMiddleware;
use super::root_handler::RootHandler;
use super::router::{RouteError, RouteOptions, Router};
use super::user_handler::{GetUserHandler, ListUsersHandler};
use crate::domain::ThrottleSetting;
use crate::infrastructure::{ServiceConfig, UserRepository};

/// 全ルートを登録したルーターを構築
///
/// アクセスログのミドルウェアを付与し、スロットリング値は設定から取る。
pub fn build_router(
    config: &ServiceConfig,
    repository: Arc<dyn UserRepository>,
) -> Result<Router, RouteError> {
    let mut router = Router::new().with_middleware(AccessLogMiddleware::new());

    router.register(Method::GET, "/", RootHandler::new())?;
    router.register_with(
        Method::GET,
        "/users",
        RouteOptions::api_key().with_throttle(config.users_throttle),
        ListUsersHandler::new(repository.clone()),
    )?;
    router.register_with(
        Method::GET,
        "/users/{uid}",
        RouteOptions::api_key(),
        GetUserHandler::new(repository),
    )?;
    router.register_with(
        Method::GET,
        "/login",
        RouteOptions::api_key().with_throttle(config.login_throttle),
        LoginHandler::new(),
    )?;

    Ok(router)
}

/// デプロイツール向けのルート一覧
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteManifest {
    pub app_name: String,
    pub prefix: String,
    pub environment: String,
    /// 使用量プランのスロットリング
    pub throttle: ThrottleSetting,
    pub routes: Vec<RouteManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteManifestEntry {
    pub method: String,
    pub path: String,
    pub api_key_required: bool,
    pub throttle: Option<ThrottleSetting>,
}

impl RouteManifest {
    pub fn new(config: &ServiceConfig, router: &Router) -> Self {
        let routes = router
            .routes()
            .iter()
            .map(|route| RouteManifestEntry {
                method: route.method().to_string(),
                path: route.template().to_string(),
                api_key_required: route.options().api_key_required,
                throttle: route.options().throttle,
            })
            .collect();

        Self {
            app_name: config.app_name.clone(),
            prefix: config.prefix.clone(),
            environment: config.environment.to_string(),
            throttle: config.throttle,
            routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::request_context::rest_proxy_event;
    use crate::application::response::to_spaced_json;
    use crate::domain::{PagedResponse, User};
    use crate::infrastructure::{RepositoryError, StubUserRepository, init_test_logging};
    use async_trait::async_trait;
    use uuid::Uuid;
    use lambda_http::http::Request as HttpRequest;
    use lambda_http::http::StatusCode;
    use lambda_http::http::header::CONTENT_TYPE;
    use lambda_http::{Body, Request, Response};

    const SEED_UID: &str = "1d5f8ffd-202c-4118-8adc-6ad8e742453b";

    fn router() -> Router {
        build_router(&ServiceConfig::default(), Arc::new(StubUserRepository::new())).unwrap()
    }

    /// API Gatewayから届く形に近いリクエスト（APIキー付き）
    fn api_request(path: &str) -> Request {
        HttpRequest::builder()
            .method("GET")
            .uri(path)
            .header("x-api-key", "N1FJqKmufg2ammusFO5Q3Ase036MKEu4OXCppYa4")
            .body(Body::Empty)
            .unwrap()
    }

    fn body_text(response: &Response<Body>) -> String {
        match response.body() {
            Body::Text(text) => text.clone(),
            Body::Binary(bytes) => String::from_utf8(bytes.clone()).unwrap(),
            Body::Empty => String::new(),
            _ => panic!("予期しないBody型"),
        }
    }

    fn assert_json_content_type(response: &Response<Body>) {
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    // ===========================================
    // エンドポイントのシナリオ
    // ===========================================

    #[tokio::test]
    async fn test_get_root() {
        init_test_logging();
        let response = router().dispatch(api_request("/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_json_content_type(&response);
        assert_eq!(body_text(&response), r#"{"message": "Hello from /"}"#);
    }

    /// 同一入力に対して同一バイト列を返す
    #[tokio::test]
    async fn test_get_root_is_idempotent() {
        let router = router();

        let first = router.dispatch(api_request("/")).await;
        let second = router.dispatch(api_request("/")).await;

        assert_eq!(first.status(), second.status());
        assert_eq!(body_text(&first), body_text(&second));
    }

    #[tokio::test]
    async fn test_get_users_single_page() {
        let response = router().dispatch(api_request("/users")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_json_content_type(&response);
        assert_eq!(
            body_text(&response),
            concat!(
                r#"{"data": [{"uid": "1d5f8ffd-202c-4118-8adc-6ad8e742453b", "#,
                r#""created_at": "2021-08-20T08:45:00", "#,
                r#""name": "cfchou", "email": "cfchou@gmail.com"}], "#,
                r#""cursor": null}"#
            )
        );
    }

    #[tokio::test]
    async fn test_get_user_404() {
        let response = router()
            .dispatch(api_request(&format!("/users/{}", SEED_UID)))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_json_content_type(&response);
        assert_eq!(
            body_text(&response),
            r#"{"statusCode":404,"message":"User 1d5f8ffd-202c-4118-8adc-6ad8e742453b not found"}"#
        );
    }

    #[tokio::test]
    async fn test_get_user_with_malformed_uid_is_400() {
        let response = router().dispatch(api_request("/users/12345")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(&response),
            r#"{"statusCode":400,"message":"Invalid user id: 12345"}"#
        );
    }

    #[tokio::test]
    async fn test_get_login() {
        let response = router().dispatch(api_request("/login")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_json_content_type(&response);
        assert_eq!(body_text(&response), r#"{"data": [], "cursor": null}"#);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = router().dispatch(api_request("/admin")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_json_content_type(&response);
        assert_eq!(
            body_text(&response),
            r#"{"statusCode":404,"message":"Not found"}"#
        );
    }

    // ===========================================
    // API Gateway REST APIイベント経由（ステージ付きURI）
    // ===========================================

    #[tokio::test]
    async fn test_rest_event_get_root() {
        init_test_logging();
        let response = router().dispatch(rest_proxy_event("GET", "/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(&response), r#"{"message": "Hello from /"}"#);
    }

    #[tokio::test]
    async fn test_rest_event_get_users() {
        let response = router().dispatch(rest_proxy_event("GET", "/users")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(&response).starts_with(r#"{"data": [{"uid": "1d5f8ffd"#));
    }

    #[tokio::test]
    async fn test_rest_event_get_user_404() {
        let response = router()
            .dispatch(rest_proxy_event("GET", &format!("/users/{}", SEED_UID)))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_text(&response),
            r#"{"statusCode":404,"message":"User 1d5f8ffd-202c-4118-8adc-6ad8e742453b not found"}"#
        );
    }

    #[tokio::test]
    async fn test_rest_event_post_users_is_404() {
        let response = router().dispatch(rest_proxy_event("POST", "/users")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ===========================================
    // 不正なエンティティ
    // ===========================================

    /// メールアドレスが不正なレコードからUserを構築するリポジトリ
    struct InvalidEmailRepository;

    #[async_trait]
    impl UserRepository for InvalidEmailRepository {
        async fn list(&self, _cursor: Option<&str>) -> Result<PagedResponse<User>, RepositoryError> {
            let created_at = "2021-08-20T08:45:00".parse().unwrap();
            let user = User::new(Uuid::nil(), created_at, "cfchou", "not-an-email")?;
            Ok(PagedResponse::last_page(vec![user]))
        }

        async fn get_by_id(&self, _uid: &Uuid) -> Result<Option<User>, RepositoryError> {
            Ok(None)
        }
    }

    /// エンティティ構築時のメール検証エラーは400でシリアライズ前に失敗する
    #[tokio::test]
    async fn test_invalid_email_is_bad_request() {
        let router =
            build_router(&ServiceConfig::default(), Arc::new(InvalidEmailRepository)).unwrap();

        let response = router.dispatch(api_request("/users")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json_content_type(&response);
        let body: serde_json::Value = serde_json::from_str(&body_text(&response)).unwrap();
        assert_eq!(body["statusCode"], 400);
        assert!(body["message"].as_str().unwrap().contains("not-an-email"));
    }

    // ===========================================
    // ルートメタデータ
    // ===========================================

    #[test]
    fn test_route_options_follow_config() {
        let router = router();
        let routes = router.routes();

        let summary: Vec<(&str, bool, Option<ThrottleSetting>)> = routes
            .iter()
            .map(|r| (r.template(), r.options().api_key_required, r.options().throttle))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("/", false, None),
                ("/users", true, Some(ThrottleSetting::new(10, 20))),
                ("/users/{uid}", true, None),
                ("/login", true, Some(ThrottleSetting::new(1, 2))),
            ]
        );
    }

    #[test]
    fn test_route_manifest_serialization() {
        let config = ServiceConfig::default();
        let manifest = RouteManifest::new(&config, &router());

        assert_eq!(manifest.prefix, "restapi-dev");
        assert_eq!(manifest.environment, "dev");
        assert_eq!(manifest.routes.len(), 4);

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["throttle"]["rate"], 100);
        assert_eq!(json["routes"][1]["method"], "GET");
        assert_eq!(json["routes"][1]["path"], "/users");
        assert_eq!(json["routes"][1]["throttle"]["burst"], 20);
        assert!(json["routes"][0]["throttle"].is_null());

        // 成功レスポンスと同じ形式でも出力できる
        assert!(to_spaced_json(&manifest).unwrap().contains(r#""api_key_required": true"#));
    }
}
