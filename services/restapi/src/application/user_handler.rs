// ユーザー関連ハンドラー
//
// GET /users       : ユーザー一覧をページングエンベロープで返す
// GET /users/{uid} : IDでユーザーを取得し、存在しなければNotFound

use std::sync::Arc;

use async_trait::async_trait;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use tracing::debug;
use uuid::Uuid;

use super::response::json_response;
use super::router::{HandlerError, RouteHandler};
use super::RequestContext;
use crate::domain::ServiceError;
use crate::infrastructure::UserRepository;

/// 継続トークンを受け取るクエリパラメータ名
pub const CURSOR_QUERY_PARAM: &str = "cursor";

/// ユーザーIDのパスパラメータ名
pub const UID_PATH_PARAM: &str = "uid";

/// GET /users ハンドラー
pub struct ListUsersHandler {
    repository: Arc<dyn UserRepository>,
}

impl ListUsersHandler {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RouteHandler for ListUsersHandler {
    async fn handle(&self, ctx: &RequestContext<'_>) -> Result<Response<Body>, HandlerError> {
        let cursor = ctx.query(CURSOR_QUERY_PARAM);
        let page = self.repository.list(cursor).await?;

        debug!(count = page.len(), has_more = page.has_more(), "ユーザー一覧を返却");
        Ok(json_response(StatusCode::OK, &page)?)
    }
}

/// GET /users/{uid} ハンドラー
pub struct GetUserHandler {
    repository: Arc<dyn UserRepository>,
}

impl GetUserHandler {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RouteHandler for GetUserHandler {
    async fn handle(&self, ctx: &RequestContext<'_>) -> Result<Response<Body>, HandlerError> {
        let raw_uid = ctx.require_param(UID_PATH_PARAM)?;
        let uid = Uuid::parse_str(raw_uid)
            .map_err(|_| ServiceError::bad_request(format!("Invalid user id: {}", raw_uid)))?;

        match self.repository.get_by_id(&uid).await? {
            Some(user) => Ok(json_response(StatusCode::OK, &user)?),
            None => Err(ServiceError::not_found(format!("User {} not found", raw_uid)).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PathParams;
    use crate::domain::{PagedResponse, User};
    use crate::infrastructure::{RepositoryError, StubUserRepository};
    use lambda_http::http::Request as HttpRequest;
    use lambda_http::{Request, RequestExt};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn user(uid: &str, name: &str) -> User {
        User::new(
            Uuid::parse_str(uid).unwrap(),
            "2024-01-02T03:04:05".parse().unwrap(),
            name,
            &format!("{}@example.com", name),
        )
        .unwrap()
    }

    fn body_text(response: &Response<Body>) -> String {
        match response.body() {
            Body::Text(text) => text.clone(),
            other => panic!("予期しないBody型: {:?}", other),
        }
    }

    fn get(path: &str) -> Request {
        HttpRequest::builder()
            .method("GET")
            .uri(path)
            .body(Body::Empty)
            .unwrap()
    }

    fn uid_params(uid: &str) -> PathParams {
        let mut params = PathParams::new();
        params.push(UID_PATH_PARAM, uid);
        params
    }

    /// 受け取ったカーソルを記録し、用意したページを返すリポジトリ
    struct FakeRepository {
        page: PagedResponse<User>,
        users: Vec<User>,
        seen_cursor: Mutex<Option<Option<String>>>,
        fail: bool,
    }

    impl FakeRepository {
        fn with_page(page: PagedResponse<User>) -> Self {
            Self {
                users: page.data.clone().unwrap_or_default(),
                page,
                seen_cursor: Mutex::new(None),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with_page(PagedResponse::empty())
            }
        }
    }

    #[async_trait]
    impl UserRepository for FakeRepository {
        async fn list(
            &self,
            cursor: Option<&str>,
        ) -> Result<PagedResponse<User>, RepositoryError> {
            *self.seen_cursor.lock().unwrap() = Some(cursor.map(str::to_string));
            if self.fail {
                return Err(RepositoryError::ReadError("backend unavailable".to_string()));
            }
            Ok(self.page.clone())
        }

        async fn get_by_id(&self, uid: &Uuid) -> Result<Option<User>, RepositoryError> {
            if self.fail {
                return Err(RepositoryError::ReadError("backend unavailable".to_string()));
            }
            Ok(self.users.iter().find(|u| u.uid() == uid).cloned())
        }
    }

    // ===========================================
    // GET /users
    // ===========================================

    /// 一覧はリポジトリが返した順序を保つ
    #[tokio::test]
    async fn test_list_preserves_order_and_null_cursor() {
        let users = vec![
            user("00000000-0000-0000-0000-000000000002", "zed"),
            user("00000000-0000-0000-0000-000000000001", "amy"),
        ];
        let handler = ListUsersHandler::new(Arc::new(FakeRepository::with_page(
            PagedResponse::last_page(users),
        )));
        let request = get("/users");
        let ctx = RequestContext::new(&request, PathParams::new());

        let response = handler.handle(&ctx).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let parsed: serde_json::Value = serde_json::from_str(&body_text(&response)).unwrap();
        assert_eq!(parsed["data"][0]["name"], "zed");
        assert_eq!(parsed["data"][1]["name"], "amy");
        assert!(parsed["cursor"].is_null());
    }

    #[tokio::test]
    async fn test_list_passes_cursor_and_returns_next_cursor() {
        let repository = Arc::new(FakeRepository::with_page(PagedResponse::new(
            vec![user("00000000-0000-0000-0000-000000000003", "kai")],
            Some("page-3".to_string()),
        )));
        let handler = ListUsersHandler::new(repository.clone());
        let request = get("/users").with_query_string_parameters(HashMap::from([(
            "cursor".to_string(),
            "page-2".to_string(),
        )]));
        let ctx = RequestContext::new(&request, PathParams::new());

        let response = handler.handle(&ctx).await.unwrap();

        assert_eq!(
            *repository.seen_cursor.lock().unwrap(),
            Some(Some("page-2".to_string()))
        );
        let parsed: serde_json::Value = serde_json::from_str(&body_text(&response)).unwrap();
        assert_eq!(parsed["cursor"], "page-3");
    }

    /// Userをエンベロープにシリアライズして戻すと同じ値になる
    #[tokio::test]
    async fn test_list_user_survives_envelope_round_trip() {
        let original = user("1d5f8ffd-202c-4118-8adc-6ad8e742453b", "cfchou");
        let handler = ListUsersHandler::new(Arc::new(FakeRepository::with_page(
            PagedResponse::last_page(vec![original.clone()]),
        )));
        let request = get("/users");
        let ctx = RequestContext::new(&request, PathParams::new());

        let response = handler.handle(&ctx).await.unwrap();
        let parsed: PagedResponse<User> = serde_json::from_str(&body_text(&response)).unwrap();

        let restored = &parsed.data.unwrap()[0];
        assert_eq!(restored.uid(), original.uid());
        assert_eq!(
            restored.created_at().format("%Y-%m-%dT%H:%M:%S").to_string(),
            original.created_at().format("%Y-%m-%dT%H:%M:%S").to_string()
        );
        assert_eq!(restored.name(), original.name());
        assert_eq!(restored.email(), original.email());
    }

    #[tokio::test]
    async fn test_list_repository_failure_is_unexpected() {
        let handler = ListUsersHandler::new(Arc::new(FakeRepository::failing()));
        let request = get("/users");
        let ctx = RequestContext::new(&request, PathParams::new());

        let err = handler.handle(&ctx).await.unwrap_err();

        assert_eq!(
            err.into_service_error(),
            ServiceError::internal("Read error: backend unavailable")
        );
    }

    // ===========================================
    // GET /users/{uid}
    // ===========================================

    #[tokio::test]
    async fn test_get_user_found() {
        let uid = "00000000-0000-0000-0000-000000000009";
        let handler = GetUserHandler::new(Arc::new(FakeRepository::with_page(
            PagedResponse::last_page(vec![user(uid, "nia")]),
        )));
        let request = get(&format!("/users/{}", uid));
        let ctx = RequestContext::new(&request, uid_params(uid));

        let response = handler.handle(&ctx).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let parsed: User = serde_json::from_str(&body_text(&response)).unwrap();
        assert_eq!(parsed.name(), "nia");
    }

    #[tokio::test]
    async fn test_get_user_missing_is_not_found() {
        let uid = "1d5f8ffd-202c-4118-8adc-6ad8e742453b";
        let handler = GetUserHandler::new(Arc::new(StubUserRepository::new()));
        let request = get(&format!("/users/{}", uid));
        let ctx = RequestContext::new(&request, uid_params(uid));

        let err = handler.handle(&ctx).await.unwrap_err();

        assert_eq!(
            err.into_service_error(),
            ServiceError::not_found(format!("User {} not found", uid))
        );
    }

    #[tokio::test]
    async fn test_get_user_invalid_uid_is_bad_request() {
        let handler = GetUserHandler::new(Arc::new(StubUserRepository::new()));
        let request = get("/users/not-a-uuid");
        let ctx = RequestContext::new(&request, uid_params("not-a-uuid"));

        let err = handler.handle(&ctx).await.unwrap_err();

        assert_eq!(
            err.into_service_error(),
            ServiceError::bad_request("Invalid user id: not-a-uuid")
        );
    }

    #[tokio::test]
    async fn test_get_user_repository_failure_is_unexpected() {
        let uid = "00000000-0000-0000-0000-000000000009";
        let handler = GetUserHandler::new(Arc::new(FakeRepository::failing()));
        let request = get(&format!("/users/{}", uid));
        let ctx = RequestContext::new(&request, uid_params(uid));

        let err = handler.handle(&ctx).await.unwrap_err();

        assert!(matches!(err, HandlerError::Unexpected(_)));
    }
}
