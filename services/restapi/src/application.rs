// アプリケーション層モジュール
pub mod login_handler;
pub mod middleware;
pub mod request_context;
pub mod response;
pub mod root_handler;
pub mod router;
pub mod routes;
pub mod user_handler;

// 再エクスポート
pub use login_handler::LoginHandler;
pub use middleware::{AccessLogMiddleware, Middleware};
pub use request_context::{PathParams, RequestContext};
pub use response::{error_response, json_response};
pub use root_handler::RootHandler;
pub use router::{HandlerError, Route, RouteError, RouteHandler, RouteOptions, Router};
pub use routes::{RouteManifest, RouteManifestEntry, build_router};
pub use user_handler::{GetUserHandler, ListUsersHandler};
