/// REST API Lambdaエントリポイント
///
/// API GatewayのLambdaプロキシ統合で受け取ったHTTPリクエストを
/// ルーターに振り分け、JSONレスポンスを返却する。
///
/// コールドスタート時に設定の読み込みとルートテーブルの構築を一度だけ行い、
/// 以後の呼び出しは構築済みのルーターを読み取り専用で共有する。
use std::sync::Arc;

use lambda_http::{Error, Request, run, service_fn};
use restapi::application::build_router;
use restapi::infrastructure::{ServiceConfig, StubUserRepository, init_logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // 設定不備やルート登録エラーは初期化失敗として扱う
    let config = ServiceConfig::from_env()?;
    let router = build_router(&config, Arc::new(StubUserRepository::new()))?;

    info!(
        environment = %config.environment,
        prefix = %config.prefix,
        routes = router.routes().len(),
        "REST API Lambda関数を初期化"
    );

    let router = &router;
    run(service_fn(move |request: Request| async move {
        Ok::<_, Error>(router.dispatch(request).await)
    }))
    .await
}
