/// ルートマニフェスト出力ツール
///
/// 環境変数の設定からルーターを構築し、各ルートのメソッド・パス・
/// APIキー要否・スロットリング値をJSONで標準出力に書き出す。
/// API Gatewayのリソース定義や使用量プランを生成するデプロイツールが読み込む。
///
/// # ローカル実行
/// ```bash
/// export RESTAPI_ENV=prod
/// cargo run --bin route_manifest -- --pretty
/// ```
use std::sync::Arc;

use clap::Parser;
use lambda_http::Error;
use restapi::application::{RouteManifest, build_router};
use restapi::infrastructure::{ServiceConfig, StubUserRepository, init_cli_logging};
use tracing::info;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "route_manifest")]
#[command(about = "REST APIのルート一覧（APIキー要否・スロットリング）をJSONで出力")]
struct CliArgs {
    /// 整形して出力する
    #[arg(long, short = 'p')]
    pretty: bool,
}

fn main() -> Result<(), Error> {
    init_cli_logging();
    let args = CliArgs::parse();

    let config = ServiceConfig::from_env()?;
    let router = build_router(&config, Arc::new(StubUserRepository::new()))?;
    let manifest = RouteManifest::new(&config, &router);

    info!(
        environment = %config.environment,
        routes = manifest.routes.len(),
        "ルートマニフェストを出力"
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&manifest)?
    } else {
        serde_json::to_string(&manifest)?
    };
    println!("{}", json);

    Ok(())
}
