/// ログ基盤モジュール
///
/// CloudWatch Logsに出力するJSON形式の構造化ログを設定する。
/// ルーターのミドルウェアやハンドラーは`tracing`マクロのみを使い、
/// 出力先の設定はこのモジュールに閉じる。
use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 本番用の既定ログレベル
const DEFAULT_LOG_LEVEL: &str = "info";

/// テスト用の既定ログレベル
#[cfg(test)]
const DEFAULT_TEST_LOG_LEVEL: &str = "debug";

static INIT: Once = Once::new();

/// `RUST_LOG`を優先し、未設定なら既定レベルを使うフィルター
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Lambda環境向けのログサブスクライバーを初期化する
///
/// イベントのフィールドをトップレベルに展開したJSONを出力する。
/// 複数回呼び出しても最初の1回だけ初期化する（warm start対策）。
pub fn init_logging() {
    INIT.call_once(|| {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true)
            // dispatchスパンのmethod/path/request_idを各行に含める
            .with_current_span(true)
            .with_span_list(false);

        // 既に別のサブスクライバーが登録済みの場合は何もしない
        let _ = tracing_subscriber::registry()
            .with(env_filter(DEFAULT_LOG_LEVEL))
            .with(json_layer)
            .try_init();
    });
}

/// CLIツール向けのログサブスクライバーを初期化する
///
/// 標準出力はツールの出力（JSON）に使うため、ログは標準エラーに書き出す。
pub fn init_cli_logging() {
    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter(DEFAULT_LOG_LEVEL))
            .with(fmt_layer)
            .try_init();
    });
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter(DEFAULT_TEST_LOG_LEVEL))
            .with(fmt_layer)
            .try_init();
    });
}
