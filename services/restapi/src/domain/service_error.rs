// エラー分類（タクソノミー）
//
// ハンドラーが送出するドメインエラーと、
// クライアントに返却するエラーボディの形を定義する。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// サービスエラー
///
/// 各種別は固定のHTTPステータスコードと自由記述のメッセージを持つ。
/// ルーターはこのエラーのステータスとメッセージをそのまま使ってレスポンスを構築する。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// 不正な入力（パスパラメータの型不一致、エンティティのフィールド検証失敗など）
    #[error("{0}")]
    BadRequest(String),

    /// ルート不一致、またはエンティティが存在しない
    #[error("{0}")]
    NotFound(String),

    /// ハンドラー内部の想定外の障害（メッセージは原因のみ、スタックトレースは含めない）
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// 400 Bad Requestエラーを作成
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// 404 Not Foundエラーを作成
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// 500 Internal Server Errorを作成
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// 種別に対応するHTTPステータスコード
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Internal(_) => 500,
        }
    }

    /// エラーメッセージを取得
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message) | Self::NotFound(message) | Self::Internal(message) => {
                message
            }
        }
    }

    /// クライアントに返すエラーボディへ変換
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            status_code: self.status_code(),
            message: self.message().to_string(),
        }
    }
}

/// エラーレスポンスのボディ
///
/// `{"statusCode": <int>, "message": <string>}` の固定形。
/// 成功時のエンベロープ（`data`/`cursor`）とは別の形で、両者が同時に出力されることはない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// HTTPステータスコード
    pub status_code: u16,
    /// 人間が読めるエラーメッセージ
    pub message: String,
}
