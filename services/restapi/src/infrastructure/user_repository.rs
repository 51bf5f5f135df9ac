/// ユーザーの取得を抽象化するリポジトリ
///
/// バックエンドのストレージは差し替え可能とし、
/// 現時点ではストアが未接続のため固定データを返すスタブ実装のみを提供する。
use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{PagedResponse, User, UserError};

/// スタブが返す固定ユーザーのID
pub const SEED_USER_UID: &str = "1d5f8ffd-202c-4118-8adc-6ad8e742453b";

/// スタブが返す固定ユーザーの作成日時
pub const SEED_USER_CREATED_AT: &str = "2021-08-20T08:45:00";

/// スタブが返す固定ユーザーの名前
pub const SEED_USER_NAME: &str = "cfchou";

/// スタブが返す固定ユーザーのメールアドレス
pub const SEED_USER_EMAIL: &str = "cfchou@gmail.com";

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// バックエンドからの読み込みに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// バックエンドのデータを型に変換できない（ID、日時など）
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// エンティティの検証に失敗（不正なメールアドレスなど）
    #[error(transparent)]
    InvalidEntity(#[from] UserError),
}

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザー一覧の1ページを取得
    ///
    /// # 引数
    /// * `cursor` - 前ページが返した継続トークン（先頭ページは`None`）
    async fn list(&self, cursor: Option<&str>) -> Result<PagedResponse<User>, RepositoryError>;

    /// IDでユーザーを取得
    ///
    /// # 戻り値
    /// * `Ok(Some(user))` - 見つかった
    /// * `Ok(None)` - 存在しない
    /// * `Err(RepositoryError)` - バックエンドのエラー
    async fn get_by_id(&self, uid: &Uuid) -> Result<Option<User>, RepositoryError>;
}

/// 固定データを返すスタブリポジトリ
///
/// - `list`: 固定ユーザー1件を`cursor: null`で返す
/// - `get_by_id`: ストア未接続のため常に`None`
#[derive(Debug, Clone, Default)]
pub struct StubUserRepository;

impl StubUserRepository {
    pub fn new() -> Self {
        Self
    }

    /// 固定ユーザーを構築
    fn seed_users() -> Result<Vec<User>, RepositoryError> {
        let uid = Uuid::parse_str(SEED_USER_UID)
            .map_err(|e| RepositoryError::InvalidRecord(format!("uid: {}", e)))?;
        let created_at: NaiveDateTime = SEED_USER_CREATED_AT
            .parse()
            .map_err(|e| RepositoryError::InvalidRecord(format!("created_at: {}", e)))?;

        Ok(vec![User::new(uid, created_at, SEED_USER_NAME, SEED_USER_EMAIL)?])
    }
}

#[async_trait]
impl UserRepository for StubUserRepository {
    async fn list(&self, cursor: Option<&str>) -> Result<PagedResponse<User>, RepositoryError> {
        // 固定データは1ページに収まるため、カーソルの有無に関わらず同じページを返す
        tracing::debug!(cursor = ?cursor, "スタブリポジトリから一覧を取得");
        Ok(PagedResponse::last_page(Self::seed_users()?))
    }

    async fn get_by_id(&self, uid: &Uuid) -> Result<Option<User>, RepositoryError> {
        tracing::debug!(uid = %uid, "スタブリポジトリは常に未検出を返す");
        Ok(None)
    }
}
