// ページングエンベロープ
//
// 一覧系エンドポイントの成功レスポンスを包む共通の形。

use serde::{Deserialize, Serialize};

/// ページングされた一覧レスポンス
///
/// `{"data": [...], "cursor": <string | null>}` として常に両キーを出力する。
/// - `data`: 供給された順序を保った要素列。空列は`[]`、`None`は「結果なし」を明示した場合のみ
/// - `cursor`: 次ページの不透明な継続トークン。次ページがなければ`null`
///
/// エラーは`ServiceError`で別経路を通るため、エンベロープとエラーが同時に出力されることはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub data: Option<Vec<T>>,
    pub cursor: Option<String>,
}

impl<T> PagedResponse<T> {
    /// 要素列と継続トークンから作成
    pub fn new(items: Vec<T>, cursor: Option<String>) -> Self {
        Self {
            data: Some(items),
            cursor,
        }
    }

    /// 最終ページ（継続トークンなし）を作成
    pub fn last_page(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    /// 空の一覧を作成（`{"data": [], "cursor": null}`）
    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    /// 「結果なし」を明示したレスポンスを作成（`{"data": null, "cursor": null}`）
    pub fn no_result() -> Self {
        Self {
            data: None,
            cursor: None,
        }
    }

    /// 次ページが存在するか
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// 要素数（結果なしの場合は0）
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
