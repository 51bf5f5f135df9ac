// スロットリング設定
//
// API Gatewayの使用量プラン/メソッド単位で適用されるレート制限値。
// 本ランタイムでは強制せず、デプロイ境界へ受け渡すメタデータとしてのみ保持する。

use serde::{Deserialize, Serialize};

/// 使用量プランのデフォルト定常レート（リクエスト/秒）
pub const DEFAULT_PLAN_RATE: u32 = 100;

/// 使用量プランのデフォルトバースト
pub const DEFAULT_PLAN_BURST: u32 = 200;

/// GET /users のデフォルト定常レート
pub const DEFAULT_USERS_RATE: u32 = 10;

/// GET /users のデフォルトバースト
pub const DEFAULT_USERS_BURST: u32 = 20;

/// GET /login のデフォルト定常レート
pub const DEFAULT_LOGIN_RATE: u32 = 1;

/// GET /login のデフォルトバースト
pub const DEFAULT_LOGIN_BURST: u32 = 2;

/// 定常レートとバーストの組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleSetting {
    /// 定常レート（リクエスト/秒）
    pub rate: u32,
    /// バースト上限
    pub burst: u32,
}

impl ThrottleSetting {
    pub const fn new(rate: u32, burst: u32) -> Self {
        Self { rate, burst }
    }

    /// 別の設定（プラン上限）の範囲内に収まっているか
    pub fn fits_within(&self, cap: &ThrottleSetting) -> bool {
        self.rate <= cap.rate && self.burst <= cap.burst
    }
}
