/// サービス設定
///
/// 起動時に環境変数から一度だけ読み込む静的型付きの設定。
/// スロットリング値はデプロイ境界（API Gateway）へ受け渡すためのもので、
/// 本ランタイム内では強制しない。
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::ThrottleSetting;
use crate::domain::throttle_setting::{
    DEFAULT_LOGIN_BURST, DEFAULT_LOGIN_RATE, DEFAULT_PLAN_BURST, DEFAULT_PLAN_RATE,
    DEFAULT_USERS_BURST, DEFAULT_USERS_RATE,
};

/// 環境変数名: 実行環境
pub const ENV_ENVIRONMENT: &str = "RESTAPI_ENV";

/// 環境変数名: アプリケーション名
pub const ENV_APP_NAME: &str = "RESTAPI_APP_NAME";

/// 環境変数名: リソース名プレフィックス
pub const ENV_PREFIX: &str = "RESTAPI_PREFIX";

/// 環境変数名: 使用量プランの定常レート
pub const ENV_THROTTLE_RATE: &str = "RESTAPI_THROTTLE_RATE";

/// 環境変数名: 使用量プランのバースト
pub const ENV_THROTTLE_BURST: &str = "RESTAPI_THROTTLE_BURST";

/// 環境変数名: GET /users の定常レート
pub const ENV_USERS_THROTTLE_RATE: &str = "RESTAPI_USERS_THROTTLE_RATE";

/// 環境変数名: GET /users のバースト
pub const ENV_USERS_THROTTLE_BURST: &str = "RESTAPI_USERS_THROTTLE_BURST";

/// 環境変数名: GET /login の定常レート
pub const ENV_LOGIN_THROTTLE_RATE: &str = "RESTAPI_LOGIN_THROTTLE_RATE";

/// 環境変数名: GET /login のバースト
pub const ENV_LOGIN_THROTTLE_BURST: &str = "RESTAPI_LOGIN_THROTTLE_BURST";

/// デフォルトのアプリケーション名
pub const DEFAULT_APP_NAME: &str = "restapi";

/// 設定読み込みのエラー型
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported environment: {0} (expected dev or prod)")]
    UnsupportedEnvironment(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Throttle for {route} ({rate}/{burst}) exceeds the usage plan ({plan_rate}/{plan_burst})")]
    ThrottleExceedsPlan {
        route: String,
        rate: u32,
        burst: u32,
        plan_rate: u32,
        plan_burst: u32,
    },
}

/// 実行環境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(ConfigError::UnsupportedEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// サービス設定
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// 実行環境（dev / prod）
    pub environment: Environment,
    /// アプリケーション名
    pub app_name: String,
    /// リソース名プレフィックス
    pub prefix: String,
    /// 使用量プランのスロットリング（メソッド単位設定の上限）
    pub throttle: ThrottleSetting,
    /// GET /users のスロットリング
    pub users_throttle: ThrottleSetting,
    /// GET /login のスロットリング
    pub login_throttle: ThrottleSetting,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let environment = Environment::default();
        Self {
            environment,
            app_name: DEFAULT_APP_NAME.to_string(),
            prefix: default_prefix(DEFAULT_APP_NAME, environment),
            throttle: ThrottleSetting::new(DEFAULT_PLAN_RATE, DEFAULT_PLAN_BURST),
            users_throttle: ThrottleSetting::new(DEFAULT_USERS_RATE, DEFAULT_USERS_BURST),
            login_throttle: ThrottleSetting::new(DEFAULT_LOGIN_RATE, DEFAULT_LOGIN_BURST),
        }
    }
}

impl ServiceConfig {
    /// 環境変数から設定を読み込み
    ///
    /// 未設定・空文字の変数はデフォルト値を使用する。
    /// 数値変換に失敗した場合、または未対応の環境名の場合はエラーを返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込み
    ///
    /// `from_env`の本体。テストでは環境変数を汚さずに値を差し込める。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 空文字はNone扱い
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get(ENV_ENVIRONMENT) {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };
        let app_name = get(ENV_APP_NAME).unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        let prefix = get(ENV_PREFIX).unwrap_or_else(|| default_prefix(&app_name, environment));

        let read_u32 = |key: &str, default: u32| -> Result<u32, ConfigError> {
            match get(key) {
                Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                }),
                None => Ok(default),
            }
        };

        let throttle = ThrottleSetting::new(
            read_u32(ENV_THROTTLE_RATE, DEFAULT_PLAN_RATE)?,
            read_u32(ENV_THROTTLE_BURST, DEFAULT_PLAN_BURST)?,
        );
        let users_throttle = ThrottleSetting::new(
            read_u32(ENV_USERS_THROTTLE_RATE, DEFAULT_USERS_RATE)?,
            read_u32(ENV_USERS_THROTTLE_BURST, DEFAULT_USERS_BURST)?,
        );
        let login_throttle = ThrottleSetting::new(
            read_u32(ENV_LOGIN_THROTTLE_RATE, DEFAULT_LOGIN_RATE)?,
            read_u32(ENV_LOGIN_THROTTLE_BURST, DEFAULT_LOGIN_BURST)?,
        );

        let config = Self {
            environment,
            app_name,
            prefix,
            throttle,
            users_throttle,
            login_throttle,
        };
        config.validate()?;
        Ok(config)
    }

    /// メソッド単位のスロットリングがプラン上限を超えていないか検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (route, setting) in [
            ("GET /users", &self.users_throttle),
            ("GET /login", &self.login_throttle),
        ] {
            if !setting.fits_within(&self.throttle) {
                return Err(ConfigError::ThrottleExceedsPlan {
                    route: route.to_string(),
                    rate: setting.rate,
                    burst: setting.burst,
                    plan_rate: self.throttle.rate,
                    plan_burst: self.throttle.burst,
                });
            }
        }
        Ok(())
    }
}

/// プレフィックスの既定値（`<app_name>-<env>`）
fn default_prefix(app_name: &str, environment: Environment) -> String {
    format!("{}-{}", app_name, environment)
}
