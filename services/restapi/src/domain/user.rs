// ユーザーエンティティ
//
// 一意なID、作成日時、検証済みメールアドレスを持つ不変レコード。
// ハンドラーがバックエンドのデータから構築し、レスポンスにシリアライズする。

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::ServiceError;

/// ローカル部の最大長（RFC 5321）
const MAX_LOCAL_PART_LENGTH: usize = 64;

/// ドメイン部の最大長
const MAX_DOMAIN_LENGTH: usize = 253;

/// DNSラベルの最大長
const MAX_LABEL_LENGTH: usize = 63;

/// アドレス全体の最大長
const MAX_EMAIL_LENGTH: usize = 254;

/// エンティティ検証エラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserError {
    /// メールアドレスが不正
    #[error("Invalid email address '{email}': {reason}")]
    InvalidEmail { email: String, reason: &'static str },
}

impl From<UserError> for ServiceError {
    fn from(err: UserError) -> Self {
        ServiceError::BadRequest(err.to_string())
    }
}

/// 検証済みメールアドレス
///
/// RFC 5322のaddr-spec（dot-atom形式のローカル部 + ホスト名ドメイン）に合致する値のみ保持する。
/// 構築時とデシリアライズ時の両方で検証される。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// メールアドレスを検証して作成
    pub fn parse(value: impl Into<String>) -> Result<Self, UserError> {
        let value = value.into();
        match validate_email(&value) {
            Ok(()) => Ok(Self(value)),
            Err(reason) => Err(UserError::InvalidEmail {
                email: value,
                reason,
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ローカル部で許可されるatext記号
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~-".contains(c)
}

/// addr-specの検証
///
/// 引用符付きローカル部、IPリテラルドメイン、コメントは受け付けない。
fn validate_email(value: &str) -> Result<(), &'static str> {
    if value.len() > MAX_EMAIL_LENGTH {
        return Err("address is too long");
    }

    let (local, domain) = value.split_once('@').ok_or("missing '@'")?;
    if domain.contains('@') {
        return Err("more than one '@'");
    }

    // ローカル部（dot-atom）
    if local.is_empty() {
        return Err("empty local part");
    }
    if local.len() > MAX_LOCAL_PART_LENGTH {
        return Err("local part is too long");
    }
    if local.split('.').any(|atom| atom.is_empty()) {
        return Err("local part has an empty atom");
    }
    if !local.chars().all(|c| c == '.' || is_atext(c)) {
        return Err("local part contains an invalid character");
    }

    // ドメイン部（ホスト名、最低2ラベル）
    if domain.is_empty() {
        return Err("empty domain");
    }
    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err("domain is too long");
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err("domain must contain a '.'");
    }
    for label in &labels {
        if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
            return Err("domain has an invalid label length");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("domain label starts or ends with '-'");
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err("domain contains an invalid character");
        }
    }
    if labels
        .last()
        .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Err("top-level domain is numeric");
    }

    Ok(())
}

/// ユーザー
///
/// JSON形: `{"uid": <UUID>, "created_at": <ISO 8601>, "name": <string>, "email": <string>}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    uid: Uuid,
    created_at: NaiveDateTime,
    name: String,
    email: Email,
}

impl User {
    /// 各フィールドを検証してユーザーを作成
    ///
    /// メールアドレスが不正な場合は`UserError::InvalidEmail`を返す。
    /// ハンドラーでは`?`により`ServiceError::BadRequest`へ変換される。
    pub fn new(
        uid: Uuid,
        created_at: NaiveDateTime,
        name: impl Into<String>,
        email: &str,
    ) -> Result<Self, UserError> {
        Ok(Self {
            uid,
            created_at,
            name: name.into(),
            email: Email::parse(email)?,
        })
    }

    pub fn uid(&self) -> &Uuid {
        &self.uid
    }

    pub fn created_at(&self) -> &NaiveDateTime {
        &self.created_at
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }
}
