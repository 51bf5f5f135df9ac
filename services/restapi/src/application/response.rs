// JSONレスポンスの構築
//
// 成功レスポンスは `", "` / `": "` 区切り（例: `{"message": "Hello from /"}`）、
// エラーレスポンスは区切りなしのコンパクト形式（`{"statusCode":404,"message":"..."}`）で出力する。
// どちらも`Content-Type: application/json`のテキストボディで、base64エンコードはしない。

use std::io;

use lambda_http::http::header::{CONTENT_TYPE, HeaderValue};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use serde::Serialize;
use serde_json::ser::Formatter;

use crate::domain::ServiceError;

/// JSONのContent-Type
pub const APPLICATION_JSON: &str = "application/json";

/// エラーボディのシリアライズ自体に失敗した場合の最終フォールバック
const FALLBACK_ERROR_BODY: &str = r#"{"statusCode":500,"message":"Internal Server Error"}"#;

/// 要素区切りに`", "`、キーと値の区切りに`": "`を使うフォーマッター
#[derive(Debug, Clone, Copy, Default)]
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// 成功レスポンス用の形式でシリアライズ
pub fn to_spaced_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    // serde_jsonの出力は常にUTF-8
    String::from_utf8(buf).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

/// ステータスとJSONテキストからレスポンスを構築
fn text_response(status: StatusCode, json: String) -> Response<Body> {
    let mut response = Response::new(Body::Text(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    response
}

/// 成功レスポンスを構築
///
/// シリアライズに失敗した場合は`ServiceError::Internal`を返す。
pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
) -> Result<Response<Body>, ServiceError> {
    let json = to_spaced_json(body)
        .map_err(|e| ServiceError::internal(format!("Failed to serialize response: {}", e)))?;
    Ok(text_response(status, json))
}

/// エラーレスポンスを構築
///
/// ステータスコードとメッセージはエラーが宣言したものをそのまま使う。
pub fn error_response(error: &ServiceError) -> Response<Body> {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let json = serde_json::to_string(&error.to_body())
        .unwrap_or_else(|_| FALLBACK_ERROR_BODY.to_string());
    text_response(status, json)
}
