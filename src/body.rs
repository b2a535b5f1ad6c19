use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::Error;

/// 転送用の base64 エンコードを元に戻す
///
/// フラグが立っていなければボディをそのまま返す。
/// base64 として不正な場合は [`Error::InvalidTransportEncoding`] を返し、部分的な復元は行わない。
///
/// ```rust
/// use shiguredo_form_data::normalize_body;
///
/// assert_eq!(&*normalize_body("aGVsbG8=", true).unwrap(), b"hello");
/// assert_eq!(&*normalize_body("hello", false).unwrap(), b"hello");
/// ```
pub fn normalize_body(body: &str, is_base64_encoded: bool) -> Result<Cow<'_, [u8]>, Error> {
    if !is_base64_encoded {
        return Ok(Cow::Borrowed(body.as_bytes()));
    }

    STANDARD
        .decode(body)
        .map(Cow::Owned)
        .map_err(|e| Error::InvalidTransportEncoding(e.to_string()))
}
