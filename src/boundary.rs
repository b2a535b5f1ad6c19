use crate::content_type::ContentType;
use crate::error::Error;
use crate::multipart::validate_boundary;

/// ヘッダーから multipart の境界文字列を取り出す
///
/// `content-type` ヘッダーを大文字小文字を区別せずに探し、その boundary パラメータを返す。
/// ヘッダーがない場合は [`Error::MissingContentTypeHeader`]、
/// boundary パラメータがない、または境界として不正な場合は
/// [`Error::InvalidContentTypeHeader`] を返す。
///
/// ```rust
/// use shiguredo_form_data::extract_boundary;
///
/// let headers = vec![(
///     "Content-Type".to_string(),
///     "multipart/form-data; boundary=abc123".to_string(),
/// )];
/// assert_eq!(extract_boundary(&headers).unwrap(), "abc123");
/// ```
pub fn extract_boundary(headers: &[(String, String)]) -> Result<String, Error> {
    let value = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.as_str())
        .ok_or(Error::MissingContentTypeHeader)?;

    let content_type = ContentType::parse(value)
        .map_err(|e| Error::InvalidContentTypeHeader(e.to_string()))?;
    let boundary = content_type.boundary().ok_or_else(|| {
        Error::InvalidContentTypeHeader(format!(
            "no boundary parameter in {}",
            content_type.mime_type()
        ))
    })?;
    validate_boundary(boundary).map_err(|e| Error::InvalidContentTypeHeader(e.to_string()))?;

    Ok(boundary.to_string())
}
