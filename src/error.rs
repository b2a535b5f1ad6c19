use std::fmt;

use crate::multipart::MultipartError;

/// フォームデータのデコードエラー
///
/// いずれのエラーもデコード全体の失敗を表し、部分的な結果は返さない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Content-Type ヘッダーがない
    MissingContentTypeHeader,
    /// Content-Type ヘッダーに有効な boundary パラメータがない
    InvalidContentTypeHeader(String),
    /// base64 フラグが立っているがボディが base64 として不正
    InvalidTransportEncoding(String),
    /// ボディが multipart の文法に従っていない
    MalformedMultipartBody(MultipartError),
    /// ボディサイズ超過
    BodyTooLarge { size: usize, limit: usize },
    /// パート数超過
    TooManyParts { count: usize, limit: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingContentTypeHeader => {
                write!(f, "cannot find boundary: no content-type header")
            }
            Error::InvalidContentTypeHeader(msg) => {
                write!(f, "invalid content-type header: {}", msg)
            }
            Error::InvalidTransportEncoding(msg) => {
                write!(f, "failed to read base64 body: {}", msg)
            }
            Error::MalformedMultipartBody(e) => write!(f, "malformed multipart body: {}", e),
            Error::BodyTooLarge { size, limit } => {
                write!(f, "body too large: {} > {}", size, limit)
            }
            Error::TooManyParts { count, limit } => {
                write!(f, "too many parts: {} > {}", count, limit)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MalformedMultipartBody(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MultipartError> for Error {
    fn from(e: MultipartError) -> Self {
        Error::MalformedMultipartBody(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::MissingContentTypeHeader.to_string(),
            "cannot find boundary: no content-type header"
        );
        assert_eq!(
            Error::BodyTooLarge {
                size: 11,
                limit: 10
            }
            .to_string(),
            "body too large: 11 > 10"
        );
        assert_eq!(
            Error::MalformedMultipartBody(MultipartError::UnterminatedPart).to_string(),
            "malformed multipart body: part is not closed by a delimiter"
        );
    }

    #[test]
    fn test_source() {
        let e = Error::from(MultipartError::MissingName);
        assert!(e.source().is_some());
        assert!(Error::MissingContentTypeHeader.source().is_none());
    }
}
