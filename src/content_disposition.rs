//! multipart パートの Content-Disposition パース (RFC 7578 Section 4.2)
//!
//! ## 概要
//!
//! form-data パートの Content-Disposition から `name` と `filename` を取り出します。
//! `filename*` (RFC 2231 / RFC 5987) のデコードは行わず、その他のパラメータとして保持します。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form_data::content_disposition::{ContentDisposition, DispositionType};
//!
//! let cd = ContentDisposition::parse("form-data; name=\"file\"; filename=\"file.txt\"").unwrap();
//! assert_eq!(cd.disposition_type(), DispositionType::FormData);
//! assert_eq!(cd.name(), Some("file"));
//! assert_eq!(cd.filename(), Some("file.txt"));
//! ```

use core::fmt;

use crate::content_type::{Scanner, write_quoted_string};

/// Content-Disposition パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDispositionError {
    /// 空の入力
    Empty,
    /// 不正な disposition-type
    InvalidDispositionType,
    /// 不正なパラメータ
    InvalidParameter,
    /// 同名のパラメータが複数ある
    DuplicateParameter(String),
}

impl fmt::Display for ContentDispositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentDispositionError::Empty => write!(f, "empty content-disposition"),
            ContentDispositionError::InvalidDispositionType => {
                write!(f, "invalid disposition-type")
            }
            ContentDispositionError::InvalidParameter => write!(f, "invalid parameter"),
            ContentDispositionError::DuplicateParameter(name) => {
                write!(f, "duplicate parameter: {}", name)
            }
        }
    }
}

impl std::error::Error for ContentDispositionError {}

/// Disposition タイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionType {
    /// form-data: multipart/form-data のパート
    FormData,
    /// inline
    Inline,
    /// attachment
    Attachment,
}

impl DispositionType {
    fn from_token(s: &str) -> Result<Self, ContentDispositionError> {
        if s.eq_ignore_ascii_case("form-data") {
            Ok(DispositionType::FormData)
        } else if s.eq_ignore_ascii_case("inline") {
            Ok(DispositionType::Inline)
        } else if s.eq_ignore_ascii_case("attachment") {
            Ok(DispositionType::Attachment)
        } else {
            Err(ContentDispositionError::InvalidDispositionType)
        }
    }
}

impl fmt::Display for DispositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispositionType::FormData => write!(f, "form-data"),
            DispositionType::Inline => write!(f, "inline"),
            DispositionType::Attachment => write!(f, "attachment"),
        }
    }
}

/// Content-Disposition ヘッダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    disposition_type: DispositionType,
    /// name パラメータ
    name: Option<String>,
    /// filename パラメータ (宣言されたまま、パスの正規化はしない)
    filename: Option<String>,
    /// その他のパラメータ (名前は小文字)
    parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    /// Content-Disposition ヘッダー値をパース
    ///
    /// パラメータ名は大文字小文字を区別せず、同じパラメータが 2 回現れたらエラーにする。
    pub fn parse(input: &str) -> Result<Self, ContentDispositionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContentDispositionError::Empty);
        }

        let mut scanner = Scanner::new(input);
        let disposition_type = DispositionType::from_token(scanner.token())?;
        scanner.skip_whitespace();
        if !scanner.at_separator() {
            return Err(ContentDispositionError::InvalidDispositionType);
        }

        let mut cd = ContentDisposition::new(disposition_type);
        let mut seen: Vec<String> = Vec::new();

        loop {
            scanner.skip(|c| c == ';' || c.is_whitespace());
            if scanner.is_empty() {
                break;
            }

            let name = scanner.token().to_ascii_lowercase();
            scanner.skip_whitespace();
            if name.is_empty() || !scanner.eat('=') {
                return Err(ContentDispositionError::InvalidParameter);
            }
            scanner.skip_whitespace();
            let value = if scanner.eat('"') {
                scanner
                    .quoted_string()
                    .map_err(|_| ContentDispositionError::InvalidParameter)?
            } else {
                let value = scanner.skip(|c| c != ';' && !c.is_whitespace());
                if value.contains('"') {
                    return Err(ContentDispositionError::InvalidParameter);
                }
                value.to_string()
            };
            scanner.skip_whitespace();
            if !scanner.at_separator() {
                return Err(ContentDispositionError::InvalidParameter);
            }

            if seen.contains(&name) {
                return Err(ContentDispositionError::DuplicateParameter(name));
            }
            match name.as_str() {
                "name" => cd.name = Some(value),
                "filename" => cd.filename = Some(value),
                _ => cd.parameters.push((name.clone(), value)),
            }
            seen.push(name);
        }

        Ok(cd)
    }

    /// 新しい ContentDisposition を作成
    pub fn new(disposition_type: DispositionType) -> Self {
        ContentDisposition {
            disposition_type,
            name: None,
            filename: None,
            parameters: Vec::new(),
        }
    }

    /// disposition-type を取得
    pub fn disposition_type(&self) -> DispositionType {
        self.disposition_type
    }

    /// form-data かどうか
    pub fn is_form_data(&self) -> bool {
        self.disposition_type == DispositionType::FormData
    }

    /// name パラメータを取得
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// filename パラメータを取得
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// その他のパラメータを取得
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// name を設定
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// filename を設定
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.disposition_type)?;

        let named = [("name", &self.name), ("filename", &self.filename)];
        let named = named
            .into_iter()
            .filter_map(|(key, value)| Some((key, value.as_deref()?)));
        let others = self.parameters.iter().map(|(k, v)| (k.as_str(), v.as_str()));

        for (key, value) in named.chain(others) {
            write!(f, "; {}=", key)?;
            write_quoted_string(f, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        let cd = ContentDisposition::parse("form-data; name=\"text\"").unwrap();
        assert!(cd.is_form_data());
        assert_eq!(cd.name(), Some("text"));
        assert_eq!(cd.filename(), None);
    }

    #[test]
    fn test_parse_file() {
        let cd =
            ContentDisposition::parse(r#"form-data; name="file"; filename="file.txt""#).unwrap();
        assert_eq!(cd.name(), Some("file"));
        assert_eq!(cd.filename(), Some("file.txt"));
    }

    #[test]
    fn test_parse_empty_filename() {
        // filename の有無だけがファイル判定に使われる
        let cd = ContentDisposition::parse("form-data; name=\"file\"; filename=\"\"").unwrap();
        assert_eq!(cd.filename(), Some(""));
    }

    #[test]
    fn test_parse_semicolon_in_quotes() {
        let cd =
            ContentDisposition::parse(r#"form-data; name="a;b"; filename="c; d.txt""#).unwrap();
        assert_eq!(cd.name(), Some("a;b"));
        assert_eq!(cd.filename(), Some("c; d.txt"));
    }

    #[test]
    fn test_parse_filename_is_not_normalized() {
        let cd =
            ContentDisposition::parse(r#"form-data; name="f"; filename="../d/a\\b.txt""#).unwrap();
        assert_eq!(cd.filename(), Some("../d/a\\b.txt"));
    }

    #[test]
    fn test_parse_token_values() {
        let cd = ContentDisposition::parse("FORM-DATA; NAME=field; Filename=x.bin").unwrap();
        assert!(cd.is_form_data());
        assert_eq!(cd.name(), Some("field"));
        assert_eq!(cd.filename(), Some("x.bin"));
    }

    #[test]
    fn test_parse_ext_value_is_kept_as_parameter() {
        let cd = ContentDisposition::parse("form-data; name=\"f\"; filename*=UTF-8''a%20b.txt")
            .unwrap();
        assert_eq!(cd.filename(), None);
        assert_eq!(cd.parameter("filename*"), Some("UTF-8''a%20b.txt"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ContentDisposition::parse(""),
            Err(ContentDispositionError::Empty)
        );
        assert_eq!(
            ContentDisposition::parse("unknown; name=\"a\""),
            Err(ContentDispositionError::InvalidDispositionType)
        );
        assert_eq!(
            ContentDisposition::parse("form-data; name"),
            Err(ContentDispositionError::InvalidParameter)
        );
        assert_eq!(
            ContentDisposition::parse("form-data; name=\"a"),
            Err(ContentDispositionError::InvalidParameter)
        );
        assert_eq!(
            ContentDisposition::parse("form-data; name=\"a\"; NAME=\"b\""),
            Err(ContentDispositionError::DuplicateParameter("name".to_string()))
        );
    }

    #[test]
    fn test_display() {
        let cd = ContentDisposition::new(DispositionType::FormData)
            .with_name("upload")
            .with_filename("say \"hi\".txt");
        assert_eq!(
            cd.to_string(),
            r#"form-data; name="upload"; filename="say \"hi\".txt""#
        );
        assert_eq!(ContentDisposition::parse(&cd.to_string()).unwrap(), cd);
    }
}
