//! Content-Type ヘッダー値パース (RFC 9110 Section 8.3)
//!
//! ## 概要
//!
//! boundary パラメータの取り出しに必要な範囲で Content-Type ヘッダー値をパースします。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form_data::content_type::ContentType;
//!
//! let ct = ContentType::parse("multipart/form-data; boundary=----WebKitFormBoundary").unwrap();
//! assert!(ct.is_form_data());
//! assert_eq!(ct.boundary(), Some("----WebKitFormBoundary"));
//!
//! // 引用符付きの boundary
//! let ct = ContentType::parse("multipart/form-data; boundary=\"a=b c\"").unwrap();
//! assert_eq!(ct.boundary(), Some("a=b c"));
//! ```

use core::fmt::{self, Write as _};

/// Content-Type パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeError {
    /// 値が空
    Empty,
    /// `type/subtype` の形になっていない
    InvalidMediaType,
    /// `name=value` の形になっていないパラメータ
    InvalidParameter,
    /// 閉じられていない quoted-string
    UnterminatedQuote,
}

impl fmt::Display for ContentTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentTypeError::Empty => write!(f, "empty Content-Type"),
            ContentTypeError::InvalidMediaType => write!(f, "invalid media type"),
            ContentTypeError::InvalidParameter => write!(f, "invalid parameter"),
            ContentTypeError::UnterminatedQuote => write!(f, "unterminated quote"),
        }
    }
}

impl std::error::Error for ContentTypeError {}

/// Content-Type ヘッダー値
///
/// ```text
/// Content-Type = type "/" subtype *( OWS ";" OWS [ name "=" ( token / quoted-string ) ] )
/// ```
///
/// `type/subtype` とパラメータ名は小文字で保持し、パラメータ値は受け取ったままにする。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// 小文字の `type/subtype`
    essence: String,
    /// `essence` 内の `/` の位置
    slash: usize,
    parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Content-Type ヘッダー値をパース
    pub fn parse(input: &str) -> Result<Self, ContentTypeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContentTypeError::Empty);
        }

        let mut scanner = Scanner::new(input);
        let media_type = scanner.token();
        if media_type.is_empty() || !scanner.eat('/') {
            return Err(ContentTypeError::InvalidMediaType);
        }
        let subtype = scanner.token();
        scanner.skip_whitespace();
        if subtype.is_empty() || !scanner.at_separator() {
            return Err(ContentTypeError::InvalidMediaType);
        }

        let mut content_type = ContentType::new(media_type, subtype);
        loop {
            scanner.skip(|c| c == ';' || c.is_whitespace());
            if scanner.is_empty() {
                break;
            }

            let name = scanner.token();
            scanner.skip_whitespace();
            if name.is_empty() || !scanner.eat('=') {
                return Err(ContentTypeError::InvalidParameter);
            }
            scanner.skip_whitespace();
            let value = if scanner.eat('"') {
                scanner.quoted_string()?
            } else {
                scanner
                    .skip(|c| c != ';' && !c.is_whitespace())
                    .to_string()
            };

            // 値の直後はセミコロンか終端でなければならない
            scanner.skip_whitespace();
            if !scanner.at_separator() {
                return Err(ContentTypeError::InvalidParameter);
            }
            content_type.parameters.push((name.to_ascii_lowercase(), value));
        }

        Ok(content_type)
    }

    /// パラメータのない ContentType を作成
    pub fn new(media_type: &str, subtype: &str) -> Self {
        ContentType {
            essence: format!(
                "{}/{}",
                media_type.to_ascii_lowercase(),
                subtype.to_ascii_lowercase()
            ),
            slash: media_type.len(),
            parameters: Vec::new(),
        }
    }

    /// パラメータを追加 (ビルダーパターン)
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// type (例: "multipart")
    pub fn media_type(&self) -> &str {
        &self.essence[..self.slash]
    }

    /// subtype (例: "form-data")
    pub fn subtype(&self) -> &str {
        &self.essence[self.slash + 1..]
    }

    /// `type/subtype` (例: "multipart/form-data")
    pub fn mime_type(&self) -> &str {
        &self.essence
    }

    /// パラメータ値を取得 (名前は大文字小文字を区別しない、同名が複数あれば最初のもの)
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find_map(|(n, v)| n.eq_ignore_ascii_case(name).then_some(v.as_str()))
    }

    /// パラメータ一覧
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// boundary パラメータ
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// type が multipart かどうか
    pub fn is_multipart(&self) -> bool {
        self.media_type() == "multipart"
    }

    /// multipart/form-data かどうか
    pub fn is_form_data(&self) -> bool {
        self.essence == "multipart/form-data"
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)?;
        for (name, value) in &self.parameters {
            write!(f, "; {}=", name)?;
            write_parameter_value(f, value)?;
        }
        Ok(())
    }
}

/// token として書けない値は quoted-string にする
fn write_parameter_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if !value.is_empty() && value.bytes().all(is_tchar) {
        return f.write_str(value);
    }
    write_quoted_string(f, value)
}

/// 引用符とバックスラッシュを quoted-pair にして quoted-string を書き出す
pub(crate) fn write_quoted_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

/// ヘッダー値を先頭から読み進める
pub(crate) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// 終端またはセミコロンの位置にいるか
    pub(crate) fn at_separator(&self) -> bool {
        self.is_empty() || self.rest().starts_with(';')
    }

    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// 条件を満たす間読み進め、読んだ部分を返す
    pub(crate) fn skip(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    pub(crate) fn skip_whitespace(&mut self) {
        self.skip(char::is_whitespace);
    }

    pub(crate) fn token(&mut self) -> &'a str {
        self.skip(|c| c.is_ascii() && is_tchar(c as u8))
    }

    /// 開き引用符の直後から quoted-string を読み、quoted-pair を戻した値を返す
    pub(crate) fn quoted_string(&mut self) -> Result<String, ContentTypeError> {
        let mut value = String::new();
        let mut chars = self.rest().char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                _ => value.push(c),
            }
        }

        Err(ContentTypeError::UnterminatedQuote)
    }
}

/// RFC 9110 tchar
fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
