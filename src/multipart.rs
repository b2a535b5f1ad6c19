//! multipart/form-data ボディの読み取り (RFC 2046 Section 5.1, RFC 7578)
//!
//! ## 概要
//!
//! 境界で区切られたパートの並びとしてボディを読み取ります。
//! 各パートのヘッダーブロックは名前と値のペアとしてパースし、
//! 境界文字列の単純な分割やオフセットによる切り出しは行いません。
//!
//! - 区切り行は `--` + 境界で、末尾の空白 (transport padding) を許容する
//! - 終了区切りは `--` + 境界 + `--` で、後ろには空白と改行しか置けない
//! - 終了区切りの後続の epilogue は無視する
//! - 改行は CRLF と LF の両方を受け付け、最初の区切り行の改行に合わせる
//! - 最初の区切りより前の preamble は読み飛ばす
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form_data::multipart::MultipartReader;
//!
//! let body = b"--boundary\r\n\
//!     Content-Disposition: form-data; name=\"field1\"\r\n\r\n\
//!     value1\r\n\
//!     --boundary--";
//!
//! let mut reader = MultipartReader::new(body, "boundary").unwrap();
//! while let Some(part) = reader.next_part().unwrap() {
//!     assert_eq!(part.name(), Some("field1"));
//!     assert_eq!(part.body(), b"value1");
//! }
//! assert!(reader.is_finished());
//! ```

use core::fmt;

use crate::content_disposition::{ContentDisposition, ContentDispositionError, DispositionType};
use crate::content_type::ContentType;

/// 境界文字列の最大長 (RFC 2046)
pub const MAX_BOUNDARY_LEN: usize = 70;

/// multipart パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartError {
    /// 不正な境界文字列
    InvalidBoundary,
    /// 区切り行が見つからない
    MissingDelimiter,
    /// 区切り行の後ろに余分なバイトがある
    InvalidDelimiter,
    /// 不正なパートヘッダー
    InvalidHeader,
    /// ヘッダーブロックが空行で終わっていない
    UnterminatedHeader,
    /// パートが次の区切りの前にボディの終端に達した
    UnterminatedPart,
    /// パートヘッダー数超過
    TooManyHeaders { count: usize, limit: usize },
    /// Content-Disposition がない
    MissingContentDisposition,
    /// Content-Disposition が不正
    InvalidContentDisposition(ContentDispositionError),
    /// Content-Disposition が form-data ではない
    UnexpectedDispositionType(DispositionType),
    /// name パラメータがない
    MissingName,
    /// テキストフィールドの値が UTF-8 ではない
    InvalidFieldValue(String),
}

impl fmt::Display for MultipartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultipartError::InvalidBoundary => write!(f, "invalid boundary"),
            MultipartError::MissingDelimiter => write!(f, "no multipart delimiter found"),
            MultipartError::InvalidDelimiter => write!(f, "invalid multipart delimiter line"),
            MultipartError::InvalidHeader => write!(f, "invalid part header"),
            MultipartError::UnterminatedHeader => write!(f, "unterminated part header block"),
            MultipartError::UnterminatedPart => write!(f, "part is not closed by a delimiter"),
            MultipartError::TooManyHeaders { count, limit } => {
                write!(f, "too many part headers: {} > {}", count, limit)
            }
            MultipartError::MissingContentDisposition => {
                write!(f, "missing Content-Disposition header in part")
            }
            MultipartError::InvalidContentDisposition(e) => {
                write!(f, "invalid Content-Disposition: {}", e)
            }
            MultipartError::UnexpectedDispositionType(t) => {
                write!(f, "unexpected disposition-type: {}", t)
            }
            MultipartError::MissingName => write!(f, "missing name parameter in part"),
            MultipartError::InvalidFieldValue(name) => {
                write!(f, "field value is not valid UTF-8: {}", name)
            }
        }
    }
}

impl std::error::Error for MultipartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MultipartError::InvalidContentDisposition(e) => Some(e),
            _ => None,
        }
    }
}

/// 境界文字列を検証する (RFC 2046 の bchars、1-70 文字、末尾は空白以外)
pub fn validate_boundary(boundary: &str) -> Result<(), MultipartError> {
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
        return Err(MultipartError::InvalidBoundary);
    }
    if !boundary.bytes().all(is_bchar) || boundary.ends_with(' ') {
        return Err(MultipartError::InvalidBoundary);
    }
    Ok(())
}

fn is_bchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"'()+_,-./:=? ".contains(&b)
}

/// multipart パート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Content-Disposition
    content_disposition: Option<ContentDisposition>,
    /// Content-Type (宣言されたままの値)
    content_type: Option<String>,
    /// その他のヘッダー
    headers: Vec<(String, String)>,
    /// ボディ
    body: Vec<u8>,
}

impl Part {
    /// テキストフィールドのパートを作成
    pub fn new(name: &str) -> Self {
        Part {
            content_disposition: Some(
                ContentDisposition::new(DispositionType::FormData).with_name(name),
            ),
            content_type: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// ファイルパートを作成
    pub fn file(name: &str, filename: &str, content_type: &str) -> Self {
        Part {
            content_disposition: Some(
                ContentDisposition::new(DispositionType::FormData)
                    .with_name(name)
                    .with_filename(filename),
            ),
            content_type: Some(content_type.to_string()),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// ボディを設定
    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    /// ヘッダーを追加
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// パートの名前を取得
    pub fn name(&self) -> Option<&str> {
        self.content_disposition.as_ref()?.name()
    }

    /// ファイル名を取得
    pub fn filename(&self) -> Option<&str> {
        self.content_disposition.as_ref()?.filename()
    }

    /// Content-Disposition を取得
    pub fn content_disposition(&self) -> Option<&ContentDisposition> {
        self.content_disposition.as_ref()
    }

    /// Content-Type を取得
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Content-Disposition と Content-Type 以外のヘッダーを取得
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// ヘッダーを取得 (大文字小文字を区別しない)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// ボディを取得
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// ボディを取り出す
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// ボディを文字列として取得
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// ファイルパートかどうか (filename パラメータの有無で判定)
    pub fn is_file(&self) -> bool {
        self.filename().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    /// 最初の区切りを待機
    Initial,
    /// 区切り行の直後 (次はヘッダーブロック)
    PartStart,
    /// 終了区切りを検出
    Finished,
}

/// 区切り行の後に続くもの
enum DelimiterKind {
    /// 通常の区切り (`pos` は次のパートの先頭)
    Next { pos: usize },
    /// 終了区切り
    Close,
}

/// multipart リーダー
///
/// ボディ全体を受け取り、パートを先頭から順に返す。
#[derive(Debug, Clone)]
pub struct MultipartReader<'a> {
    body: &'a [u8],
    /// `--` + 境界
    dash_boundary: Vec<u8>,
    /// 区切り行の改行 (最初の区切り行で決まる)
    newline: &'static [u8],
    pos: usize,
    state: ReaderState,
    max_headers_count: usize,
}

impl<'a> MultipartReader<'a> {
    /// 新しいリーダーを作成
    pub fn new(body: &'a [u8], boundary: &str) -> Result<Self, MultipartError> {
        validate_boundary(boundary)?;
        let mut dash_boundary = Vec::with_capacity(boundary.len() + 2);
        dash_boundary.extend_from_slice(b"--");
        dash_boundary.extend_from_slice(boundary.as_bytes());

        Ok(MultipartReader {
            body,
            dash_boundary,
            newline: b"\r\n",
            pos: 0,
            state: ReaderState::Initial,
            max_headers_count: usize::MAX,
        })
    }

    /// パートあたりのヘッダー数の上限を設定
    pub fn with_max_headers_count(mut self, limit: usize) -> Self {
        self.max_headers_count = limit;
        self
    }

    /// 終了区切りまで読み終えたかどうか
    pub fn is_finished(&self) -> bool {
        self.state == ReaderState::Finished
    }

    /// 次のパートを取得
    ///
    /// 終了区切りに達したら `Ok(None)` を返す。
    pub fn next_part(&mut self) -> Result<Option<Part>, MultipartError> {
        if self.state == ReaderState::Initial {
            match self.find_first_delimiter()? {
                DelimiterKind::Close => {
                    self.state = ReaderState::Finished;
                }
                DelimiterKind::Next { pos } => {
                    self.pos = pos;
                    self.state = ReaderState::PartStart;
                }
            }
        }

        if self.state == ReaderState::Finished {
            return Ok(None);
        }

        let (raw_headers, body_start) = self.read_header_block(self.pos)?;
        let (body_end, next) = self.find_next_delimiter(body_start)?;
        let body = self.body[body_start..body_end].to_vec();

        match next {
            DelimiterKind::Close => self.state = ReaderState::Finished,
            DelimiterKind::Next { pos } => self.pos = pos,
        }

        build_part(raw_headers, body).map(Some)
    }

    /// 最初の区切り行を探す (preamble は読み飛ばす)
    fn find_first_delimiter(&mut self) -> Result<DelimiterKind, MultipartError> {
        let mut line_start = 0;
        loop {
            if self.body[line_start..].starts_with(&self.dash_boundary) {
                let after = line_start + self.dash_boundary.len();
                if let Some(kind) = self.classify_delimiter(after, true) {
                    return kind;
                }
            }
            match find_bytes(&self.body[line_start..], b"\n") {
                Some(i) => line_start += i + 1,
                None => return Err(MultipartError::MissingDelimiter),
            }
        }
    }

    /// `--` + 境界の直後を調べて区切り行かどうかを判定する
    ///
    /// 区切り行でなければ `None` (ボディの一部) を返す。
    /// 終了区切りの後ろは transport padding と改行 (またはボディ終端) のみ許容し、
    /// preamble 中ならその行を読み飛ばし、パートの後ならエラーにする。
    fn classify_delimiter(
        &mut self,
        after: usize,
        first: bool,
    ) -> Option<Result<DelimiterKind, MultipartError>> {
        let body = self.body;
        let rest = &body[after..];
        if let Some(tail) = rest.strip_prefix(b"--") {
            let tail = &tail[skip_padding(tail)..];
            if tail.is_empty() || tail.starts_with(b"\r\n") || tail.starts_with(b"\n") {
                return Some(Ok(DelimiterKind::Close));
            }
            if first {
                return None;
            }
            return Some(Err(MultipartError::InvalidDelimiter));
        }

        let padding = skip_padding(rest);
        let rest = &rest[padding..];
        let newline: &'static [u8] = if rest.starts_with(b"\r\n") {
            b"\r\n"
        } else if rest.starts_with(b"\n") {
            b"\n"
        } else if rest.is_empty() {
            // 区切り行の途中でボディが終わっている
            return Some(Err(MultipartError::UnterminatedPart));
        } else {
            return None;
        };

        if first {
            self.newline = newline;
        }
        Some(Ok(DelimiterKind::Next {
            pos: after + padding + newline.len(),
        }))
    }

    /// ヘッダーブロックを読み取り、(ヘッダー, ボディ開始位置) を返す
    fn read_header_block(
        &self,
        start: usize,
    ) -> Result<(Vec<(String, String)>, usize), MultipartError> {
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut line_start = start;

        loop {
            let line_len = find_bytes(&self.body[line_start..], b"\n")
                .ok_or(MultipartError::UnterminatedHeader)?;
            let line = &self.body[line_start..line_start + line_len];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            line_start += line_len + 1;

            if line.is_empty() {
                return Ok((headers, line_start));
            }

            let line = std::str::from_utf8(line).map_err(|_| MultipartError::InvalidHeader)?;

            if line.starts_with([' ', '\t']) {
                // obs-fold: 直前のヘッダー値の続き
                let (_, value) = headers.last_mut().ok_or(MultipartError::InvalidHeader)?;
                value.push(' ');
                value.push_str(line.trim());
                continue;
            }

            let (name, value) = line.split_once(':').ok_or(MultipartError::InvalidHeader)?;
            let name = name.trim();
            if name.is_empty() || name.contains([' ', '\t']) {
                return Err(MultipartError::InvalidHeader);
            }

            if headers.len() >= self.max_headers_count {
                return Err(MultipartError::TooManyHeaders {
                    count: headers.len() + 1,
                    limit: self.max_headers_count,
                });
            }
            headers.push((name.to_string(), value.trim().to_string()));
        }
    }

    /// パートのボディ終端と次の区切りを探す
    ///
    /// ボディ終端は区切り行直前の改行の位置。
    fn find_next_delimiter(
        &mut self,
        start: usize,
    ) -> Result<(usize, DelimiterKind), MultipartError> {
        // ボディのないパートでは、ヘッダーブロック終端の空行の直後に区切り行が来る
        // (空行の改行は CRLF でも LF でもよい)
        if self.body[start..].starts_with(&self.dash_boundary) {
            let after = start + self.dash_boundary.len();
            if let Some(kind) = self.classify_delimiter(after, false) {
                return kind.map(|kind| (start, kind));
            }
        }

        let mut needle = Vec::with_capacity(self.newline.len() + self.dash_boundary.len());
        needle.extend_from_slice(self.newline);
        needle.extend_from_slice(&self.dash_boundary);

        let mut search_from = start;
        while let Some(i) = find_bytes(&self.body[search_from..], &needle) {
            let found = search_from + i;
            let after = found + needle.len();
            if let Some(kind) = self.classify_delimiter(after, false) {
                return kind.map(|kind| (found, kind));
            }
            search_from = found + 1;
        }

        Err(MultipartError::UnterminatedPart)
    }
}

/// 先頭の transport padding (SP / HT) の長さ
fn skip_padding(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|b| **b == b' ' || **b == b'\t')
        .count()
}

/// 生のヘッダーからパートを組み立てる
fn build_part(raw_headers: Vec<(String, String)>, body: Vec<u8>) -> Result<Part, MultipartError> {
    let mut content_disposition = None;
    let mut content_type = None;
    let mut headers = Vec::new();

    for (name, value) in raw_headers {
        if name.eq_ignore_ascii_case("Content-Disposition") {
            let cd = ContentDisposition::parse(&value)
                .map_err(MultipartError::InvalidContentDisposition)?;
            content_disposition = Some(cd);
        } else if name.eq_ignore_ascii_case("Content-Type") {
            content_type = Some(value);
        } else {
            headers.push((name, value));
        }
    }

    Ok(Part {
        content_disposition,
        content_type,
        headers,
        body,
    })
}

/// multipart ボディビルダー
#[derive(Debug, Clone)]
pub struct MultipartBuilder {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartBuilder {
    /// 乱数値を受け取って境界を生成する
    ///
    /// Sans I/O の原則に従い、乱数生成は呼び出し側の責任となる。
    ///
    /// ```
    /// use shiguredo_form_data::multipart::MultipartBuilder;
    ///
    /// let builder = MultipartBuilder::new(12345678901234567890);
    /// assert!(builder.boundary().starts_with("----FormBoundary"));
    /// ```
    pub fn new(random_value: u64) -> Self {
        MultipartBuilder {
            boundary: format!("----FormBoundary{:016x}", random_value),
            parts: Vec::new(),
        }
    }

    /// 境界を指定して作成
    pub fn with_boundary(boundary: &str) -> Self {
        MultipartBuilder {
            boundary: boundary.to_string(),
            parts: Vec::new(),
        }
    }

    /// 境界文字列を取得
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content-Type ヘッダー値を取得
    pub fn content_type(&self) -> String {
        ContentType::new("multipart", "form-data")
            .with_parameter("boundary", &self.boundary)
            .to_string()
    }

    /// テキストフィールドを追加
    pub fn text_field(mut self, name: &str, value: &str) -> Self {
        self.parts.push(Part::new(name).with_body(value.as_bytes()));
        self
    }

    /// ファイルフィールドを追加
    pub fn file_field(
        mut self,
        name: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Self {
        self.parts
            .push(Part::file(name, filename, content_type).with_body(data));
        self
    }

    /// パートを追加
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// ボディをビルド (改行は CRLF)
    pub fn build(&self) -> Vec<u8> {
        let mut result = Vec::new();

        for part in &self.parts {
            result.extend_from_slice(b"--");
            result.extend_from_slice(self.boundary.as_bytes());
            result.extend_from_slice(b"\r\n");

            if let Some(cd) = &part.content_disposition {
                result.extend_from_slice(b"Content-Disposition: ");
                result.extend_from_slice(cd.to_string().as_bytes());
                result.extend_from_slice(b"\r\n");
            }
            if let Some(ct) = &part.content_type {
                result.extend_from_slice(b"Content-Type: ");
                result.extend_from_slice(ct.as_bytes());
                result.extend_from_slice(b"\r\n");
            }
            for (name, value) in &part.headers {
                result.extend_from_slice(name.as_bytes());
                result.extend_from_slice(b": ");
                result.extend_from_slice(value.as_bytes());
                result.extend_from_slice(b"\r\n");
            }

            result.extend_from_slice(b"\r\n");
            result.extend_from_slice(&part.body);
            result.extend_from_slice(b"\r\n");
        }

        result.extend_from_slice(b"--");
        result.extend_from_slice(self.boundary.as_bytes());
        result.extend_from_slice(b"--\r\n");

        result
    }
}

/// バイト列から部分列を検索
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }

    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
