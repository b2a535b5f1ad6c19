/// API Gateway プロキシリクエストイベント
///
/// デコードに必要なボディ、base64 フラグ、ヘッダーのみを保持する。
/// ヘッダーは大文字小文字を区別せずに扱い、同名のヘッダーは 1 つまでとする。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyRequest {
    /// ボディ (multipart 文書そのもの、またはその base64 表現)
    pub body: String,
    /// ボディが base64 エンコードされているかどうか
    pub is_base64_encoded: bool,
    /// ヘッダー
    headers: Vec<(String, String)>,
}

impl ProxyRequest {
    /// 空のリクエストを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// API Gateway プロキシイベントの JSON からリクエストを作成
    ///
    /// `body`、`isBase64Encoded`、`headers` 以外のメンバーは無視する。
    ///
    /// ```rust
    /// use shiguredo_form_data::ProxyRequest;
    ///
    /// let request = ProxyRequest::from_json(
    ///     r#"{"body": "aGVsbG8=", "isBase64Encoded": true, "headers": {"content-type": "text/plain"}}"#,
    /// ).unwrap();
    /// assert!(request.is_base64_encoded);
    /// assert_eq!(request.get_header("Content-Type"), Some("text/plain"));
    /// ```
    pub fn from_json(text: &str) -> Result<Self, nojson::JsonParseError> {
        let raw = nojson::RawJson::parse(text)?;
        Self::try_from(raw.value())
    }

    /// ボディを設定 (ビルダーパターン)
    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// base64 フラグを設定 (ビルダーパターン)
    pub fn base64_encoded(mut self, is_base64_encoded: bool) -> Self {
        self.is_base64_encoded = is_base64_encoded;
        self
    }

    /// ヘッダーを設定 (ビルダーパターン)
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// ヘッダーを設定
    ///
    /// 同名 (大文字小文字を区別しない) のヘッダーがあれば置き換える。
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(entry) => *entry = (name.to_string(), value.to_string()),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// ヘッダーを取得 (大文字小文字を区別しない)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// すべてのヘッダーを取得
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl<'text, 'raw> TryFrom<nojson::RawJsonValue<'text, 'raw>> for ProxyRequest {
    type Error = nojson::JsonParseError;

    fn try_from(value: nojson::RawJsonValue<'text, 'raw>) -> Result<Self, Self::Error> {
        let mut request = ProxyRequest::new();

        for (key, member) in value.to_object()? {
            let key = String::try_from(key)?;
            if member.kind() == nojson::JsonValueKind::Null {
                continue;
            }
            match key.as_str() {
                "body" => request.body = member.try_into()?,
                "isBase64Encoded" => request.is_base64_encoded = member.try_into()?,
                "headers" => {
                    for (name, header_value) in member.to_object()? {
                        let name = String::try_from(name)?;
                        let header_value = String::try_from(header_value)?;
                        request.set_header(&name, &header_value);
                    }
                }
                _ => {}
            }
        }

        Ok(request)
    }
}
