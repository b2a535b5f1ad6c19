use crate::body::normalize_body;
use crate::boundary::extract_boundary;
use crate::error::Error;
use crate::form_data::{DEFAULT_FILE_CONTENT_TYPE, FormData, FormFile};
use crate::limits::FormDataLimits;
use crate::multipart::{MultipartError, MultipartReader, Part};
use crate::request::ProxyRequest;

/// API Gateway プロキシリクエストの multipart/form-data をデコードする
///
/// 制限なしの [`FormDataDecoder`] で [`FormDataDecoder::decode`] を呼ぶのと同じ。
///
/// ```rust
/// use shiguredo_form_data::{ProxyRequest, parse};
///
/// let request = ProxyRequest::new()
///     .header("Content-Type", "multipart/form-data; boundary=b")
///     .body("--b\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nhello\r\n--b--");
///
/// let data = parse(&request).unwrap();
/// assert_eq!(data.get("text"), Some("hello"));
/// ```
pub fn parse(request: &ProxyRequest) -> Result<FormData, Error> {
    FormDataDecoder::new().decode(request)
}

/// multipart/form-data デコーダー
///
/// 状態を持たないので、1 つのデコーダーを複数のリクエストで使い回せる。
#[derive(Debug, Clone, Default)]
pub struct FormDataDecoder {
    limits: Option<FormDataLimits>,
}

impl FormDataDecoder {
    /// 制限なしのデコーダーを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 制限付きのデコーダーを作成
    pub fn with_limits(limits: FormDataLimits) -> Self {
        Self {
            limits: Some(limits),
        }
    }

    /// 制限設定を取得
    pub fn limits(&self) -> Option<&FormDataLimits> {
        self.limits.as_ref()
    }

    /// リクエストをデコードする
    ///
    /// 境界の取り出し、base64 の復元、パートの分割と分類の順に処理し、
    /// いずれかで失敗したら部分的な結果を返さずにエラーを返す。
    pub fn decode(&self, request: &ProxyRequest) -> Result<FormData, Error> {
        let result = self.decode_inner(request);
        match &result {
            Ok(data) => log::debug!(
                "decoded multipart/form-data: fields={} files={}",
                data.fields().count(),
                data.files().count()
            ),
            Err(e) => log::debug!("failed to decode multipart/form-data: {}", e),
        }
        result
    }

    fn decode_inner(&self, request: &ProxyRequest) -> Result<FormData, Error> {
        let boundary = extract_boundary(request.headers())?;
        let body = normalize_body(&request.body, request.is_base64_encoded)?;

        let limits = self.limits.clone().unwrap_or_else(FormDataLimits::unlimited);
        if body.len() > limits.max_body_size {
            return Err(Error::BodyTooLarge {
                size: body.len(),
                limit: limits.max_body_size,
            });
        }

        let mut reader = MultipartReader::new(&body, &boundary)?
            .with_max_headers_count(limits.max_part_headers_count);
        let mut data = FormData::default();
        let mut count = 0;

        while let Some(part) = reader.next_part()? {
            count += 1;
            if count > limits.max_parts_count {
                return Err(Error::TooManyParts {
                    count,
                    limit: limits.max_parts_count,
                });
            }
            classify_part(&mut data, part)?;
        }

        Ok(data)
    }
}

/// パートをテキストフィールドかファイルに分類して登録する
///
/// filename パラメータがあればファイル、なければテキストフィールド。
/// 同じ名前が既にあれば後のパートで上書きする。
fn classify_part(data: &mut FormData, part: Part) -> Result<(), MultipartError> {
    let cd = part
        .content_disposition()
        .ok_or(MultipartError::MissingContentDisposition)?;
    if !cd.is_form_data() {
        return Err(MultipartError::UnexpectedDispositionType(
            cd.disposition_type(),
        ));
    }
    let name = cd.name().ok_or(MultipartError::MissingName)?.to_string();

    if let Some(filename) = cd.filename() {
        let filename = filename.to_string();
        let content_type = part
            .content_type()
            .unwrap_or(DEFAULT_FILE_CONTENT_TYPE)
            .to_string();
        log::trace!(
            "file part: name={} filename={} content_type={}",
            name,
            filename,
            content_type
        );
        let file = FormFile::new(&filename, &content_type, part.into_body());
        data.insert_file(name, file);
    } else {
        log::trace!("field part: name={}", name);
        let value = String::from_utf8(part.into_body())
            .map_err(|_| MultipartError::InvalidFieldValue(name.clone()))?;
        data.insert_field(name, value);
    }

    Ok(())
}
