//! # shiguredo_form_data
//!
//! API Gateway プロキシリクエストの multipart/form-data デコードライブラリ (Sans I/O)
//!
//! ## 特徴
//!
//! - **Sans I/O**: リクエストイベントを受け取り、デコード結果を返すだけ
//! - **base64 対応**: `isBase64Encoded` が立っているボディを復元してから読み取る
//! - **RFC 準拠**: RFC 2046 / RFC 7578 の区切り行、preamble、epilogue を扱う
//!
//! ## 使い方
//!
//! ```rust
//! use std::io::Read;
//!
//! use shiguredo_form_data::{ProxyRequest, parse};
//!
//! let body = "--boundary\r\n\
//!     Content-Disposition: form-data; name=\"text\"\r\n\r\n\
//!     text default\r\n\
//!     --boundary\r\n\
//!     Content-Disposition: form-data; name=\"file\"; filename=\"file.txt\"\r\n\
//!     Content-Type: text/plain\r\n\r\n\
//!     Hello World\r\n\
//!     --boundary--\r\n";
//!
//! let request = ProxyRequest::new()
//!     .header("Content-Type", "multipart/form-data; boundary=boundary")
//!     .body(body);
//!
//! let mut data = parse(&request).unwrap();
//! assert_eq!(data.get("text"), Some("text default"));
//!
//! let file = data.file_mut("file").unwrap();
//! assert_eq!(file.filename(), "file.txt");
//! assert_eq!(file.content_type(), "text/plain");
//!
//! let mut content = String::new();
//! file.read_to_string(&mut content).unwrap();
//! assert_eq!(content, "Hello World");
//! ```
//!
//! ### 制限付きでデコード
//!
//! ```rust
//! use shiguredo_form_data::{Error, FormDataDecoder, FormDataLimits, ProxyRequest};
//!
//! let request = ProxyRequest::new()
//!     .header("Content-Type", "multipart/form-data; boundary=b")
//!     .body("--b\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--b--");
//!
//! let decoder = FormDataDecoder::with_limits(FormDataLimits {
//!     max_parts_count: 0,
//!     ..FormDataLimits::default()
//! });
//! assert_eq!(
//!     decoder.decode(&request),
//!     Err(Error::TooManyParts { count: 1, limit: 0 })
//! );
//! ```

mod body;
mod boundary;
pub mod content_disposition;
pub mod content_type;
mod decoder;
mod error;
mod form_data;
mod limits;
pub mod multipart;
mod request;

pub use body::normalize_body;
pub use boundary::extract_boundary;
pub use decoder::{FormDataDecoder, parse};
pub use error::Error;
pub use form_data::{DEFAULT_FILE_CONTENT_TYPE, FormData, FormFile};
pub use limits::{FormDataLimits, MAX_FORM_DATA_SIZE};
pub use request::ProxyRequest;
