//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// multipart/form-data 生成 (RFC 2046, RFC 7578)
// ========================================

/// 境界文字列: bchars (1-70 文字、末尾は空白以外)
pub fn boundary() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9'()+_,./:=? -]{0,69}[a-zA-Z0-9'()+_,./:=?-]".prop_map(|s| s)
}

/// 境界文字列: 英数字のみ (本文と衝突しにくい長さ)
pub fn alnum_boundary() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{8,32}".prop_map(|s| s)
}

/// フィールド名
pub fn field_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,15}".prop_map(|s| s)
}

/// ファイル名
pub fn filename() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_ ]{1,16}\\.[a-z]{1,4}".prop_map(|s| s)
}

/// テキスト値 (改行を含む、`-` を含まない)
pub fn text_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?\r\nあいう]{0,64}".prop_map(|s| s)
}

/// 1 行のテキスト値
pub fn line_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?]{0,32}".prop_map(|s| s)
}

/// ファイルの Content-Type
pub fn file_content_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("text/plain".to_string()),
        Just("text/plain; charset=utf-8".to_string()),
        Just("application/json".to_string()),
        Just("application/octet-stream".to_string()),
        Just("image/png".to_string()),
        Just("image/jpeg".to_string()),
    ]
}

/// フォームのパート
#[derive(Debug, Clone)]
pub enum FormPart {
    Field {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: String,
        content: Vec<u8>,
    },
}

/// フォームのパート (ファイルの内容は任意のバイト列)
pub fn form_part() -> impl Strategy<Value = FormPart> {
    prop_oneof![
        (field_name(), text_value()).prop_map(|(name, value)| FormPart::Field { name, value }),
        (
            field_name(),
            filename(),
            file_content_type(),
            proptest::collection::vec(any::<u8>(), 0..128)
        )
            .prop_map(|(name, filename, content_type, content)| FormPart::File {
                name,
                filename,
                content_type,
                content,
            }),
    ]
}
