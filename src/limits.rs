/// フォームデータの最大サイズ (10MB)
pub const MAX_FORM_DATA_SIZE: usize = 10 << 20;

/// デコーダーの制限設定
///
/// 制限は明示的に設定した場合のみ適用される。
/// [`FormDataDecoder::new`](crate::FormDataDecoder::new) は制限なしで動作する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDataLimits {
    /// 最大ボディサイズ (base64 デコード後、デフォルト: 10MB)
    pub max_body_size: usize,
    /// 最大パート数 (デフォルト: 1000)
    pub max_parts_count: usize,
    /// パートあたりの最大ヘッダー数 (デフォルト: 100)
    pub max_part_headers_count: usize,
}

impl Default for FormDataLimits {
    fn default() -> Self {
        Self {
            max_body_size: MAX_FORM_DATA_SIZE,
            max_parts_count: 1000,
            max_part_headers_count: 100,
        }
    }
}

impl FormDataLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_body_size: usize::MAX,
            max_parts_count: usize::MAX,
            max_part_headers_count: usize::MAX,
        }
    }
}
