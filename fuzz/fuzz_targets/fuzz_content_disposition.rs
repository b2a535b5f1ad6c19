#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_form_data::content_disposition::ContentDisposition;

fuzz_target!(|data: &[u8]| {
    // UTF-8 文字列として解釈できる場合のみテスト
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(cd) = ContentDisposition::parse(s) {
            let _ = cd.disposition_type();
            let _ = cd.is_form_data();
            let _ = cd.parameter("filename*");

            // ラウンドトリップ
            if let Ok(reparsed) = ContentDisposition::parse(&cd.to_string()) {
                assert_eq!(cd.disposition_type(), reparsed.disposition_type());
                assert_eq!(cd.name(), reparsed.name());
                assert_eq!(cd.filename(), reparsed.filename());
            }
        }
    }
});
