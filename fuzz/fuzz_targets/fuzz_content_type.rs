#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_form_data::content_type::ContentType;

fuzz_target!(|data: &[u8]| {
    // UTF-8 文字列として解釈できる場合のみテスト
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(ct) = ContentType::parse(s) {
            let _ = ct.mime_type();
            let _ = ct.parameters();
            let _ = ct.is_multipart();
            let _ = ct.is_form_data();

            // Display 出力は再パースできて同じ値になる
            let displayed = ct.to_string();
            let reparsed = ContentType::parse(&displayed).unwrap();
            assert_eq!(ct.media_type(), reparsed.media_type());
            assert_eq!(ct.subtype(), reparsed.subtype());
            assert_eq!(ct.boundary(), reparsed.boundary());
        }
    }
});
