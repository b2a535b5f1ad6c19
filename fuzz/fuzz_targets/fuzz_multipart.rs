#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_form_data::multipart::MultipartReader;

fuzz_target!(|data: &[u8]| {
    // 様々な境界でパースを試行
    let boundaries = ["boundary", "----WebKitFormBoundary", "abc123", "---", "b"];

    for boundary in boundaries {
        let Ok(mut reader) = MultipartReader::new(data, boundary) else {
            continue;
        };

        // パニックしなければ OK
        while let Ok(Some(part)) = reader.next_part() {
            let _ = part.name();
            let _ = part.filename();
            let _ = part.content_type();
            let _ = part.headers();
            let _ = part.body_str();
            let _ = part.is_file();
            assert!(part.body().len() <= data.len());
        }
    }
});
