#![no_main]

use std::io::Read;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_form_data::{FormDataDecoder, FormDataLimits, ProxyRequest};

#[derive(Arbitrary, Debug)]
struct FuzzRequest {
    content_type: String,
    body: String,
    is_base64_encoded: bool,
    max_body_size: u16,
    max_parts_count: u8,
    max_part_headers_count: u8,
}

fuzz_target!(|input: FuzzRequest| {
    let request = ProxyRequest::new()
        .header("Content-Type", &input.content_type)
        .body(&input.body)
        .base64_encoded(input.is_base64_encoded);

    let limits = FormDataLimits {
        max_body_size: input.max_body_size as usize,
        max_parts_count: input.max_parts_count as usize,
        max_part_headers_count: input.max_part_headers_count as usize,
    };

    for decoder in [FormDataDecoder::new(), FormDataDecoder::with_limits(limits)] {
        let Ok(mut data) = decoder.decode(&request) else {
            continue;
        };

        let names: Vec<String> = data.files().map(|(name, _)| name.to_string()).collect();
        for (name, _) in data.fields() {
            assert!(data.file(name).is_none());
        }
        for name in names {
            if let Some(file) = data.file_mut(&name) {
                let mut content = Vec::new();
                let _ = file.read_to_end(&mut content);
                assert_eq!(content.len(), file.len());
            }
        }
    }
});
