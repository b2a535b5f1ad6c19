//! API Gateway プロキシリクエストのデコードのプロパティテスト

use std::collections::HashMap;
use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pbt::{FormPart, alnum_boundary, field_name, form_part, text_value};
use proptest::prelude::*;
use shiguredo_form_data::multipart::MultipartBuilder;
use shiguredo_form_data::{
    Error, FormDataDecoder, FormDataLimits, ProxyRequest, extract_boundary, normalize_body, parse,
};

fn build(boundary: &str, parts: &[FormPart]) -> Vec<u8> {
    parts
        .iter()
        .fold(MultipartBuilder::with_boundary(boundary), |b, part| match part {
            FormPart::Field { name, value } => b.text_field(name, value),
            FormPart::File {
                name,
                filename,
                content_type,
                content,
            } => b.file_field(name, filename, content_type, content),
        })
        .build()
}

fn base64_request(boundary: &str, body: &[u8]) -> ProxyRequest {
    ProxyRequest::new()
        .header(
            "Content-Type",
            &format!("multipart/form-data; boundary={}", boundary),
        )
        .body(&STANDARD.encode(body))
        .base64_encoded(true)
}

// デコード結果は「後勝ち」で名前ごとに 1 つだけ残る
proptest! {
    #[test]
    fn decoded_matches_last_write_wins_model(
        boundary in alnum_boundary(),
        parts in proptest::collection::vec(form_part(), 0..10)
    ) {
        let body = build(&boundary, &parts);
        let data = parse(&base64_request(&boundary, &body)).unwrap();

        let mut fields: HashMap<&str, &str> = HashMap::new();
        let mut files: HashMap<&str, &FormPart> = HashMap::new();
        for part in &parts {
            match part {
                FormPart::Field { name, value } => {
                    files.remove(name.as_str());
                    fields.insert(name.as_str(), value.as_str());
                }
                FormPart::File { name, .. } => {
                    fields.remove(name.as_str());
                    files.insert(name.as_str(), part);
                }
            }
        }

        prop_assert_eq!(data.len(), fields.len() + files.len());
        for (name, value) in &fields {
            prop_assert_eq!(data.get(name), Some(*value));
            prop_assert!(data.file(name).is_none());
        }
        for (name, part) in &files {
            let FormPart::File { filename, content_type, content, .. } = part else {
                unreachable!();
            };
            let file = data.file(name).unwrap();
            prop_assert_eq!(file.filename(), filename.as_str());
            prop_assert_eq!(file.content_type(), content_type.as_str());
            prop_assert_eq!(file.content(), content.as_slice());
            prop_assert!(data.get(name).is_none());
        }
    }
}

// テキストだけのボディは base64 の有無で結果が変わらない
proptest! {
    #[test]
    fn base64_transport_is_transparent(
        boundary in alnum_boundary(),
        fields in proptest::collection::vec((field_name(), text_value()), 0..6)
    ) {
        let parts: Vec<FormPart> = fields
            .into_iter()
            .map(|(name, value)| FormPart::Field { name, value })
            .collect();
        let body = build(&boundary, &parts);

        let encoded = base64_request(&boundary, &body);
        let plain = encoded
            .clone()
            .body(std::str::from_utf8(&body).unwrap())
            .base64_encoded(false);

        prop_assert_eq!(parse(&plain).unwrap(), parse(&encoded).unwrap());
    }
}

// 読み取りを分割しても内容は同じ
proptest! {
    #[test]
    fn file_read_in_chunks(
        boundary in alnum_boundary(),
        content in proptest::collection::vec(any::<u8>(), 0..512),
        chunk in 1usize..64
    ) {
        let body = MultipartBuilder::with_boundary(&boundary)
            .file_field("f", "f.bin", "application/octet-stream", &content)
            .build();
        let mut data = parse(&base64_request(&boundary, &body)).unwrap();
        let file = data.file_mut("f").unwrap();

        let mut out = Vec::new();
        let mut buf = vec![0u8; chunk];
        loop {
            let n = file.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            prop_assert!(n <= chunk);
            out.extend_from_slice(&buf[..n]);
        }
        prop_assert_eq!(&out, &content);
        prop_assert_eq!(file.position(), content.len());
        prop_assert_eq!(file.read(&mut buf).unwrap(), 0);
    }
}

// base64 の復元はエンコードの逆
proptest! {
    #[test]
    fn normalize_body_inverts_base64(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let encoded = STANDARD.encode(&data);
        let decoded = normalize_body(&encoded, true).unwrap();
        prop_assert_eq!(&*decoded, data.as_slice());
    }
}

// 生のボディはそのまま返る
proptest! {
    #[test]
    fn normalize_body_passthrough(body in "\\PC{0,64}") {
        let normalized = normalize_body(&body, false).unwrap();
        prop_assert_eq!(&*normalized, body.as_bytes());
    }
}

// ヘッダー名の大文字小文字に関係なく境界を取り出せる
proptest! {
    #[test]
    fn extract_boundary_any_case(
        boundary in alnum_boundary(),
        name in prop_oneof![Just("content-type"), Just("Content-Type"), Just("CONTENT-TYPE"), Just("cOnTeNt-TyPe")]
    ) {
        let headers = vec![
            ("Host".to_string(), "example.com".to_string()),
            (name.to_string(), format!("multipart/form-data; boundary={}", boundary)),
        ];
        prop_assert_eq!(extract_boundary(&headers).unwrap(), boundary);
    }
}

// 境界パラメータのない Content-Type はエラー
proptest! {
    #[test]
    fn extract_boundary_without_parameter(
        media_type in prop_oneof![
            Just("application/json"),
            Just("text/plain; charset=utf-8"),
            Just("multipart/form-data"),
            Just("application/x-www-form-urlencoded"),
        ]
    ) {
        let headers = vec![("Content-Type".to_string(), media_type.to_string())];
        prop_assert!(matches!(
            extract_boundary(&headers),
            Err(Error::InvalidContentTypeHeader(_))
        ));
    }
}

// 制限を超えるパート数はエラー
proptest! {
    #[test]
    fn parts_count_limit(
        boundary in alnum_boundary(),
        count in 1usize..12,
        limit in 0usize..12
    ) {
        let parts: Vec<FormPart> = (0..count)
            .map(|i| FormPart::Field { name: format!("f{}", i), value: "v".to_string() })
            .collect();
        let body = build(&boundary, &parts);
        let decoder = FormDataDecoder::with_limits(FormDataLimits {
            max_parts_count: limit,
            ..FormDataLimits::default()
        });

        let result = decoder.decode(&base64_request(&boundary, &body));
        if count > limit {
            prop_assert_eq!(result, Err(Error::TooManyParts { count: limit + 1, limit }));
        } else {
            prop_assert_eq!(result.unwrap().len(), count);
        }
    }
}

// 任意のボディでパニックしない
proptest! {
    #[test]
    fn arbitrary_body_no_panic(
        body in "\\PC{0,256}",
        is_base64_encoded in any::<bool>()
    ) {
        let request = ProxyRequest::new()
            .header("Content-Type", "multipart/form-data; boundary=b")
            .body(&body)
            .base64_encoded(is_base64_encoded);
        let _ = parse(&request);
    }
}
