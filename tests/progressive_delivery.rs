//! End-to-end tests for `/images/{id}`.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgb};
use progressive_edge::variant::{Derivation, DeriveError, VariantDeriver, VariantFormat, VariantSpec};
use reqwest::header::CONTENT_TYPE;

mod common;

use common::{client, config_for, parse_parts, start_edge, start_mock_origin, OriginReply};

/// Deriver returning `len` bytes of 'v', checking the fixed parameters.
fn fixed_deriver(len: usize, calls: Arc<AtomicUsize>) -> Arc<dyn VariantDeriver> {
    Arc::new(move |_: &[u8], spec: &VariantSpec| -> Result<Derivation, DeriveError> {
        calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(spec.width, 150);
        assert_eq!(spec.format, VariantFormat::WebP);
        assert_eq!(spec.quality.get(), 0.5);
        Ok(Derivation::Derived(Bytes::from(vec![b'v'; len])))
    })
}

fn declining_deriver() -> Arc<dyn VariantDeriver> {
    Arc::new(|_: &[u8], _: &VariantSpec| -> Result<Derivation, DeriveError> { Ok(Derivation::Declined) })
}

fn fake_jpeg() -> Vec<u8> {
    (0..900u32).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_variant_then_original() {
    let origin = start_mock_origin(|path| {
        assert_eq!(path, "/images/icon2.jpg");
        OriginReply::ok("image/jpeg", fake_jpeg())
    })
    .await;
    let calls = Arc::new(AtomicUsize::new(0));
    let edge = start_edge(config_for(&origin), fixed_deriver(120, calls.clone())).await;

    let res = client().get(edge.url("/images/icon2.jpg")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()[CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );
    let body = res.bytes().await.unwrap();
    let parts = parse_parts(&body);

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].content_type, "image/webp");
    assert_eq!(parts[0].content_length, 120);
    assert_eq!(parts[0].payload, vec![b'v'; 120]);
    assert_eq!(parts[1].content_type, "image/jpeg");
    assert_eq!(parts[1].content_length, 900);
    assert_eq!(parts[1].payload, fake_jpeg());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_oversized_variant_still_streams_first() {
    let origin = start_mock_origin(|_| OriginReply::ok("image/jpeg", vec![3u8; 40])).await;
    let edge = start_edge(config_for(&origin), fixed_deriver(400, Arc::default())).await;

    let res = client().get(edge.url("/images/tiny.jpg")).send().await.unwrap();
    let parts = parse_parts(&res.bytes().await.unwrap());

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].content_length, 400);
    assert_eq!(parts[1].content_length, 40);
}

#[tokio::test]
async fn test_head_returns_progressive_headers_only() {
    let origin = start_mock_origin(|_| OriginReply::ok("image/jpeg", fake_jpeg())).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let edge = start_edge(config_for(&origin), fixed_deriver(120, calls.clone())).await;

    let res = client().head(edge.url("/images/icon2.jpg")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()[CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );
    assert!(res.bytes().await.unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_boundary_is_consistent() {
    let origin = start_mock_origin(|_| OriginReply::ok("image/png", vec![7u8; 64])).await;
    let edge = start_edge(config_for(&origin), fixed_deriver(16, Arc::default())).await;

    let res = client().get(edge.url("/images/a.png")).send().await.unwrap();
    let content_type = res.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .expect("boundary parameter")
        .to_string();

    let body = res.bytes().await.unwrap();
    for part in parse_parts(&body) {
        assert_eq!(part.delimiter, format!("--{}", boundary));
        assert_eq!(part.payload.len(), part.content_length);
    }
}

#[tokio::test]
async fn test_declined_derivation_serves_plain_original() {
    let origin = start_mock_origin(|_| OriginReply::ok("image/svg+xml", b"<svg/>".to_vec())).await;
    let edge = start_edge(config_for(&origin), declining_deriver()).await;

    let res = client().get(edge.url("/images/logo.svg")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()[CONTENT_TYPE], "image/svg+xml");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"<svg/>");
}

#[tokio::test]
async fn test_declined_derivation_keeps_upstream_status() {
    let origin = start_mock_origin(|_| OriginReply {
        status: 203,
        content_type: Some("image/svg+xml"),
        body: b"<svg/>".to_vec(),
    })
    .await;
    let edge = start_edge(config_for(&origin), declining_deriver()).await;

    let res = client().get(edge.url("/images/logo.svg")).send().await.unwrap();

    assert_eq!(res.status(), 203);
    assert_eq!(res.headers()[CONTENT_TYPE], "image/svg+xml");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"<svg/>");
}

#[tokio::test]
async fn test_upstream_failures_are_relayed() {
    let origin = start_mock_origin(|path| match path {
        "/images/missing.jpg" => OriginReply::status(404, "no such image"),
        _ => OriginReply::status(500, "origin exploded"),
    })
    .await;
    let calls = Arc::new(AtomicUsize::new(0));
    let edge = start_edge(config_for(&origin), fixed_deriver(10, calls.clone())).await;

    let res = client().get(edge.url("/images/missing.jpg")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/plain");
    assert_eq!(res.text().await.unwrap(), "no such image");

    let res = client().get(edge.url("/images/broken.jpg")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let body = res.text().await.unwrap();
    assert_eq!(body, "origin exploded");
    assert!(!body.contains("--frame"));

    assert_eq!(calls.load(Ordering::SeqCst), 0, "no derivation on upstream failure");
}

#[tokio::test]
async fn test_derivation_error_is_a_clean_500() {
    let origin = start_mock_origin(|_| OriginReply::ok("image/jpeg", fake_jpeg())).await;
    let deriver: Arc<dyn VariantDeriver> =
        Arc::new(|_: &[u8], spec: &VariantSpec| -> Result<Derivation, DeriveError> {
            Err(DeriveError::Encode {
                format: spec.format,
                reason: "encoder unavailable".into(),
            })
        });
    let edge = start_edge(config_for(&origin), deriver).await;

    let res = client().get(edge.url("/images/icon2.jpg")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    assert_ne!(res.headers()[CONTENT_TYPE], "multipart/x-mixed-replace; boundary=frame");
}

#[tokio::test]
async fn test_missing_content_type_is_bad_gateway() {
    let origin = start_mock_origin(|_| OriginReply {
        status: 200,
        content_type: None,
        body: fake_jpeg(),
    })
    .await;
    let edge = start_edge(config_for(&origin), fixed_deriver(10, Arc::default())).await;

    let res = client().get(edge.url("/images/icon2.jpg")).send().await.unwrap();
    assert_eq!(res.status(), 502);
}

#[tokio::test]
async fn test_unreachable_origin_is_bad_gateway() {
    let origin = start_mock_origin(|_| OriginReply::ok("image/jpeg", vec![1])).await;
    let mut config = config_for(&origin);
    config.origin.base_url = "http://127.0.0.1:9/images/".into();
    let edge = start_edge(config, fixed_deriver(10, Arc::default())).await;

    let res = client().get(edge.url("/images/icon2.jpg")).send().await.unwrap();
    assert_eq!(res.status(), 502);
}

#[tokio::test]
async fn test_traversal_is_rejected_before_fetch() {
    let origin = start_mock_origin(|_| OriginReply::ok("image/jpeg", vec![1])).await;
    let edge = start_edge(config_for(&origin), fixed_deriver(10, Arc::default())).await;

    for path in ["/images/..%2Fsecret", "/images/%252e%252e", "/images/a%3Fb", "/images/a%5Cb"] {
        let res = client().get(edge.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 400, "path {path}");
    }
    assert_eq!(origin.hits(), 0);
}

#[tokio::test]
async fn test_repeated_requests_are_byte_identical() {
    let origin = start_mock_origin(|_| OriginReply::ok("image/jpeg", fake_jpeg())).await;
    let edge = start_edge(config_for(&origin), fixed_deriver(120, Arc::default())).await;

    let first = client().get(edge.url("/images/icon2.jpg")).send().await.unwrap().bytes().await.unwrap();
    let second = client().get(edge.url("/images/icon2.jpg")).send().await.unwrap().bytes().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(origin.hits(), 2, "cache disabled: both requests reach the origin");
}

#[tokio::test]
async fn test_cache_serves_repeat_requests() {
    let origin = start_mock_origin(|_| OriginReply::ok("image/jpeg", fake_jpeg())).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let mut config = config_for(&origin);
    config.cache.enabled = true;
    let edge = start_edge(config, fixed_deriver(120, calls.clone())).await;

    let first = client().get(edge.url("/images/icon2.jpg")).send().await.unwrap().bytes().await.unwrap();
    let second = client().get(edge.url("/images/icon2.jpg")).send().await.unwrap().bytes().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(origin.hits(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_raster_deriver_end_to_end() {
    let buffer = ImageBuffer::from_fn(300, 200, |x, y| Rgb([x as u8, y as u8, 90u8]));
    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut png, ImageFormat::Png)
        .unwrap();
    let png = png.into_inner();
    let served = png.clone();

    let origin = start_mock_origin(move |_| OriginReply::ok("image/png", served.clone())).await;
    let edge = start_edge(
        config_for(&origin),
        Arc::new(progressive_edge::variant::RasterDeriver::new()),
    )
    .await;

    let res = client().get(edge.url("/images/photo.png")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body = res.bytes().await.unwrap();
    let parts = parse_parts(&body);

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].content_type, "image/webp");
    let variant = image::load_from_memory(&parts[0].payload).unwrap();
    assert_eq!(variant.dimensions(), (150, 100));
    assert_eq!(parts[1].content_type, "image/png");
    assert_eq!(parts[1].payload, png);
}
