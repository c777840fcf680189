//! Derivative token and address tests
//!
//! Tokens are cache keys: identical normalized options must always produce
//! byte-identical tokens, and the grammar must not drift.

use std::sync::Arc;

use aerodoc::derivative::{DerivativeAddressResolver, OptionsCodec, TransformOptions, UrlSettings};
use aerodoc::document::{Document, MimeCatalog, Visibility};
use aerodoc::AeroDocConfig;

// =============================================================================
// Test Utilities
// =============================================================================

fn resolver(config: &AeroDocConfig) -> DerivativeAddressResolver {
    DerivativeAddressResolver::new(UrlSettings::from(config), Arc::new(MimeCatalog::default()))
}

fn jpeg(filename: &str) -> Document {
    let mut doc = Document::new(filename, "9c1d0e2f", Visibility::Public);
    doc.mime_type = Some("image/jpeg".to_string());
    doc
}

// =============================================================================
// Token Grammar
// =============================================================================

#[test]
fn test_documented_tokens() {
    let cases = [
        (TransformOptions::new().width(300).quality(90), "w300-q90"),
        (TransformOptions::new().fit("600x400").quality(70), "f600x400-q70"),
        (
            TransformOptions::new().crop("100x200").grayscale(true).quality(80),
            "c100x200-g1-q80",
        ),
    ];
    for (options, expected) in cases {
        assert_eq!(OptionsCodec::encode(&options.normalize()), expected);
    }
}

#[test]
fn test_token_is_stable_across_equal_inputs() {
    let build = || {
        TransformOptions::new()
            .width(640)
            .rotate(450)
            .background("#00ff00")
            .align("bottom-right")
    };
    let a = OptionsCodec::encode(&build().normalize());
    let b = OptionsCodec::encode(&build().normalize());
    assert_eq!(a, b);
    assert_eq!(a, "w640-r90-b00ff00-abottomright");
}

#[test]
fn test_values_never_contain_separator() {
    let options = TransformOptions::new()
        .flip("h-v")
        .align("top - left")
        .background("#ff-00-ff");
    let token = OptionsCodec::encode(&options.normalize());
    assert_eq!(token.split('-').count(), 3);
}

// =============================================================================
// Address Resolution
// =============================================================================

#[test]
fn test_configured_prefixes() {
    let mut config = AeroDocConfig::default();
    config.derivative_base_url = "/media/cache".to_string();
    config.absolute_host = Some("https://img.example.org".to_string());
    let resolver = resolver(&config);
    let options = TransformOptions::new().width(300).quality(90).normalize();

    assert_eq!(
        resolver.resolve(&jpeg("cat.jpg"), &options, false).unwrap(),
        "/media/cache/w300-q90/9c1d0e2f/cat.jpg"
    );
    assert_eq!(
        resolver.resolve(&jpeg("cat.jpg"), &options, true).unwrap(),
        "https://img.example.org/media/cache/w300-q90/9c1d0e2f/cat.jpg"
    );
}

#[test]
fn test_no_process_ignores_every_option() {
    let resolver = resolver(&AeroDocConfig::default());
    let doc = jpeg("cat.jpg");
    let variants = [
        TransformOptions::new().no_process(true),
        TransformOptions::new().no_process(true).width(10),
        TransformOptions::new().no_process(true).fit("1x1").blur(9).grayscale(true),
    ];

    let urls: Vec<String> = variants
        .iter()
        .map(|o| resolver.resolve(&doc, &o.normalize(), false).unwrap())
        .collect();
    assert!(urls.iter().all(|u| u == "/files/9c1d0e2f/cat.jpg"));
}

#[test]
fn test_svg_is_served_as_original() {
    let resolver = resolver(&AeroDocConfig::default());
    let mut doc = Document::new("logo.svg", "9c1d0e2f", Visibility::Public);
    doc.mime_type = Some("image/svg+xml".to_string());
    let options = TransformOptions::new().width(64).normalize();

    assert_eq!(
        resolver.resolve(&doc, &options, false).unwrap(),
        "/files/9c1d0e2f/logo.svg"
    );
}
