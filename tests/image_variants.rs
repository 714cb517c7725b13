// tests/image_variants.rs

use std::collections::HashSet;
use std::error::Error;
use std::path::Path;

use proptest::prelude::*;
use sitepipe::config::ImageSource;
use sitepipe::errors::SitepipeError;
use sitepipe::pipeline::images::{build_images, pixel_width, variants};
use sitepipe::types::{ImageFormat, MissingImagePolicy};
use sitepipe_test_utils::fake_tools::FakeToolRunner;
use sitepipe_test_utils::fixtures::{context, context_with, dev, site_fixture, SITE_ROOT};
use sitepipe_test_utils::init_tracing;
use sitepipe::config::BuildConfig;
use sitepipe::fs::FileSystem;

type TestResult = Result<(), Box<dyn Error>>;

fn format_strategy() -> impl Strategy<Value = Vec<ImageFormat>> {
    proptest::sample::subsequence(vec![ImageFormat::Jpg, ImageFormat::Png, ImageFormat::Webp], 1..=3)
}

proptest! {
    #[test]
    fn variants_are_the_full_cross_product(
        widths in proptest::collection::btree_set(1u32..4000, 1..6),
        formats in format_strategy(),
        scale in 0.5f64..2.0,
    ) {
        let widths: Vec<u32> = widths.into_iter().collect();
        let source = ImageSource::new("hero", "jpg", &widths, &formats, 80, scale);
        let v = variants(&source);

        prop_assert_eq!(v.len(), widths.len() * formats.len());

        let names: HashSet<&str> = v.iter().map(|x| x.file_name.as_str()).collect();
        prop_assert_eq!(names.len(), v.len());

        for w in widths.iter() {
            for f in formats.iter() {
                let name = format!("hero_{}.{}", w, f.extension());
                prop_assert!(names.contains(name.as_str()));
            }
        }
        for x in v.iter() {
            prop_assert_eq!(x.pixel_width, pixel_width(x.width, scale));
            prop_assert_eq!(x.quality, 80);
        }
    }
}

fn count(fs: &sitepipe::fs::mock::MockFileSystem, dir: &str) -> usize {
    fs.files_under(Path::new(SITE_ROOT).join(dir)).len()
}

#[tokio::test]
async fn default_table_writes_every_variant_to_both_dirs() -> TestResult {
    init_tracing();
    let fs = site_fixture();
    let tools = FakeToolRunner::passthrough();
    let ctx = context(&fs, &tools, dev());

    build_images(&ctx).await?;

    // 5 + 2*2 + 3*2 + 3*2 + 2
    assert_eq!(count(&fs, "images"), 23);
    assert_eq!(count(&fs, "_site/images"), 23);
    assert!(fs.is_file(&Path::new(SITE_ROOT).join("images/hero-cropped_1440.jpg")));
    assert!(fs.is_file(&Path::new(SITE_ROOT).join("_site/images/FrontendMastersClassroom_1500.webp")));
    assert!(fs.is_file(&Path::new(SITE_ROOT).join("images/AngularComponents_490.png")));
    assert!(!fs.files_under(Path::new(SITE_ROOT).join("images")).iter().any(|p| p.to_string_lossy().starts_with("unlisted")));
    assert!(tools.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_source_fails_by_default() -> TestResult {
    let fs = site_fixture();
    fs.remove_file(&Path::new(SITE_ROOT).join("_app/images/hero-cropped.jpg"))?;
    let ctx = context(&fs, &FakeToolRunner::passthrough(), dev());

    let err = build_images(&ctx).await.unwrap_err();
    assert!(matches!(err, SitepipeError::MissingImage(name) if name == "hero-cropped.jpg"));
    Ok(())
}

#[tokio::test]
async fn missing_source_is_skipped_with_warn_policy() -> TestResult {
    let fs = site_fixture();
    fs.remove_file(&Path::new(SITE_ROOT).join("_app/images/hero-cropped.jpg"))?;
    let mut config = BuildConfig::from_flags(SITE_ROOT, dev());
    config.images.missing_source = MissingImagePolicy::Warn;
    let ctx = context_with(&fs, &FakeToolRunner::passthrough(), config);

    build_images(&ctx).await?;
    assert_eq!(count(&fs, "images"), 18);
    Ok(())
}

#[tokio::test]
async fn source_with_a_different_extension_does_not_count() -> TestResult {
    let fs = site_fixture();
    let root = Path::new(SITE_ROOT);
    fs.remove_file(&root.join("_app/images/AngularComponents.png"))?;
    fs.add_file(
        root.join("_app/images/AngularComponents.jpg"),
        sitepipe_test_utils::fixtures::jpeg_bytes(24, 24),
    );
    let ctx = context(&fs, &FakeToolRunner::passthrough(), dev());

    let err = build_images(&ctx).await.unwrap_err();
    assert!(matches!(err, SitepipeError::MissingImage(name) if name == "AngularComponents.png"));
    assert!(!fs.is_file(&root.join("images/AngularComponents_490.png")));
    Ok(())
}

#[tokio::test]
async fn configured_extension_is_picked_among_same_named_files() -> TestResult {
    let fs = site_fixture();
    let root = Path::new(SITE_ROOT);
    // Not an image; decoding it would fail the build.
    fs.add_file(root.join("_app/images/AngularComponents.jpg"), "not an image");
    let ctx = context(&fs, &FakeToolRunner::passthrough(), dev());

    build_images(&ctx).await?;
    assert!(fs.is_file(&root.join("images/AngularComponents_490.png")));
    Ok(())
}
