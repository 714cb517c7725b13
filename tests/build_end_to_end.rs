// tests/build_end_to_end.rs

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use sitepipe::dag::TaskRegistry;
use sitepipe::errors::SitepipeError;
use sitepipe::fs::FileSystem;
use sitepipe::run_once;
use sitepipe_test_utils::fake_tools::FakeToolRunner;
use sitepipe_test_utils::fixtures::{SITE_ROOT, context, dev, site_fixture};
use sitepipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn build_runs_every_pipeline_then_jekyll() -> TestResult {
    init_tracing();
    let fs = site_fixture();
    fs.add_file(Path::new(SITE_ROOT).join("_site/stale.html"), "old");
    let tools = FakeToolRunner::passthrough();
    let ctx = Arc::new(context(&fs, &tools, dev()));
    let registry = Arc::new(TaskRegistry::standard()?);

    with_timeout(run_once(ctx, registry, "build")).await?;

    let root = Path::new(SITE_ROOT);
    assert!(!fs.is_file(&root.join("_site/stale.html")));
    for out in ["main.css", "main.js", "font/fontello.woff", "images/hero-cropped_320.jpg"] {
        assert!(fs.is_file(&root.join(out)), "{out} missing");
        assert!(fs.is_file(&root.join("_site").join(out)), "_site/{out} missing");
    }

    let lines = tools.command_lines();
    assert_eq!(lines.last().map(|l| l.starts_with("bundle exec jekyll build")), Some(true));
    assert_eq!(lines.iter().filter(|l| l.starts_with("sass ")).count(), 1);
    Ok(())
}

#[tokio::test]
async fn failing_tool_fails_the_run() -> TestResult {
    init_tracing();
    let fs = site_fixture();
    let tools = FakeToolRunner::failing("sass", 1);
    let ctx = Arc::new(context(&fs, &tools, dev()));
    let registry = Arc::new(TaskRegistry::standard()?);

    let err = with_timeout(run_once(ctx, registry, "build")).await.unwrap_err();
    assert!(matches!(err, SitepipeError::TaskFailed(msg) if msg.contains("build:styles")));

    // Jekyll never ran.
    assert!(!tools.command_lines().iter().any(|l| l.contains("jekyll")));
    Ok(())
}
