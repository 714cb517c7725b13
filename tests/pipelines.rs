// tests/pipelines.rs

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use sitepipe::config::BuildFlags;
use sitepipe::dag::{CleanTarget, TaskAction};
use sitepipe::errors::SitepipeError;
use sitepipe::fs::FileSystem;
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::pipeline::{PipelineContext, run_action};
use sitepipe::serve::{ReloadEvent, ReloadHub};
use sitepipe_test_utils::fake_tools::FakeToolRunner;
use sitepipe_test_utils::fixtures::{SITE_ROOT, context, dev, production, site_fixture};
use sitepipe_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn at(rel: &str) -> PathBuf {
    Path::new(SITE_ROOT).join(rel)
}

fn read(fs: &MockFileSystem, rel: &str) -> String {
    fs.read_to_string(&at(rel)).unwrap()
}

#[tokio::test]
async fn dev_styles_are_expanded_prefixed_and_written_twice() -> TestResult {
    init_tracing();
    let fs = site_fixture();
    let tools = FakeToolRunner::passthrough();
    let hub = ReloadHub::new();
    let mut reloads = hub.subscribe();
    let ctx = context(&fs, &tools, dev()).with_reload(hub);

    run_action(TaskAction::Styles, &ctx).await?;

    let calls = tools.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].argv.contains(&"--style=expanded".to_string()));
    assert_eq!(calls[0].cwd, PathBuf::from(SITE_ROOT));
    assert_eq!(calls[1].argv[..2], ["npx".to_string(), "postcss".to_string()]);
    assert_eq!(calls[1].stdin.as_deref(), Some(&b"/* sass */"[..]));

    assert_eq!(read(&fs, "main.css"), "/* sass */");
    assert_eq!(read(&fs, "_site/main.css"), "/* sass */");
    assert_eq!(reloads.try_recv()?, ReloadEvent::Css);
    Ok(())
}

#[tokio::test]
async fn production_styles_are_compressed() -> TestResult {
    let fs = site_fixture();
    let tools = FakeToolRunner::passthrough();
    run_action(TaskAction::Styles, &context(&fs, &tools, production())).await?;

    assert!(tools.calls()[0].argv.contains(&"--style=compressed".to_string()));
    Ok(())
}

#[tokio::test]
async fn sass_failure_fails_the_step_and_writes_nothing() -> TestResult {
    let fs = site_fixture();
    let tools = FakeToolRunner::failing("sass", 65);
    let err = run_action(TaskAction::Styles, &context(&fs, &tools, dev()))
        .await
        .unwrap_err();

    assert!(matches!(err, SitepipeError::ToolFailed { code: 65, .. }));
    assert!(!fs.is_file(&at("main.css")));
    Ok(())
}

#[tokio::test]
async fn dev_scripts_are_concatenated_in_path_order_with_tota11y() -> TestResult {
    let fs = site_fixture();
    let tools = FakeToolRunner::passthrough();
    run_action(TaskAction::Scripts, &context(&fs, &tools, dev())).await?;

    let expected = "var menu = 1;\nvar nav = 1;\nvar lib = 1;\nvar tota11y = 1;";
    assert_eq!(read(&fs, "main.js"), expected);
    assert_eq!(read(&fs, "_site/main.js"), expected);
    assert!(tools.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn production_scripts_are_minified_without_tota11y() -> TestResult {
    let fs = site_fixture();
    let tools = FakeToolRunner::passthrough();
    run_action(TaskAction::Scripts, &context(&fs, &tools, production())).await?;

    let calls = tools.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program(), "npx");
    assert!(calls[0].argv.contains(&"uglifyjs".to_string()));
    assert_eq!(read(&fs, "main.js"), "var menu = 1;\nvar nav = 1;\nvar lib = 1;");
    Ok(())
}

#[tokio::test]
async fn missing_tota11y_only_warns() -> TestResult {
    let fs = site_fixture();
    fs.remove_file(&at("_app/vendor/tota11y.min.js"))?;
    run_action(TaskAction::Scripts, &context(&fs, &FakeToolRunner::passthrough(), dev())).await?;

    assert_eq!(read(&fs, "main.js"), "var menu = 1;\nvar nav = 1;\nvar lib = 1;");
    Ok(())
}

#[tokio::test]
async fn jekyll_gets_drafts_only_when_asked() -> TestResult {
    let fs = site_fixture();

    let tools = FakeToolRunner::passthrough();
    let drafts = BuildFlags {
        production: false,
        drafts: true,
    };
    run_action(TaskAction::Jekyll, &context(&fs, &tools, drafts)).await?;
    run_action(TaskAction::Jekyll, &context(&fs, &tools, dev())).await?;

    let lines = tools.command_lines();
    assert_eq!(
        lines[0],
        "bundle exec jekyll build --config _config.yml,_app/localhost_config.yml --drafts"
    );
    assert_eq!(
        lines[1],
        "bundle exec jekyll build --config _config.yml,_app/localhost_config.yml"
    );
    Ok(())
}

#[tokio::test]
async fn fonts_are_flattened_into_both_font_dirs() -> TestResult {
    let fs = site_fixture();
    run_action(TaskAction::FontelloFonts, &context(&fs, &FakeToolRunner::passthrough(), dev())).await?;

    let expected = vec![PathBuf::from("fontello.ttf"), PathBuf::from("fontello.woff")];
    assert_eq!(fs.files_under(at("font")), expected);
    assert_eq!(fs.files_under(at("_site/font")), expected);
    Ok(())
}

#[tokio::test]
async fn vendor_stylesheets_become_sass_partials() -> TestResult {
    let fs = site_fixture();
    let ctx = context(&fs, &FakeToolRunner::passthrough(), dev());
    run_action(TaskAction::NormalizeCss, &ctx).await?;
    run_action(TaskAction::FontelloCss, &ctx).await?;

    assert_eq!(read(&fs, "_app/styles/base/_reset.scss"), "html {}");
    assert_eq!(read(&fs, "_app/styles/base/_fontello.scss"), ".icon {}");
    Ok(())
}

#[tokio::test]
async fn updates_run_each_package_command_in_order() -> TestResult {
    let fs = site_fixture();
    let tools = FakeToolRunner::passthrough();
    let ctx = context(&fs, &tools, dev());
    run_action(TaskAction::UpdateBower, &ctx).await?;
    run_action(TaskAction::UpdateBundle, &ctx).await?;

    assert_eq!(
        tools.command_lines(),
        vec!["bower install", "bower prune", "bower update", "bundle install", "bundle update"]
    );
    Ok(())
}

fn snapshot(fs: &MockFileSystem) -> BTreeMap<PathBuf, Vec<u8>> {
    fs.file_paths()
        .into_iter()
        .map(|p| {
            let data = fs.read(&p).unwrap();
            (p, data)
        })
        .collect()
}

async fn clean_then_build(ctx: &PipelineContext) -> TestResult {
    for target in [
        CleanTarget::Jekyll,
        CleanTarget::Fonts,
        CleanTarget::Images,
        CleanTarget::Scripts,
        CleanTarget::Styles,
    ] {
        run_action(TaskAction::Clean(target), ctx).await?;
    }
    for action in [
        TaskAction::Scripts,
        TaskAction::Images,
        TaskAction::Styles,
        TaskAction::FontelloFonts,
    ] {
        run_action(action, ctx).await?;
    }
    Ok(())
}

#[tokio::test]
async fn clean_and_build_twice_gives_the_same_tree() -> TestResult {
    let fs = site_fixture();
    let ctx = context(&fs, &FakeToolRunner::passthrough(), dev());

    clean_then_build(&ctx).await?;
    let first = snapshot(&fs);
    clean_then_build(&ctx).await?;
    assert_eq!(snapshot(&fs), first);
    assert!(first.contains_key(&at("_site/main.css")));
    Ok(())
}

#[tokio::test]
async fn clean_removes_only_generated_outputs() -> TestResult {
    let fs = site_fixture();
    let ctx = context(&fs, &FakeToolRunner::passthrough(), dev());
    let sources = fs.file_paths();

    clean_then_build(&ctx).await?;
    for target in [
        CleanTarget::Jekyll,
        CleanTarget::Fonts,
        CleanTarget::Images,
        CleanTarget::Scripts,
        CleanTarget::Styles,
    ] {
        run_action(TaskAction::Clean(target), &ctx).await?;
    }

    assert_eq!(fs.file_paths(), sources);
    Ok(())
}
