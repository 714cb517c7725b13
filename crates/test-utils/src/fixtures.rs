use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sitepipe::config::{BuildConfig, BuildFlags};
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::pipeline::PipelineContext;

use crate::fake_tools::FakeToolRunner;

pub const SITE_ROOT: &str = "/site";

pub fn site_root() -> PathBuf {
    PathBuf::from(SITE_ROOT)
}

/// A small gradient image encoded in `format`.
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .expect("encoding fixture image");
    buf.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Jpeg)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Png)
}

fn add(fs: &MockFileSystem, rel: &str, content: impl Into<Vec<u8>>) {
    fs.add_file(Path::new(SITE_ROOT).join(rel), content);
}

/// The default site layout with a couple of sources per pipeline.
///
/// Images are smaller than every configured width, so variants keep the
/// source size and stay cheap to encode.
pub fn site_fixture() -> MockFileSystem {
    let fs = MockFileSystem::new();
    add(&fs, "_config.yml", "title: Site\n");
    add(&fs, "_app/styles/main.scss", "@import 'base/reset';\n");
    add(&fs, "_app/scripts/b_nav.js", "var nav = 1;");
    add(&fs, "_app/scripts/a_menu.js", "var menu = 1;");
    add(&fs, "_app/scripts/vendor/c_lib.js", "var lib = 1;");
    add(&fs, "_app/vendor/tota11y.min.js", "var tota11y = 1;");
    add(&fs, "_app/vendor/fontello-1234/font/fontello.woff", "woff");
    add(&fs, "_app/vendor/fontello-1234/font/fontello.ttf", "ttf");
    add(&fs, "_app/vendor/fontello-1234/css/fontello.css", ".icon {}");
    add(&fs, "_app/bower_components/normalize.css/normalize.css", "html {}");
    add(&fs, "_posts/2016-01-01-hello.md", "# hello");

    add(&fs, "_app/images/hero-cropped.jpg", jpeg_bytes(48, 24));
    add(&fs, "_app/images/FrontendMastersScott-closeup.jpg", jpeg_bytes(32, 32));
    add(&fs, "_app/images/FrontendMastersScott-fullshot.jpg", jpeg_bytes(32, 48));
    add(&fs, "_app/images/FrontendMastersClassroom.jpg", jpeg_bytes(40, 20));
    add(&fs, "_app/images/AngularComponents.png", png_bytes(24, 24));
    add(&fs, "_app/images/unlisted.png", png_bytes(8, 8));
    fs
}

/// Pipeline context over `fs` and `tools`, rooted at [`SITE_ROOT`].
pub fn context(fs: &MockFileSystem, tools: &FakeToolRunner, flags: BuildFlags) -> PipelineContext {
    context_with(fs, tools, BuildConfig::from_flags(SITE_ROOT, flags))
}

pub fn context_with(fs: &MockFileSystem, tools: &FakeToolRunner, config: BuildConfig) -> PipelineContext {
    PipelineContext::new(Arc::new(config), Arc::new(fs.clone()), Arc::new(tools.clone()))
}

pub fn dev() -> BuildFlags {
    BuildFlags::default()
}

pub fn production() -> BuildFlags {
    BuildFlags {
        production: true,
        drafts: false,
    }
}
