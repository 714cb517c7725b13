// src/config/paths.rs

//! Filesystem locations and glob patterns, derived from a handful of folder
//! constants by plain string concatenation.
//!
//! Directory constants keep their trailing slash (`_app/`, `_site/`) and the
//! file-type patterns start with one (`/**/*.scss`), exactly like the table
//! the site has always used. An empty `jekyll_dir` therefore yields globs
//! such as `/**/*.html`, and a non-empty one `src//**/*.html`;
//! [`normalize_pattern`] turns both into project-relative globs before
//! matching.

use serde::Deserialize;

pub const SASS_PATTERN: &str = "/**/*.scss";
pub const JS_PATTERN: &str = "/**/*.js";
pub const IMAGE_PATTERN: &str =
    "/**/*.{jpg,JPG,jpeg,JPEG,png,PNG,svg,SVG,gif,GIF,webp,WEBP,tif,TIF}";
pub const MARKDOWN_PATTERN: &str = "/**/*.{md,MD,markdown,MARKDOWN}";
pub const HTML_PATTERN: &str = "/**/*.html";
pub const XML_PATTERN: &str = "/**/*.xml";

/// Folder constants, overridable from `[paths]` in the config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    /// The files sitepipe works on.
    pub app_dir: String,
    /// The files Jekyll works on (empty = project root).
    pub jekyll_dir: String,
    /// The generated static site.
    pub site_dir: String,
    /// Folder name of bower packages inside `app_dir`.
    pub bower_components_folder_name: String,

    pub post_folder_name: String,
    pub draft_folder_name: String,
    pub image_folder_name: String,
    pub font_folder_name: String,
    pub vendor_folder_name: String,
    pub script_folder_name: String,
    pub styles_folder_name: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            app_dir: "_app/".to_string(),
            jekyll_dir: String::new(),
            site_dir: "_site/".to_string(),
            bower_components_folder_name: "bower_components/".to_string(),
            post_folder_name: "_posts".to_string(),
            draft_folder_name: "_drafts".to_string(),
            image_folder_name: "images".to_string(),
            font_folder_name: "font".to_string(),
            vendor_folder_name: "vendor".to_string(),
            script_folder_name: "scripts".to_string(),
            styles_folder_name: "styles".to_string(),
        }
    }
}

/// Fully derived path table. Read-only after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTable {
    pub app_dir: String,
    pub jekyll_dir: String,
    pub site_dir: String,
    pub bower_components_dir: String,

    pub app_sass_files: String,
    pub app_js_files: String,
    pub app_image_files: String,
    pub app_font_files: String,
    pub app_vendor_files: String,

    pub jekyll_post_files: String,
    pub jekyll_draft_files: String,
    pub jekyll_image_files: String,
    pub jekyll_font_files: String,

    pub site_image_files: String,
    pub site_font_files: String,

    pub app_sass_files_glob: String,
    pub app_js_files_glob: String,
    pub app_image_files_glob: String,

    pub jekyll_post_files_glob: String,
    pub jekyll_draft_files_glob: String,
    pub jekyll_html_files_glob: String,
    pub jekyll_xml_files_glob: String,
    pub site_html_files_glob: String,

    /// Accessibility toolbar appended to `main.js` outside production.
    pub tota11y: String,
}

impl PathTable {
    pub fn derive(s: &PathSettings) -> Self {
        let app_dir = s.app_dir.clone();
        let jekyll_dir = s.jekyll_dir.clone();
        let site_dir = s.site_dir.clone();
        let bower_components_dir = format!("{}{}", app_dir, s.bower_components_folder_name);

        let app_sass_files = format!("{}{}", app_dir, s.styles_folder_name);
        let app_js_files = format!("{}{}", app_dir, s.script_folder_name);
        let app_image_files = format!("{}{}", app_dir, s.image_folder_name);
        let app_font_files = format!("{}{}", app_dir, s.font_folder_name);
        let app_vendor_files = format!("{}{}", app_dir, s.vendor_folder_name);

        let jekyll_post_files = format!("{}{}", jekyll_dir, s.post_folder_name);
        let jekyll_draft_files = format!("{}{}", jekyll_dir, s.draft_folder_name);
        let jekyll_image_files = format!("{}{}", jekyll_dir, s.image_folder_name);
        let jekyll_font_files = format!("{}{}", jekyll_dir, s.font_folder_name);

        let site_image_files = format!("{}{}", site_dir, s.image_folder_name);
        let site_font_files = format!("{}{}", site_dir, s.font_folder_name);

        Self {
            app_sass_files_glob: format!("{app_sass_files}{SASS_PATTERN}"),
            app_js_files_glob: format!("{app_js_files}{JS_PATTERN}"),
            app_image_files_glob: format!("{app_image_files}{IMAGE_PATTERN}"),
            jekyll_post_files_glob: format!("{jekyll_post_files}{MARKDOWN_PATTERN}"),
            jekyll_draft_files_glob: format!("{jekyll_draft_files}{MARKDOWN_PATTERN}"),
            jekyll_html_files_glob: format!("{jekyll_dir}{HTML_PATTERN}"),
            jekyll_xml_files_glob: format!("{jekyll_dir}{XML_PATTERN}"),
            site_html_files_glob: format!("{site_dir}{HTML_PATTERN}"),
            tota11y: format!("{app_vendor_files}/tota11y.min.js"),
            app_dir,
            jekyll_dir,
            site_dir,
            bower_components_dir,
            app_sass_files,
            app_js_files,
            app_image_files,
            app_font_files,
            app_vendor_files,
            jekyll_post_files,
            jekyll_draft_files,
            jekyll_image_files,
            jekyll_font_files,
            site_image_files,
            site_font_files,
        }
    }

    /// The two parallel output roots every asset pipeline writes to.
    pub fn output_dirs(&self) -> [&str; 2] {
        [&self.jekyll_dir, &self.site_dir]
    }
}

impl Default for PathTable {
    fn default() -> Self {
        Self::derive(&PathSettings::default())
    }
}

/// Make a concatenated glob project-relative: drop the leading `/` an empty
/// directory prefix leaves behind and collapse doubled separators.
pub fn normalize_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.trim_start_matches('/').chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}
