use super::*;
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

/// Lay out a small application tree used by the resolution cases.
#[fixture]
fn app_tree() -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();

    fs::create_dir_all(root.join("app/lib")).expect("create dirs");
    fs::write(root.join("app/hello.rb"), "puts 'world'").expect("write");
    fs::write(root.join("app/world.rb"), "puts 'hello'").expect("write");
    fs::write(root.join("app/README.md"), "# hello.rb").expect("write");
    fs::write(root.join("app/lib/const.rb"), "A = 100").expect("write");
    fs::write(root.join("app/.gitignore"), "*.dylib").expect("write");

    dir
}

fn base(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir")
}

#[rstest]
#[case::everything(
    &["**"],
    &[],
    &["app/.gitignore", "app/README.md", "app/hello.rb", "app/lib/const.rb", "app/world.rb"],
)]
#[case::recursive_extension(
    &["**/*.rb"],
    &[],
    &["app/hello.rb", "app/lib/const.rb", "app/world.rb"],
)]
#[case::excludes_subtract(
    &["**"],
    &["app/.*", "app/*.md"],
    &["app/hello.rb", "app/lib/const.rb", "app/world.rb"],
)]
#[case::union_of_patterns(
    &["app/*.rb", "**/*.md"],
    &["app/world.*"],
    &["app/README.md", "app/hello.rb"],
)]
fn resolves_sorted_relative_paths(
    app_tree: TempDir,
    #[case] includes: &[&str],
    #[case] excludes: &[&str],
    #[case] expected: &[&str],
) {
    let patterns = PatternSet::new(includes.iter().copied(), excludes.iter().copied());
    let files = resolve(&base(&app_tree), &patterns, false).expect("resolve");
    assert_eq!(files, expected);
}

#[rstest]
fn deduplicates_overlapping_includes(app_tree: TempDir) {
    let patterns = PatternSet::new(vec!["app/*.rb", "app/hello.rb", "**/*.rb"], vec![]);
    let files = resolve(&base(&app_tree), &patterns, false).expect("resolve");
    assert_eq!(
        files,
        &["app/hello.rb", "app/lib/const.rb", "app/world.rb"]
    );
}

#[rstest]
fn directories_are_silently_dropped(app_tree: TempDir) {
    let patterns = PatternSet::new(vec!["app", "app/lib"], vec![]);
    let files = resolve(&base(&app_tree), &patterns, false).expect("resolve");
    assert!(files.is_empty());
}

#[rstest]
fn missing_pattern_fails_in_strict_mode(app_tree: TempDir) {
    let patterns = PatternSet::new(vec!["nope/*"], vec![]);
    let err = resolve(&base(&app_tree), &patterns, true).expect_err("strict mode");
    assert!(matches!(err, BuildError::PatternNotFound { pattern } if pattern == "nope/*"));
}

#[rstest]
fn missing_pattern_is_empty_in_lenient_mode(app_tree: TempDir) {
    let patterns = PatternSet::new(vec!["nope/*"], vec![]);
    let files = resolve(&base(&app_tree), &patterns, false).expect("lenient mode");
    assert!(files.is_empty());
}

#[rstest]
fn missing_exclude_never_fails(app_tree: TempDir) {
    let patterns = PatternSet::new(vec!["app/*.rb"], vec!["nope/*"]);
    let files = resolve(&base(&app_tree), &patterns, true).expect("excludes are lenient");
    assert_eq!(files, &["app/hello.rb", "app/world.rb"]);
}

#[rstest]
fn malformed_pattern_is_a_syntax_error(app_tree: TempDir) {
    let patterns = PatternSet::new(vec!["app/[oops"], vec![]);
    let err = resolve(&base(&app_tree), &patterns, false).expect_err("bad pattern");
    assert!(matches!(err, BuildError::PatternSyntax { pattern, .. } if pattern == "app/[oops"));
}

#[test]
fn terminal_recursive_wildcard_reaches_files_at_every_depth() {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    fs::create_dir_all(root.join("a/b")).expect("mkdir");
    fs::write(root.join("top.txt"), "t").expect("write");
    fs::write(root.join("a/mid.txt"), "m").expect("write");
    fs::write(root.join("a/b/deep.txt"), "d").expect("write");

    let patterns = PatternSet::new(vec!["**"], vec![]);
    let files = resolve(&base(&dir), &patterns, false).expect("resolve");
    assert_eq!(files, &["a/b/deep.txt", "a/mid.txt", "top.txt"]);
}

#[test]
fn terminal_recursive_wildcard_excludes_subtract_at_every_depth() {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    fs::create_dir_all(root.join("a/b")).expect("mkdir");
    fs::write(root.join("top.txt"), "t").expect("write");
    fs::write(root.join("a/mid.txt"), "m").expect("write");
    fs::write(root.join("a/b/deep.txt"), "d").expect("write");

    let patterns = PatternSet::new(vec!["**"], vec!["a/**"]);
    let files = resolve(&base(&dir), &patterns, false).expect("resolve");
    assert_eq!(files, &["top.txt"]);
}

#[rstest]
fn terminal_recursive_wildcard_under_a_prefix(app_tree: TempDir) {
    let patterns = PatternSet::new(vec!["app/**"], vec![]);
    let files = resolve(&base(&app_tree), &patterns, false).expect("resolve");
    assert_eq!(
        files,
        &[
            "app/.gitignore",
            "app/README.md",
            "app/hello.rb",
            "app/lib/const.rb",
            "app/world.rb"
        ]
    );
}

#[rstest]
fn resolution_is_repeatable(app_tree: TempDir) {
    let patterns = PatternSet::new(vec!["**"], vec!["app/*.md"]);
    let first = resolve(&base(&app_tree), &patterns, false).expect("first run");
    let second = resolve(&base(&app_tree), &patterns, false).expect("second run");
    assert_eq!(first, second);
}

#[cfg(unix)]
#[rstest]
fn symlink_to_file_counts_as_regular(app_tree: TempDir) {
    let root = app_tree.path();
    std::os::unix::fs::symlink(root.join("app/hello.rb"), root.join("app/link.rb"))
        .expect("symlink");
    std::os::unix::fs::symlink(root.join("app/lib"), root.join("app/libdir")).expect("symlink");

    let patterns = PatternSet::new(vec!["app/*"], vec![]);
    let files = resolve(&base(&app_tree), &patterns, false).expect("resolve");
    assert!(files.contains(&"app/link.rb".to_owned()));
    assert!(!files.iter().any(|f| f == "app/libdir"));
}
