//! End-to-end behaviour of the resolve, assemble, digest pipeline.

use camino::Utf8PathBuf;
use detzip_core::pipeline::{self, BuildRequest, FingerprintRequest};
use detzip_core::{archive, digest, pattern};
use rstest::{fixture, rstest};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use tempfile::TempDir;

const HELLO_BASE64: &str = "BtsseiYO+vbi4/TGNcg1BvH0D204mODmAl4+VfRN3r4=";

#[fixture]
fn app_tree() -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    fs::create_dir_all(root.join("app/lib")).expect("mkdir");
    fs::write(root.join("app/hello.rb"), "puts 'world'").expect("write");
    fs::write(root.join("app/world.rb"), "puts 'hello'").expect("write");
    fs::write(root.join("app/README.md"), "# hello.rb").expect("write");
    fs::write(root.join("app/lib/const.rb"), "A = 100").expect("write");
    dir
}

fn base(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir")
}

/// Entry names as listed by the central directory, parsed directly so
/// duplicate names survive inspection.
fn central_directory_names(bytes: &[u8]) -> Vec<String> {
    const EOCD_LEN: usize = 22;
    let eocd = &bytes[bytes.len() - EOCD_LEN..];
    assert_eq!(&eocd[..4], &0x0605_4b50u32.to_le_bytes(), "EOCD signature");

    let count = u16::from_le_bytes([eocd[10], eocd[11]]) as usize;
    let mut offset = u32::from_le_bytes([eocd[16], eocd[17], eocd[18], eocd[19]]) as usize;
    let mut names = Vec::with_capacity(count);

    for _ in 0..count {
        let record = &bytes[offset..];
        assert_eq!(&record[..4], &0x0201_4b50u32.to_le_bytes(), "CD signature");

        let name_len = u16::from_le_bytes([record[28], record[29]]) as usize;
        let extra_len = u16::from_le_bytes([record[30], record[31]]) as usize;
        let comment_len = u16::from_le_bytes([record[32], record[33]]) as usize;
        names.push(String::from_utf8(record[46..46 + name_len].to_vec()).expect("utf8 name"));
        offset += 46 + name_len + extra_len + comment_len;
    }

    names
}

#[rstest]
fn independent_runs_produce_identical_archives_and_digests(app_tree: TempDir) {
    let patterns = pattern::PatternSet::new(vec!["app/**"], vec!["app/*.md"]);
    let contents = BTreeMap::from([("meta/build.txt".to_owned(), "release".to_owned())]);

    let run = || {
        let files = pattern::resolve(&base(&app_tree), &patterns, false).expect("resolve");
        let bytes = archive::assemble(&base(&app_tree), &files, &contents, 6, 0).expect("assemble");
        let digests = digest::sha256_map(&base(&app_tree), &files).expect("digest map");
        (bytes, digests)
    };

    let (first_bytes, first_digests) = run();
    let (second_bytes, second_digests) = run();
    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first_digests, second_digests);
}

#[rstest]
fn archive_is_readable_by_a_standard_zip_reader(app_tree: TempDir) {
    let req = BuildRequest {
        base_dir: base(&app_tree),
        sources: vec!["app/**".to_owned()],
        excludes: vec!["app/*.md".to_owned()],
        contents: BTreeMap::from([("version.txt".to_owned(), "1.0.0".to_owned())]),
        output: base(&app_tree).join("app.zip"),
        ..BuildRequest::default()
    };
    let output = pipeline::build(&req).expect("build");

    let file = fs::File::open(req.output.as_std_path()).expect("open archive");
    let mut zip = zip::ZipArchive::new(file).expect("readable archive");
    let names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).expect("entry").name().to_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "app/hello.rb",
            "app/lib/const.rb",
            "app/world.rb",
            "version.txt"
        ]
    );

    let mut text = String::new();
    zip.by_name("app/hello.rb")
        .expect("entry")
        .read_to_string(&mut text)
        .expect("read entry");
    assert_eq!(text, "puts 'world'");

    assert_eq!(output.files, &["app/hello.rb", "app/lib/const.rb", "app/world.rb"]);
}

#[rstest]
fn artifact_fingerprint_matches_known_vector(app_tree: TempDir) {
    // A single stored entry's digest is stable across runs; the known
    // vector pins the hello.rb content digest itself.
    let hello = base(&app_tree).join("app/hello.rb");
    assert_eq!(digest::base64_sha256(&hello).expect("digest"), HELLO_BASE64);

    let req = BuildRequest {
        base_dir: base(&app_tree),
        sources: vec!["app/hello.rb".to_owned()],
        output: base(&app_tree).join("one.zip"),
        ..BuildRequest::default()
    };
    let first = pipeline::build(&req).expect("first").base64_sha256;
    let second = pipeline::build(&req).expect("second").base64_sha256;
    assert_eq!(first, second);
}

#[rstest]
fn duplicate_names_across_phases_are_both_written(app_tree: TempDir) {
    let files = vec!["app/hello.rb".to_owned()];
    let contents = BTreeMap::from([("inline/hello.rb".to_owned(), "inline copy".to_owned())]);

    // Both names strip to `hello.rb`.
    let bytes = archive::assemble(
        &base(&app_tree),
        &files,
        &contents,
        archive::DEFAULT_LEVEL,
        1,
    )
    .expect("assemble");

    let names = central_directory_names(&bytes);
    assert_eq!(names, vec!["hello.rb", "hello.rb"]);
}

#[rstest]
fn stripped_out_entries_are_absent_from_the_archive(app_tree: TempDir) {
    let files = vec!["app/lib/const.rb".to_owned(), "app/hello.rb".to_owned()];
    let bytes = archive::assemble(
        &base(&app_tree),
        &files,
        &BTreeMap::new(),
        archive::DEFAULT_LEVEL,
        2,
    )
    .expect("assemble");

    // app/hello.rb has only two components, so stripping two drops it.
    assert_eq!(central_directory_names(&bytes), vec!["const.rb"]);
}

#[rstest]
fn set_algebra_over_the_whole_tree(app_tree: TempDir) {
    let all = pattern::resolve(
        &base(&app_tree),
        &pattern::PatternSet::new(vec!["**"], vec![]),
        false,
    )
    .expect("resolve all");
    assert_eq!(
        all,
        vec![
            "app/README.md",
            "app/hello.rb",
            "app/lib/const.rb",
            "app/world.rb"
        ]
    );

    let without_world = pattern::resolve(
        &base(&app_tree),
        &pattern::PatternSet::new(vec!["**"], vec!["**/world.rb"]),
        false,
    )
    .expect("resolve without world");
    assert_eq!(
        without_world,
        vec!["app/README.md", "app/hello.rb", "app/lib/const.rb"]
    );
}

#[rstest]
fn fingerprint_without_building_leaves_no_artifact(app_tree: TempDir) {
    let req = FingerprintRequest {
        base_dir: base(&app_tree),
        files: vec!["app/**".to_owned()],
        ..FingerprintRequest::default()
    };
    let map = pipeline::fingerprint(&req).expect("fingerprint");

    assert_eq!(
        map.keys().map(String::as_str).collect::<Vec<_>>(),
        vec![
            "app/README.md",
            "app/hello.rb",
            "app/lib/const.rb",
            "app/world.rb"
        ]
    );
    assert!(!base(&app_tree).join("app.zip").as_std_path().exists());
}
