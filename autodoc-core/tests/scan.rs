use autodoc_core::config::ScanConfig;
use autodoc_core::scan::{scan, FileRecord, ScanError};
use std::fs::{create_dir_all, write};
use std::path::Path;
use tempfile::tempdir;

fn config_for(root: &Path) -> ScanConfig {
    ScanConfig {
        root: root.to_path_buf(),
        ..ScanConfig::default()
    }
}

#[test]
fn test_scan_collects_recognised_files_with_relative_paths() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    create_dir_all(root.join("src/module")).unwrap();
    write(root.join("a.py"), "print('a')\nprint('b')\n").unwrap();
    write(root.join("src/module/b.ts"), "export const b = 1;\n").unwrap();
    write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
    write(root.join("README"), "no extension\n").unwrap();

    let files = scan(&config_for(root)).expect("scan should succeed");

    assert_eq!(files.len(), 2, "only .py and .ts are recognised: {files:?}");
    let a = &files["a.py"];
    assert_eq!(a.extension, "py");
    assert_eq!(a.size, "print('a')\nprint('b')\n".len());
    assert_eq!(a.lines, 2);
    assert!(files.contains_key("src/module/b.ts"));
}

#[test]
fn test_scan_skips_excluded_directories_at_any_depth() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    for dir in [".git/info", "node_modules/pkg", "nested/build", "deep/a/__pycache__"] {
        create_dir_all(root.join(dir)).unwrap();
    }
    write(root.join(".git/info/hook.py"), "x = 1\n").unwrap();
    write(root.join("node_modules/pkg/index.js"), "module.exports = {};\n").unwrap();
    write(root.join("nested/build/out.js"), "var x;\n").unwrap();
    write(root.join("deep/a/__pycache__/m.py"), "x = 2\n").unwrap();
    write(root.join("keep.js"), "keep();\n").unwrap();
    write(root.join("nested/keep.go"), "package nested\n").unwrap();

    let config = config_for(root);
    let files = scan(&config).expect("scan should succeed");

    let mut paths: Vec<_> = files.keys().cloned().collect();
    paths.sort();
    assert_eq!(paths, vec!["keep.js".to_string(), "nested/keep.go".to_string()]);

    for record in files.values() {
        assert!(
            !record
                .path
                .split('/')
                .any(|segment| config.excluded_dirs.contains(segment)),
            "excluded segment in {}",
            record.path
        );
        assert!(config.extensions.contains(&record.extension));
    }
}

#[test]
fn test_scan_skips_files_that_are_not_utf8() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write(root.join("good.py"), "ok = True\n").unwrap();
    write(root.join("bad.py"), [0xff_u8, 0xfe, 0x00, 0x80]).unwrap();

    let files = scan(&config_for(root)).expect("a bad file must not fail the scan");

    assert_eq!(files.len(), 1);
    assert!(files.contains_key("good.py"));
}

#[test]
fn test_scan_honours_custom_extension_and_exclusion_sets() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    create_dir_all(root.join("vendor")).unwrap();
    write(root.join("lib.rs"), "pub fn f() {}\n").unwrap();
    write(root.join("vendor/dep.rs"), "pub fn g() {}\n").unwrap();
    write(root.join("script.py"), "pass\n").unwrap();

    let config = ScanConfig {
        root: root.to_path_buf(),
        extensions: ["rs".to_string()].into_iter().collect(),
        excluded_dirs: ["vendor".to_string()].into_iter().collect(),
    };
    let files = scan(&config).unwrap();

    assert_eq!(files.keys().collect::<Vec<_>>(), vec!["lib.rs"]);
}

#[test]
fn test_scan_missing_root_is_an_error() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("does-not-exist");

    let result = scan(&config_for(&missing));

    assert!(matches!(result, Err(ScanError::RootNotFound(p)) if p == missing));
}

#[test]
fn test_file_record_derives_metadata_from_content() {
    let record = FileRecord::new("dir/Makefile", "all:\n\techo hi\n");
    assert_eq!(record.extension, "");
    assert_eq!(record.size, 14);
    assert_eq!(record.lines, 2);
}
