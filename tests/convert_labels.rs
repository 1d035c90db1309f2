use std::fs;
use std::path::Path;

use yoloprep::convert::{
    self, ConversionMode, ConvertDestination, ConvertIssueCode, ConvertOptions,
};
use yoloprep::error::ErrorKind;
use yoloprep::label::{self, LabelFormat, Shape};

mod common;

fn options(input: &Path, destination: ConvertDestination, mode: ConversionMode) -> ConvertOptions {
    ConvertOptions {
        input_dir: input.to_path_buf(),
        destination,
        mode,
        angle: 0.0,
        progress: false,
    }
}

#[test]
fn detect2obb_writes_mirrored_quads() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("labels");
    let output = temp.path().join("obb");
    common::write_file(&input.join("a.txt"), "0 0.5 0.5 0.2 0.4\n");
    common::write_file(&input.join("train/b.txt"), "1 0.25 0.25 0.1 0.1\n\n");

    let report = convert::convert_labels(&options(
        &input,
        ConvertDestination::Directory(output.clone()),
        ConversionMode::DetectToObb,
    ))
    .expect("convert");

    assert_eq!(report.files.found, 2);
    assert_eq!(report.files.converted, 2);
    assert_eq!(report.records.written, 2);
    assert!(!report.is_lossy());
    assert_eq!(
        fs::read_to_string(output.join("a.txt")).unwrap(),
        "0 0.400000 0.300000 0.600000 0.300000 0.600000 0.700000 0.400000 0.700000\n"
    );
    let nested = label::read_label_file(&output.join("train/b.txt"), LabelFormat::Obb)
        .expect("read nested output");
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].class_id, 1);

    // Inputs are untouched.
    assert_eq!(
        fs::read_to_string(input.join("a.txt")).unwrap(),
        "0 0.5 0.5 0.2 0.4\n"
    );
}

#[test]
fn obb2detect_takes_bounding_boxes_and_flags_rotation() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("labels");
    let output = temp.path().join("detect");
    common::write_file(
        &input.join("a.txt"),
        "0 0.1 0.1 0.5 0.2 0.4 0.6 0.0 0.5\n2 0.4 0.3 0.6 0.3 0.6 0.7 0.4 0.7\n",
    );

    let report = convert::convert_labels(&options(
        &input,
        ConvertDestination::Directory(output.clone()),
        ConversionMode::ObbToDetect,
    ))
    .expect("convert");

    assert_eq!(
        fs::read_to_string(output.join("a.txt")).unwrap(),
        "0 0.250000 0.350000 0.500000 0.500000\n2 0.500000 0.500000 0.200000 0.400000\n"
    );
    assert_eq!(report.records.rotation_discarded, 1);
    assert!(report
        .issues
        .iter()
        .any(|i| i.code == ConvertIssueCode::RotationDiscarded));
}

#[test]
fn malformed_file_fails_alone_and_is_not_written() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("labels");
    let output = temp.path().join("obb");
    common::write_file(&input.join("bad.txt"), "0 0.5 0.5 0.2 0.4\n0 0.5 0.5\n");
    common::write_file(&input.join("good.txt"), "0 0.5 0.5 0.2 0.4\n");

    let report = convert::convert_labels(&options(
        &input,
        ConvertDestination::Directory(output.clone()),
        ConversionMode::DetectToObb,
    ))
    .expect("convert");

    assert_eq!(report.files.converted, 1);
    assert_eq!(report.files.failed, 1);
    assert!(!output.join("bad.txt").exists());
    assert!(output.join("good.txt").is_file());

    let failure = report.failures.iter().next().expect("one failure");
    assert_eq!(failure.path, input.join("bad.txt"));
    assert_eq!(failure.kind, ErrorKind::Format);
}

#[test]
fn out_of_range_records_are_dropped_with_a_warning() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("labels");
    let output = temp.path().join("obb");
    common::write_file(
        &input.join("a.txt"),
        "0 0.5 0.5 0.2 0.2\n1 2.0 2.0 0.1 0.1\n2 0.98 0.5 0.1 0.1\n",
    );

    let report = convert::convert_labels(&options(
        &input,
        ConvertDestination::Directory(output.clone()),
        ConversionMode::DetectToObb,
    ))
    .expect("convert");

    assert_eq!(report.records.read, 3);
    assert_eq!(report.records.written, 2);
    assert_eq!(report.records.skipped, 1);
    assert_eq!(report.records.clamped, 1);
    assert!(report.failures.is_empty());

    let skipped: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.code == ConvertIssueCode::SkippedRecord)
        .collect();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].message.contains("at line 2"));

    let written = label::read_label_file(&output.join("a.txt"), LabelFormat::Obb).unwrap();
    let classes: Vec<usize> = written.iter().map(|r| r.class_id).collect();
    assert_eq!(classes, [0, 2]);
}

#[test]
fn overwrite_rewrites_in_place_and_skips_classes_txt() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("labels");
    common::write_file(&input.join("a.txt"), "0 0.5 0.5 0.2 0.4\n");
    common::write_file(&input.join("classes.txt"), "cat\ndog\n");

    let report = convert::convert_labels(&options(
        &input,
        ConvertDestination::InPlace,
        ConversionMode::DetectToObb,
    ))
    .expect("convert");

    assert_eq!(report.files.found, 1);
    assert!(report.output.is_none());
    assert!(report
        .issues
        .iter()
        .any(|i| i.code == ConvertIssueCode::SkippedClassesFile));
    assert_eq!(
        fs::read_to_string(input.join("classes.txt")).unwrap(),
        "cat\ndog\n"
    );

    let rewritten = label::read_label_file(&input.join("a.txt"), LabelFormat::Obb)
        .expect("in-place output parses as obb");
    assert_eq!(rewritten.len(), 1);
}

#[test]
fn detect2obb_applies_angle() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("labels");
    let output = temp.path().join("obb");
    common::write_file(&input.join("a.txt"), "0 0.5 0.5 0.4 0.2\n");

    let mut opts = options(
        &input,
        ConvertDestination::Directory(output.clone()),
        ConversionMode::DetectToObb,
    );
    opts.angle = std::f64::consts::FRAC_PI_2;
    convert::convert_labels(&opts).expect("convert");

    let written = label::read_label_file(&output.join("a.txt"), LabelFormat::Obb).unwrap();
    let Shape::Quad(q) = written[0].shape else {
        panic!("expected a quad");
    };
    let b = q.bounding_box();
    assert!((b.w - 0.2).abs() < 1e-6);
    assert!((b.h - 0.4).abs() < 1e-6);
}

#[test]
fn xywhr2obb_converts_rotated_boxes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("labels");
    let output = temp.path().join("obb");
    common::write_file(&input.join("a.txt"), "4 0.5 0.5 0.2 0.4 0.0\n");

    let report = convert::convert_labels(&options(
        &input,
        ConvertDestination::Directory(output.clone()),
        ConversionMode::XywhrToObb,
    ))
    .expect("convert");

    assert_eq!(report.files.converted, 1);
    assert_eq!(
        fs::read_to_string(output.join("a.txt")).unwrap(),
        "4 0.400000 0.300000 0.600000 0.300000 0.600000 0.700000 0.400000 0.700000\n"
    );
}

#[test]
fn missing_input_dir_is_fatal() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let err = convert::convert_labels(&options(
        &temp.path().join("missing"),
        ConvertDestination::Directory(temp.path().join("out")),
        ConversionMode::DetectToObb,
    ))
    .unwrap_err();
    assert!(matches!(err, yoloprep::YoloprepError::SourceLayout { .. }));
    assert!(!temp.path().join("out").exists());
}

#[cfg(unix)]
#[test]
fn dangling_symlink_fails_alone() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("labels");
    let output = temp.path().join("obb");
    common::write_file(&input.join("a.txt"), "0 0.5 0.5 0.2 0.4\n");
    common::write_file(&input.join("b.txt"), "1 0.25 0.25 0.1 0.1\n");
    std::os::unix::fs::symlink(input.join("gone.txt"), input.join("dangling.txt"))
        .expect("create symlink");

    let report = convert::convert_labels(&options(
        &input,
        ConvertDestination::Directory(output.clone()),
        ConversionMode::DetectToObb,
    ))
    .expect("convert");

    assert_eq!(report.files.found, 3);
    assert_eq!(report.files.converted, 2);
    assert_eq!(report.files.failed, 1);
    assert!(output.join("a.txt").is_file());
    assert!(output.join("b.txt").is_file());
    assert!(!output.join("dangling.txt").exists());

    let failure = report.failures.iter().next().expect("one failure");
    assert_eq!(failure.path, input.join("dangling.txt"));
    assert_eq!(failure.kind, ErrorKind::Io);
}
