mod common;

use common::{read_predictions, write, Fixture};
use cytoclass::{run, EntryOrder, ErrorKind, NearestCentroid, RunConfig, RunPaths, WidthPolicy};

fn paths(fx: &Fixture, test_archive: std::path::PathBuf) -> RunPaths {
    RunPaths {
        train_matrix: fx.train_matrix.clone(),
        train_labels: fx.train_labels.clone(),
        test_archive,
        output: fx.path("out.tar.gz"),
    }
}

#[test]
fn three_cells_two_markers_one_entry() {
    let fx = Fixture::new();
    let archive = fx.test_archive(&[("sample_1.csv", b"0.5,1\n9,1\n11,0\n")]);
    let p = paths(&fx, archive);

    let summary = run(&p, &RunConfig::default(), &NearestCentroid).unwrap();
    assert_eq!(summary.training_cells, 3);
    assert_eq!(summary.entries, 1);
    assert_eq!(summary.predicted_cells, 3);

    let members = read_predictions(&p.output);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].0, "sample_1.predictions.csv.gz");
    assert_eq!(members[0].1, vec!["A", "B", "B"]);
}

#[test]
fn label_count_mismatch_aborts_before_output() {
    let fx = Fixture::new();
    write(fx.dir.path(), "labels.csv", b"A\nB\n");
    let archive = fx.test_archive(&[("s.csv", b"1,1\n")]);
    let p = paths(&fx, archive);

    let err = run(&p, &RunConfig::default(), &NearestCentroid).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(!p.output.exists());
}

#[test]
fn archive_without_csv_members_aborts() {
    let fx = Fixture::new();
    let archive = fx.test_archive(&[("README.md", b"nothing here"), ("data.tsv", b"1\t2\n")]);
    let p = paths(&fx, archive);

    let err = run(&p, &RunConfig::default(), &NearestCentroid).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(!p.output.exists());
}

#[test]
fn failed_batch_removes_previous_output() {
    let fx = Fixture::new();
    let archive = fx.test_archive(&[("README.md", b"nothing here")]);
    let p = paths(&fx, archive);
    write(fx.dir.path(), "out.tar.gz", b"previous run");

    let err = run(&p, &RunConfig::default(), &NearestCentroid).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(!p.output.exists());
}

#[test]
fn training_failure_keeps_previous_output() {
    let fx = Fixture::new();
    write(fx.dir.path(), "labels.csv", b"A\n");
    let archive = fx.test_archive(&[("s.csv", b"1,1\n")]);
    let p = paths(&fx, archive);
    write(fx.dir.path(), "out.tar.gz", b"previous run");

    let err = run(&p, &RunConfig::default(), &NearestCentroid).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert_eq!(std::fs::read(&p.output).unwrap(), b"previous run");
}

#[test]
fn rerun_overwrites_with_same_content() {
    let fx = Fixture::new();
    let archive = fx.test_archive(&[("a.csv", b"0,0\n"), ("b.csv", b"12,1\n3,1\n")]);
    let p = paths(&fx, archive);

    run(&p, &RunConfig::default(), &NearestCentroid).unwrap();
    let first = read_predictions(&p.output);
    run(&p, &RunConfig::default(), &NearestCentroid).unwrap();
    let second = read_predictions(&p.output);

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

#[test]
fn one_member_per_entry_and_one_label_per_row() {
    let fx = Fixture::new();
    let archive = fx.test_archive(&[
        ("batch/s1.csv", b"1,1\n2,2\n3,3\n4,4\n"),
        ("batch/s2.csv", b"9,9\n"),
        ("batch/notes.txt", b"ignored"),
    ]);
    let p = paths(&fx, archive);
    run(&p, &RunConfig::default(), &NearestCentroid).unwrap();

    let members = read_predictions(&p.output);
    let shape: Vec<_> = members.iter().map(|(n, l)| (n.as_str(), l.len())).collect();
    assert_eq!(
        shape,
        vec![("s1.predictions.csv.gz", 4), ("s2.predictions.csv.gz", 1)]
    );
}

#[test]
fn classifier_failure_leaves_no_output() {
    let fx = Fixture::new();
    // One marker only: the model trained on M0, M1 cannot find M1.
    let archive = fx.test_archive(&[("narrow.csv", b"1\n2\n")]);
    let p = paths(&fx, archive);

    let err = run(&p, &RunConfig::default(), &NearestCentroid).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Classifier);
    assert!(!p.output.exists());
}

#[test]
fn conform_policy_pads_narrow_entries() {
    let fx = Fixture::new();
    let archive = fx.test_archive(&[("narrow.csv", b"1\n12\n")]);
    let p = paths(&fx, archive);
    let config = RunConfig {
        width_policy: WidthPolicy::Conform,
        ..RunConfig::default()
    };

    run(&p, &config, &NearestCentroid).unwrap();
    let members = read_predictions(&p.output);
    assert_eq!(members[0].1, vec!["A", "B"]);
}

#[test]
fn reject_policy_aborts_on_width_mismatch() {
    let fx = Fixture::new();
    let archive = fx.test_archive(&[("wide.csv", b"1,1,1\n")]);
    let p = paths(&fx, archive);
    let config = RunConfig {
        width_policy: WidthPolicy::Reject,
        ..RunConfig::default()
    };

    let err = run(&p, &config, &NearestCentroid).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(!p.output.exists());
}

#[test]
fn by_name_order_is_deterministic() {
    let fx = Fixture::new();
    let archive = fx.test_archive(&[("zeta.csv", b"1,1\n"), ("alpha.csv", b"11,1\n")]);
    let p = paths(&fx, archive);
    let config = RunConfig {
        entry_order: EntryOrder::ByName,
        ..RunConfig::default()
    };

    run(&p, &config, &NearestCentroid).unwrap();
    let names: Vec<_> = read_predictions(&p.output).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["alpha.predictions.csv.gz", "zeta.predictions.csv.gz"]);
}

#[test]
fn compressed_and_archived_training_inputs() {
    let fx = Fixture::new();
    let matrix = write(
        fx.dir.path(),
        "train.tar.gz",
        &common::tar_gz(&[("train.csv", b"0,1\n10,1\n1,0\n")]),
    );
    let labels = write(fx.dir.path(), "labels.csv.gz", &common::gzip(b"A\nB\nNA\n"));
    let archive = fx.test_archive(&[("s.csv", b"10,1\n")]);
    let p = RunPaths {
        train_matrix: matrix,
        train_labels: labels,
        test_archive: archive,
        output: fx.path("out.tar.gz"),
    };

    let summary = run(&p, &RunConfig::default(), &NearestCentroid).unwrap();
    assert_eq!(summary.training_cells, 2);
    assert_eq!(read_predictions(&p.output)[0].1, vec!["B"]);
}
