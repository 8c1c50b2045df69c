//! Integration tests driving the command pipeline through `run_cli`,
//! without forking a subprocess.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use pipegen_cli::cli::{
    render_summary, run_cli, BatchArgs, CategoryArg, Cli, CliError, Command, GenerateArgs,
    StressArgs, VariantArg,
};
use rstest::rstest;
use tempfile::TempDir;

fn generate_args(out: PathBuf) -> GenerateArgs {
    GenerateArgs {
        plants: Some(1),
        tanks: Some(2),
        transfers: Some(2),
        finals: Some(3),
        category: CategoryArg::Small,
        seed: Some(12345),
        slack: 1.3,
        out,
        report: None,
        metadata: None,
    }
}

#[rstest]
fn generate_writes_parameter_file() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("inst.dzn");
    let cli = Cli {
        command: Command::Generate(generate_args(out.clone())),
    };

    let summary = run_cli(cli).expect("generate succeeds");

    assert_eq!(summary.written, vec![out.clone()]);
    assert_eq!(summary.failed, 0);
    let rendered = fs::read_to_string(&out).expect("file readable");
    assert!(rendered.contains("nP = 1;"));
    assert!(rendered.contains("nC2 = 3;"));
}

#[rstest]
fn generate_writes_optional_sidecars() {
    let dir = TempDir::new().expect("tempdir");
    let mut args = generate_args(dir.path().join("inst.dzn"));
    args.report = Some(dir.path().join("inst_report.txt"));
    args.metadata = Some(dir.path().join("inst.json"));
    let cli = Cli {
        command: Command::Generate(args),
    };

    run_cli(cli).expect("generate succeeds");

    let report = fs::read_to_string(dir.path().join("inst_report.txt")).expect("report readable");
    assert!(report.contains("=== INSTANCE REPORT ==="));

    let metadata = fs::read_to_string(dir.path().join("inst.json")).expect("metadata readable");
    let parsed: serde_json::Value = serde_json::from_str(&metadata).expect("metadata is JSON");
    assert_eq!(parsed["seed"], 12345);
    assert_eq!(parsed["node_count"], 8);
}

#[rstest]
fn generate_rejects_partial_sizes() {
    let dir = TempDir::new().expect("tempdir");
    let mut args = generate_args(dir.path().join("inst.dzn"));
    args.finals = None;
    let cli = Cli {
        command: Command::Generate(args),
    };

    let err = run_cli(cli).expect_err("partial sizes must fail");
    assert!(matches!(err, CliError::PartialSizes));
}

#[rstest]
fn batch_writes_instances_per_category() {
    let dir = TempDir::new().expect("tempdir");
    let cli = Cli {
        command: Command::Batch(BatchArgs {
            count: 2,
            category: vec![CategoryArg::Small],
            seed: Some(9),
            out_dir: dir.path().to_path_buf(),
        }),
    };

    let summary = run_cli(cli).expect("batch succeeds");

    assert_eq!(summary.written.len(), 2);
    assert_eq!(summary.failed, 0);
    for k in 1..=2 {
        assert!(dir.path().join(format!("inst_small_{k:02}.dzn")).is_file());
        assert!(dir.path().join(format!("inst_small_{k:02}.json")).is_file());
    }
}

#[rstest]
fn batch_skips_an_instance_whose_artifact_cannot_be_written() {
    let dir = TempDir::new().expect("tempdir");
    // A directory squatting on the first artifact path makes its write fail.
    fs::create_dir(dir.path().join("inst_small_01.dzn")).expect("blocking dir");
    let cli = Cli {
        command: Command::Batch(BatchArgs {
            count: 2,
            category: vec![CategoryArg::Small],
            seed: Some(9),
            out_dir: dir.path().to_path_buf(),
        }),
    };

    let summary = run_cli(cli).expect("batch must not abort on one bad instance");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.written.len(), 1);
    assert!(dir.path().join("inst_small_02.dzn").is_file());
}

#[rstest]
fn stress_skips_a_variant_whose_artifact_cannot_be_written() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir(dir.path().join("demand_overload_1.dzn")).expect("blocking dir");
    let cli = Cli {
        command: Command::Stress(StressArgs {
            variant: Vec::new(),
            count: 1,
            seed: Some(31),
            out_dir: dir.path().to_path_buf(),
        }),
    };

    let summary = run_cli(cli).expect("stress run must not abort on one bad instance");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.written.len(), 5);
    assert!(dir.path().join("bottleneck_1.dzn").is_file());
}

#[rstest]
fn seeded_batches_are_reproducible() {
    let run = |dir: &TempDir| {
        let cli = Cli {
            command: Command::Batch(BatchArgs {
                count: 2,
                category: vec![CategoryArg::Medium],
                seed: Some(4242),
                out_dir: dir.path().to_path_buf(),
            }),
        };
        run_cli(cli).expect("batch succeeds");
    };

    let first = TempDir::new().expect("tempdir");
    let second = TempDir::new().expect("tempdir");
    run(&first);
    run(&second);

    for k in 1..=2 {
        let name = format!("inst_medium_{k:02}.dzn");
        let a = fs::read(first.path().join(&name)).expect("first readable");
        let b = fs::read(second.path().join(&name)).expect("second readable");
        assert_eq!(a, b, "{name} differs between identically seeded runs");
    }
}

#[rstest]
fn stress_writes_all_variants_by_default() {
    let dir = TempDir::new().expect("tempdir");
    let cli = Cli {
        command: Command::Stress(StressArgs {
            variant: Vec::new(),
            count: 1,
            seed: Some(31),
            out_dir: dir.path().to_path_buf(),
        }),
    };

    let summary = run_cli(cli).expect("stress succeeds");

    assert_eq!(summary.written.len(), 6);
    assert_eq!(summary.failed, 0);
    for name in [
        "demand_overload",
        "bottleneck",
        "prohibitive_cost",
        "fragmented_topology",
        "near_exact_balance",
        "conflicting_capacity",
    ] {
        assert!(dir.path().join(format!("{name}_1.dzn")).is_file());
        assert!(dir.path().join(format!("{name}_1.json")).is_file());
        assert!(dir.path().join(format!("{name}_1_report.txt")).is_file());
    }
}

#[rstest]
fn stress_accepts_a_single_variant() {
    let dir = TempDir::new().expect("tempdir");
    let cli = Cli {
        command: Command::Stress(StressArgs {
            variant: vec![VariantArg::Bottleneck],
            count: 1,
            seed: Some(5),
            out_dir: dir.path().to_path_buf(),
        }),
    };

    let summary = run_cli(cli).expect("stress succeeds");

    assert_eq!(summary.written.len(), 1);
    let rendered =
        fs::read_to_string(dir.path().join("bottleneck_1.dzn")).expect("file readable");
    assert!(rendered.contains("nT = 1;"));
}

#[rstest]
fn summary_reports_counts() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("inst.dzn");
    let cli = Cli {
        command: Command::Generate(generate_args(out.clone())),
    };
    let summary = run_cli(cli).expect("generate succeeds");

    let mut rendered = Vec::new();
    render_summary(&summary, &mut rendered).expect("rendering succeeds");
    let text = String::from_utf8(rendered).expect("summary is UTF-8");
    assert!(text.contains(&out.display().to_string()));
    assert!(text.trim_end().ends_with("1 instance(s) written, 0 failed"));
}

#[rstest]
fn arguments_parse_from_the_command_line() {
    let cli = Cli::try_parse_from([
        "pipegen",
        "generate",
        "--plants",
        "2",
        "--tanks",
        "3",
        "--transfers",
        "4",
        "--finals",
        "6",
        "--seed",
        "7",
        "--out",
        "inst.dzn",
    ])
    .expect("arguments parse");

    let Command::Generate(args) = cli.command else {
        panic!("expected a generate command");
    };
    assert_eq!(args.plants, Some(2));
    assert_eq!(args.seed, Some(7));
    assert_eq!(args.out, PathBuf::from("inst.dzn"));
}
