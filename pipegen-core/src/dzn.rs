//! Serialization to the solver's flat parameter-file format.
//!
//! Rendering is a pure projection of an [`Instance`]; no validation happens
//! here because construction already guaranteed the invariants. Writing is
//! all-or-nothing: the artifact is rendered in memory, written to a sibling
//! temporary file, and renamed into place, so an I/O failure never leaves a
//! partial file behind.

use std::{
    fmt::Write as _,
    fs,
    io::Write as _,
    path::Path,
};

use tracing::info;

use crate::{
    cost::DIAMETER_CATALOG,
    error::{GeneratorError, Result},
    instance::Instance,
};

/// Renders the instance to the parameter-file text.
///
/// Layout: `%` comment header, scalar counts (`nP`, `nT`, `nC1`, `nC2`,
/// `nA`, `nD`), arc endpoint arrays, per-node supply and demand arrays, the
/// diameter capacity array, the row-major installation cost table, and the
/// transport cost array. Floats use fixed two-decimal formatting; counts are
/// plain integers.
#[must_use]
pub fn render(instance: &Instance) -> String {
    let sizes = instance.sizes();
    let meta = instance.metadata();
    let arc_count = instance.topology().arc_count();
    let diameters = DIAMETER_CATALOG.len();

    let mut out = String::new();

    // Comment header: ignored by the solver, kept for humans.
    let _ = writeln!(out, "% pipe network design instance ({})", meta.size_class);
    if let Some(variant) = meta.variant {
        let _ = writeln!(out, "% stress variant: {variant}");
    }
    if let Some(justification) = &meta.justification {
        let _ = writeln!(out, "% expected hardness: {justification}");
    }
    let _ = writeln!(out, "% total supply: {:.2}", meta.total_supply);
    let _ = writeln!(out, "% total demand: {:.2}", meta.total_demand);
    let _ = writeln!(out, "% slack factor: {:.2}", meta.slack_factor);
    if let Some(seed) = meta.seed {
        let _ = writeln!(out, "% seed: {seed}");
    }
    out.push('\n');

    let _ = writeln!(out, "nP = {};", sizes.plants());
    let _ = writeln!(out, "nT = {};", sizes.tanks());
    let _ = writeln!(out, "nC1 = {};", sizes.transfers());
    let _ = writeln!(out, "nC2 = {};", sizes.finals());
    let _ = writeln!(out, "nA = {arc_count};");
    let _ = writeln!(out, "nD = {diameters};");
    out.push('\n');

    let arc_from: Vec<usize> = instance.topology().arcs().map(|arc| arc.from).collect();
    let arc_to: Vec<usize> = instance.topology().arcs().map(|arc| arc.to).collect();
    let _ = writeln!(out, "arc_from = [{}];", join_ints(&arc_from));
    let _ = writeln!(out, "arc_to = [{}];", join_ints(&arc_to));
    out.push('\n');

    let _ = writeln!(out, "supply = [{}];", join_floats(instance.supply()));
    let _ = writeln!(out, "demand = [{}];", join_floats(instance.demand()));
    out.push('\n');

    let capacities: Vec<f64> = DIAMETER_CATALOG.iter().map(|d| d.capacity).collect();
    let _ = writeln!(out, "max_capacity = [{}];", join_floats(&capacities));
    out.push('\n');

    let _ = writeln!(
        out,
        "install_cost = array2d(1..{arc_count}, 1..{diameters}, [{}]);",
        join_floats(instance.install_cost())
    );
    let _ = writeln!(out, "trans_cost = [{}];", join_floats(instance.trans_cost()));

    out
}

/// Renders the instance and writes it to `path` atomically.
///
/// # Errors
/// Returns [`GeneratorError::Write`] with the target path on any I/O
/// failure. No partial artifact is left on disk.
pub fn write(instance: &Instance, path: &Path) -> Result<()> {
    let rendered = render(instance);
    write_atomic(path, rendered.as_bytes())?;
    info!(path = %path.display(), "wrote parameter file");
    Ok(())
}

/// Writes `contents` to `path` via a sibling temporary file and a rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let wrap = |source| GeneratorError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        // Best effort: never leave the temporary behind.
        let _ = fs::remove_file(&tmp);
    }
    result.map_err(wrap)
}

fn join_ints(values: &[usize]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_floats(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{generator::GeneratorBuilder, index::LayerSizes};

    fn instance() -> Instance {
        let sizes = LayerSizes::new(1, 2, 2, 3).expect("sizes are valid");
        GeneratorBuilder::new(sizes)
            .with_seed(12345)
            .build()
            .generate()
            .expect("generation succeeds")
    }

    #[rstest]
    fn renders_scalar_counts() {
        let rendered = render(&instance());
        for line in ["nP = 1;", "nT = 2;", "nC1 = 2;", "nC2 = 3;", "nD = 3;"] {
            assert!(rendered.contains(line), "missing `{line}` in:\n{rendered}");
        }
    }

    #[rstest]
    fn render_is_idempotent_under_a_seed() {
        assert_eq!(render(&instance()), render(&instance()));
    }

    #[rstest]
    fn floats_use_two_decimals() {
        let rendered = render(&instance());
        let supply_line = rendered
            .lines()
            .find(|line| line.starts_with("supply = "))
            .expect("supply line is present");
        for token in supply_line
            .trim_start_matches("supply = [")
            .trim_end_matches("];")
            .split(", ")
        {
            let (_, decimals) = token.split_once('.').expect("float has a decimal point");
            assert_eq!(decimals.len(), 2, "token `{token}` is not 2-decimal");
        }
    }

    #[rstest]
    fn writes_and_rereads_the_artifact() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("inst_small_1.dzn");
        let instance = instance();
        write(&instance, &path).expect("write succeeds");

        let on_disk = std::fs::read_to_string(&path).expect("artifact exists");
        assert_eq!(on_disk, render(&instance));
        assert!(
            !dir.path().join("inst_small_1.dzn.tmp").exists(),
            "temporary file must not remain"
        );
    }

    #[rstest]
    fn write_failure_reports_the_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing_dir").join("inst.dzn");
        let err = write(&instance(), &path).expect_err("write into a missing dir fails");
        assert!(matches!(err, GeneratorError::Write { .. }));
        assert!(err.to_string().contains("inst.dzn"));
    }
}
