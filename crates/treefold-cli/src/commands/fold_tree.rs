use crate::cli::FoldTreeArgs;
use crate::error::{CliError, Result};
use std::io::Write;
use tracing::info;
use treefold::{
    core::io::{pdb::PdbFile, traits::StructureFile},
    core::kinematics::builder::{TrailingCoverage, fold_tree_from_ss},
    core::secondary::{assign, segments},
    engine::error::EngineError,
};

pub fn run(args: FoldTreeArgs) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    describe(&args, &mut out)
}

fn describe(args: &FoldTreeArgs, out: &mut impl Write) -> Result<()> {
    let ss = match (&args.source.ss, &args.source.input) {
        (Some(ss), _) => ss.clone(),
        (None, Some(path)) => {
            info!("Assigning secondary structure from {:?}", path);
            let pose = PdbFile::read_from_path(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?;
            assign(&pose)
        }
        (None, None) => return Err(CliError::MissingInput),
    };
    let coverage = if args.no_extend {
        TrailingCoverage::Reject
    } else {
        TrailingCoverage::Extend
    };

    let tree = fold_tree_from_ss(&ss, Some(ss.chars().count()), coverage)
        .map_err(EngineError::from)?;

    writeln!(out, "Secondary structure: {}", ss)?;
    for span in segments(&ss) {
        writeln!(out, "  {}", span)?;
    }
    writeln!(out, "{}", tree)?;
    let cutpoints = tree.cutpoints();
    if !cutpoints.is_empty() {
        let listed: Vec<String> = cutpoints.iter().map(ToString::to_string).collect();
        writeln!(out, "Cutpoints: {}", listed.join(" "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FoldTreeSource;
    use treefold::core::models::pose::Pose;

    fn args(ss: Option<&str>, input: Option<std::path::PathBuf>, no_extend: bool) -> FoldTreeArgs {
        FoldTreeArgs {
            source: FoldTreeSource {
                ss: ss.map(str::to_string),
                input,
            },
            no_extend,
        }
    }

    fn render(args: &FoldTreeArgs) -> Result<String> {
        let mut buffer = Vec::new();
        describe(args, &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn annotation_is_segmented_and_printed() {
        let text = render(&args(Some("  HHHH  EEEE  "), None, false)).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Secondary structure:   HHHH  EEEE  ");
        assert_eq!(lines.iter().filter(|l| l.starts_with("  ")).count(), 2);
        assert!(text.contains("FOLD_TREE"));
        assert!(text.contains("Cutpoints: "));
    }

    #[test]
    fn single_span_has_no_cutpoints() {
        let text = render(&args(Some("HHHHHH"), None, false)).unwrap();
        assert!(text.contains("FOLD_TREE"));
        assert!(!text.contains("Cutpoints"));
    }

    #[test]
    fn trailing_loop_is_refused_without_extension() {
        assert!(render(&args(Some("HHHH  "), None, false)).is_ok());
        assert!(matches!(
            render(&args(Some("HHHH  "), None, true)),
            Err(CliError::Engine(EngineError::InvalidTopology(_)))
        ));
    }

    #[test]
    fn structure_input_is_assigned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strand.pdb");
        PdbFile::write_to_path(&Pose::from_sequence("AAAAAAAA").unwrap(), &path).unwrap();

        let text = render(&args(None, Some(path), false)).unwrap();
        assert!(text.starts_with("Secondary structure: "));
        assert!(text.contains("FOLD_TREE"));
    }

    #[test]
    fn loop_only_annotation_is_a_topology_error() {
        assert!(matches!(
            render(&args(Some("LLLL"), None, false)),
            Err(CliError::Engine(EngineError::InvalidTopology(_)))
        ));
    }
}
