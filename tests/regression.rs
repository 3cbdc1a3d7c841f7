use kurbo::BezPath;
use libtest_mimic::{Arguments, Failed, Trial};
use polyclip::{binary_op_with, Options};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug)]
enum FillRule {
    EvenOdd,
    NonZero,
    Positive,
    Negative,
}

#[derive(Serialize, Deserialize, Debug)]
enum BinaryOp {
    Union,
    Intersection,
    Difference,
    Xor,
}

#[derive(Serialize, Deserialize, Debug)]
struct Expected {
    area: f64,
    contours: usize,
}

#[derive(Serialize, Deserialize, Debug)]
struct RegressionCaseDeclaration {
    svg_path_1: String,
    svg_path_2: String,
    fill_rule: FillRule,
    op: BinaryOp,
    tolerance: Option<f64>,
    expected: Option<Expected>,
}

impl RegressionCaseDeclaration {
    fn fill_rule(&self) -> polyclip::FillRule {
        match self.fill_rule {
            FillRule::EvenOdd => polyclip::FillRule::EvenOdd,
            FillRule::NonZero => polyclip::FillRule::NonZero,
            FillRule::Positive => polyclip::FillRule::Positive,
            FillRule::Negative => polyclip::FillRule::Negative,
        }
    }

    fn binary_op(&self) -> polyclip::BinaryOp {
        match self.op {
            BinaryOp::Union => polyclip::BinaryOp::Union,
            BinaryOp::Intersection => polyclip::BinaryOp::Intersection,
            BinaryOp::Difference => polyclip::BinaryOp::Difference,
            BinaryOp::Xor => polyclip::BinaryOp::Xor,
        }
    }
}

fn main() {
    let args = Arguments::from_args();
    let tests = regression_tests();

    libtest_mimic::run(&args, tests).exit();
}

fn regression_tests() -> Vec<Trial> {
    let ws = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let file_paths = glob::glob(&format!("{ws}/tests/regression/**/*.yml")).unwrap();

    file_paths
        .into_iter()
        .map(|p| {
            let p = p.unwrap();
            let name = input_path_base(&p).display().to_string();
            Trial::test(name, || run_regression_test(p))
        })
        .collect()
}

fn input_path_base(input_path: &Path) -> &Path {
    let ws = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let base = format!("{ws}/tests/regression");
    input_path.strip_prefix(base).unwrap()
}

fn run_regression_test(path: PathBuf) -> Result<(), Failed> {
    let input = std::fs::read_to_string(&path)?;
    let case: RegressionCaseDeclaration = serde_yaml::from_str(&input)?;
    let p0 = BezPath::from_svg(case.svg_path_1.as_str())?;
    let p1 = BezPath::from_svg(case.svg_path_2.as_str())?;
    let opts = Options {
        fill_rule: case.fill_rule(),
        tolerance: case.tolerance,
    };
    let contours = binary_op_with(&p0, &p1, case.binary_op(), &opts)?.into_result()?;

    for c in contours.contours() {
        if c.points.len() < 3 {
            return Err(format!("degenerate contour {:?}", c.points).into());
        }
    }

    if let Some(expected) = case.expected {
        if contours.len() != expected.contours {
            return Err(format!(
                "expected {} contours, got {}",
                expected.contours,
                contours.len()
            )
            .into());
        }
        let area = contours.area();
        if (area - expected.area).abs() > 1e-6 * expected.area.abs().max(1.0) {
            return Err(format!("expected area {}, got {area}", expected.area).into());
        }
    }

    Ok(())
}
