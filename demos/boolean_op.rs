//! Runs a boolean operation and draws the inputs and the output side by side.
//!
//! The input file has three lines: the operation (`union`, `intersection`,
//! `difference`, `xor` or `settle`), and then two SVG path strings.

use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::Parser;
use kurbo::{BezPath, Shape};
use svg::node::element::{path::Data, Path};

use polyclip::{generators, BinaryOp, FillRule, Options};

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Example {
    Checkerboard,
    SlantedCheckerboard,
    Slanties,
}

#[derive(Parser)]
struct Cli {
    #[arg(long)]
    output: PathBuf,

    #[arg(long, conflicts_with = "example")]
    input: Option<PathBuf>,

    #[arg(long)]
    example: Option<Example>,

    #[arg(long)]
    even_odd: bool,

    #[arg(long)]
    tolerance: Option<f64>,
}

enum Op {
    Settle,
    Binary(BinaryOp),
}

fn read_input(path: &PathBuf) -> anyhow::Result<(Op, BezPath, BezPath)> {
    let input = std::fs::read_to_string(path)?;
    let mut lines = input.lines();
    let op = lines.next().ok_or(anyhow!("no op line"))?;
    let op = match op.trim() {
        "settle" => Op::Settle,
        "union" => Op::Binary(BinaryOp::Union),
        "intersection" => Op::Binary(BinaryOp::Intersection),
        "difference" => Op::Binary(BinaryOp::Difference),
        "xor" => Op::Binary(BinaryOp::Xor),
        _ => bail!("unknown op {op}"),
    };
    let a = lines.next().ok_or(anyhow!("no first shape"))?;
    let b = lines.next().unwrap_or("");
    Ok((op, BezPath::from_svg(a)?, BezPath::from_svg(b)?))
}

fn data(path: &BezPath) -> Data {
    let mut data = Data::new();
    let p = |point: kurbo::Point| (point.x, point.y);
    for el in path {
        data = match el {
            kurbo::PathEl::MoveTo(p0) => data.move_to(p(p0)),
            kurbo::PathEl::LineTo(p0) => data.line_to(p(p0)),
            kurbo::PathEl::QuadTo(p0, p1) => data.quadratic_curve_to((p(p0), p(p1))),
            kurbo::PathEl::CurveTo(p0, p1, p2) => data.cubic_curve_to((p(p0), p(p1), p(p2))),
            kurbo::PathEl::ClosePath => data.close(),
        };
    }
    data
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let (op, a, b) = match (&args.input, args.example) {
        (Some(path), None) => read_input(path)?,
        (None, Some(example)) => {
            let (a, b) = match example {
                Example::Checkerboard => generators::checkerboard(10),
                Example::SlantedCheckerboard => generators::slanted_checkerboard(10),
                Example::Slanties => generators::slanties(10),
            };
            (Op::Binary(BinaryOp::Xor), a, b)
        }
        _ => bail!("need exactly one of --input or --example"),
    };

    let opts = Options {
        fill_rule: if args.even_odd {
            FillRule::EvenOdd
        } else {
            FillRule::NonZero
        },
        tolerance: args.tolerance,
    };
    let output = match op {
        Op::Settle => polyclip::settle_with(&a, &opts)?,
        Op::Binary(op) => polyclip::binary_op_with(&a, &b, op, &opts)?,
    };
    for w in &output.warnings {
        eprintln!("warning: {w}");
    }
    eprintln!(
        "{} contours, area {}",
        output.contours.len(),
        output.contours.area()
    );

    let bbox = a.bounding_box().union(b.bounding_box());
    let pad = 1.0;
    let width = bbox.width() + 2.0 * pad;
    let height = bbox.height() + 2.0 * pad;
    let stroke_width = width.max(height) / 512.0;

    // Inputs on the left, output on the right.
    let mut document = svg::Document::new().set(
        "viewBox",
        (bbox.x0 - pad, bbox.y0 - pad, width * 2.0, height),
    );
    for (c, color) in [(&a, "green"), (&b, "blue")] {
        let path = Path::new()
            .set("stroke", color)
            .set("stroke-width", stroke_width)
            .set("fill", color)
            .set("fill-opacity", "0.2")
            .set("d", data(c));
        document = document.add(path);
    }

    let out = Path::new()
        .set("stroke", "black")
        .set("stroke-width", stroke_width)
        .set("fill", "red")
        .set("fill-opacity", "0.5")
        .set("fill-rule", "nonzero")
        .set("transform", format!("translate({width}, 0)"))
        .set("d", data(&output.contours.to_path()));
    document = document.add(out);

    svg::save(&args.output, &document)?;
    Ok(())
}
