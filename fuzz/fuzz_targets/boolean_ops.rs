#![no_main]

use arbitrary::Unstructured;

use libfuzzer_sys::fuzz_target;
use polyclip::{BinaryOp, FillRule, Options};

fn run(mut u: Unstructured) -> Result<(), arbitrary::Error> {
    let a = polyclip::arbitrary::path(&mut u)?;
    let b = polyclip::arbitrary::path(&mut u)?;
    let fill_rule = *u.choose(&[
        FillRule::EvenOdd,
        FillRule::NonZero,
        FillRule::Positive,
        FillRule::Negative,
    ])?;
    let opts = Options::with_fill_rule(fill_rule);

    for op in [
        BinaryOp::Union,
        BinaryOp::Intersection,
        BinaryOp::Difference,
        BinaryOp::Xor,
    ] {
        let output = polyclip::binary_op_with(&a, &b, op, &opts).unwrap();
        assert!(output.warnings.is_empty(), "{op:?}: {:?}", output.warnings);
        for c in output.contours.contours() {
            assert!(c.points.len() >= 3);
        }
    }
    let output = polyclip::settle_with(&a, &opts).unwrap();
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let u = Unstructured::new(data);
    let _ = run(u);
});
