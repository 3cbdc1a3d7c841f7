//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;
use kurbo::BezPath;

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a float in some range, but give it a chance to be close to (or exactly
/// equal to) another float.
///
/// Near-coincidences are where the interesting bugs are, so we want lots of them.
fn another_float_in_range(
    orig: f64,
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    match u.int_in_range(0..=2)? {
        0 => Ok(orig),
        1 => {
            let ulps: i32 = u.int_in_range(-32..=32)?;
            let scale = 1.0f64 + ulps as f64 * f64::EPSILON;
            Ok((orig * scale).clamp(start, end))
        }
        _ => float_in_range(start, end, u),
    }
}

/// Generate a coordinate, either on a coarse integer grid or anywhere in range.
fn coordinate(previous: &[f64], u: &mut Unstructured<'_>) -> Result<f64, arbitrary::Error> {
    const RANGE: f64 = 100.0;
    if !previous.is_empty() && u.ratio(1, 2)? {
        let orig = *u.choose(previous)?;
        another_float_in_range(orig, -RANGE, RANGE, u)
    } else if u.arbitrary()? {
        Ok(f64::from(u.int_in_range(-10i8..=10)?) * 10.0)
    } else {
        float_in_range(-RANGE, RANGE, u)
    }
}

/// Generate an arbitrary closed polygon.
///
/// The coordinates are chosen so that there are many repeated, nearly-repeated,
/// horizontal, vertical and collinear features.
pub fn polygon(u: &mut Unstructured<'_>) -> Result<Vec<kurbo::Point>, arbitrary::Error> {
    let len = u.int_in_range(2..=8)?;
    let mut xs = Vec::with_capacity(len);
    let mut ys = Vec::with_capacity(len);
    let mut ret = Vec::with_capacity(len);
    for _ in 0..len {
        let x = coordinate(&xs, u)?;
        let y = coordinate(&ys, u)?;
        xs.push(x);
        ys.push(y);
        ret.push(kurbo::Point::new(x, y));
    }
    Ok(ret)
}

/// Generate an arbitrary path made up of a few closed polygons.
pub fn path(u: &mut Unstructured<'_>) -> Result<BezPath, arbitrary::Error> {
    let count = u.int_in_range(0..=3)?;
    let mut ret = BezPath::new();
    for _ in 0..count {
        let poly = polygon(u)?;
        ret.move_to(poly[0]);
        for &p in &poly[1..] {
            ret.line_to(p);
        }
        ret.close_path();
    }
    Ok(ret)
}
