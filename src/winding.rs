//! Winding numbers, and deciding which of them are "inside" the result.

use crate::{BinaryOp, FillRule};

/// We support boolean operations, so a "winding number" for us is two winding
/// numbers, one for each input path.
///
/// When settling a single path, the clipping winding number is always zero.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Default, serde::Serialize)]
pub struct WindingNumber {
    /// The winding number of the subject path.
    pub subject: i32,
    /// The winding number of the clipping path.
    pub clipping: i32,
}

impl std::fmt::Debug for WindingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s + {}c", self.subject, self.clipping)
    }
}

impl std::ops::Add for WindingNumber {
    type Output = WindingNumber;

    fn add(self, rhs: WindingNumber) -> WindingNumber {
        WindingNumber {
            subject: self.subject + rhs.subject,
            clipping: self.clipping + rhs.clipping,
        }
    }
}

impl std::ops::Neg for WindingNumber {
    type Output = WindingNumber;

    fn neg(self) -> WindingNumber {
        WindingNumber {
            subject: -self.subject,
            clipping: -self.clipping,
        }
    }
}

impl std::ops::AddAssign for WindingNumber {
    fn add_assign(&mut self, rhs: WindingNumber) {
        *self = *self + rhs;
    }
}

impl WindingNumber {
    /// The contribution of a single segment of one path.
    ///
    /// A segment that (in its original direction) runs left-to-right, or bottom-to-top
    /// if it's vertical, increases the winding number on its upper (or western) side.
    pub fn unit(clipping: bool, increasing: bool) -> Self {
        let w = if increasing { 1 } else { -1 };
        if clipping {
            WindingNumber {
                subject: 0,
                clipping: w,
            }
        } else {
            WindingNumber {
                subject: w,
                clipping: 0,
            }
        }
    }
}

impl FillRule {
    /// Is a point with this winding number inside?
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::EvenOdd => winding % 2 != 0,
            FillRule::NonZero => winding != 0,
            FillRule::Positive => winding > 0,
            FillRule::Negative => winding < 0,
        }
    }
}

/// What we're computing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) enum Operation {
    /// Resolve self-intersections of the subject path.
    Settle,
    /// Combine the subject and clipping paths.
    Binary(BinaryOp),
}

/// Decides, for each region, whether it belongs to the output.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Classifier {
    pub op: Operation,
    pub fill_rule: FillRule,
}

impl Classifier {
    pub fn new(op: Operation, fill_rule: FillRule) -> Self {
        Classifier { op, fill_rule }
    }

    /// Is a region with these winding numbers part of the result?
    pub fn is_inside(&self, w: WindingNumber) -> bool {
        let fill = |winding| self.fill_rule.is_inside(winding);
        match self.op {
            Operation::Settle => fill(w.subject),
            Operation::Binary(BinaryOp::Intersection) => fill(w.subject) && fill(w.clipping),
            Operation::Binary(BinaryOp::Union) => fill(w.subject) || fill(w.clipping),
            Operation::Binary(BinaryOp::Xor) => fill(w.subject) != fill(w.clipping),
            Operation::Binary(BinaryOp::Difference) => fill(w.subject) && !fill(w.clipping),
        }
    }

    /// Does a segment separating `below` from `below + crossing` bound the result?
    pub fn is_boundary(&self, below: WindingNumber, crossing: WindingNumber) -> bool {
        self.is_inside(below) != self.is_inside(below + crossing)
    }
}
