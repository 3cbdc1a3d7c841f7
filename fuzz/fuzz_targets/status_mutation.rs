#![no_main]

use arbitrary::{Arbitrary, Unstructured};

use libfuzzer_sys::fuzz_target;
use polyclip::status::SweepStatus;

#[derive(Arbitrary, Debug)]
enum Op {
    InsertAfter { idx: usize, val: i32 },
    InsertFirst { val: i32 },
    Remove { idx: usize },
}

impl Op {
    fn apply_to_vec(&self, vec: &mut Vec<i32>) {
        match self {
            Op::InsertAfter { idx, val } => {
                if vec.is_empty() {
                    vec.push(*val);
                } else {
                    vec.insert(*idx % vec.len() + 1, *val);
                }
            }
            Op::InsertFirst { val } => vec.insert(0, *val),
            Op::Remove { idx } => {
                if !vec.is_empty() {
                    vec.remove(*idx % vec.len());
                }
            }
        }
    }

    fn apply_to_status(&self, status: &mut SweepStatus<i32>) {
        match self {
            Op::InsertAfter { idx, val } => {
                let node = if status.is_empty() {
                    None
                } else {
                    status.nodes().nth(*idx % status.len())
                };
                status.insert_after(node, *val);
            }
            Op::InsertFirst { val } => {
                status.insert_after(None, *val);
            }
            Op::Remove { idx } => {
                if !status.is_empty() {
                    // unwrap: the index is in range
                    let node = status.nodes().nth(*idx % status.len()).unwrap();
                    status.remove(node);
                }
            }
        }
    }
}

fn arbitrary_ops(mut u: Unstructured) -> Result<(), arbitrary::Error> {
    let len = u.arbitrary_len::<Op>()?;
    let mut vec = Vec::new();
    let mut status = SweepStatus::new();
    for _ in 0..len {
        let op: Op = u.arbitrary()?;
        op.apply_to_vec(&mut vec);
        op.apply_to_status(&mut status);
        status.check_invariants();

        assert_eq!(status.len(), vec.len());
        assert_eq!(status.iter().collect::<Vec<_>>(), vec);
    }
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let u = Unstructured::new(data);
    let _ = arbitrary_ops(u);
});
