use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};
use quickcheck_macros::quickcheck;

use crate::{SpoolError, SpooledBytes, SpooledText};

#[derive(Clone, Debug)]
enum Op {
    Write(Vec<u8>),
    Read(Option<u8>),
    Seek(SeekFrom),
    Truncate(Option<u8>),
    Rollover,
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        match u8::arbitrary(g) % 8 {
            0..=2 => Op::Write(Vec::arbitrary(g)),
            3 => Op::Read(Option::arbitrary(g)),
            4 => Op::Seek(SeekFrom::Start(u64::from(u8::arbitrary(g)))),
            5 if bool::arbitrary(g) => Op::Seek(SeekFrom::Current(i64::from(i8::arbitrary(g)))),
            5 => Op::Seek(SeekFrom::End(i64::from(i8::arbitrary(g)))),
            6 => Op::Truncate(Option::arbitrary(g)),
            _ => Op::Rollover,
        }
    }
}

/// Applies `ops` to a spooled buffer and to `Cursor<Vec<u8>>`, checking after
/// every step that both agree on content and cursor and that the buffer is on
/// disk exactly when it should be.
fn run_model(max_size: Option<u8>, ops: &[Op]) -> Result<(), String> {
    let threshold = max_size.filter(|&m| m > 0).map(u64::from);
    let mut spooled = match max_size {
        Some(max) => SpooledBytes::with_max_size(u64::from(max)),
        None => SpooledBytes::new(),
    };
    let mut model = Cursor::new(Vec::<u8>::new());
    let mut expect_rolled = false;

    for (step, op) in ops.iter().enumerate() {
        match op {
            Op::Write(data) => {
                let n = spooled.write(data).map_err(|e| e.to_string())?;
                model.write_all(data).unwrap();
                if n != data.len() {
                    return Err(format!("step {step}: wrote {n} of {}", data.len()));
                }
                if threshold.is_some_and(|max| model.get_ref().len() as u64 > max) {
                    expect_rolled = true;
                }
            }
            Op::Read(n) => {
                let got = spooled
                    .read(n.map(usize::from))
                    .map_err(|e| e.to_string())?;
                let mut want = Vec::new();
                let read = match n {
                    Some(n) => (&mut model).take(u64::from(*n)).read_to_end(&mut want),
                    None => model.read_to_end(&mut want),
                };
                read.unwrap();
                if got != want {
                    return Err(format!("step {step}: read {got:?}, model {want:?}"));
                }
            }
            Op::Seek(pos) => match (spooled.seek(*pos), model.seek(*pos)) {
                (Ok(a), Ok(b)) if a == b => {}
                (Err(SpoolError::NegativeSeek(_)), Err(_)) => {}
                (a, b) => return Err(format!("step {step}: seek {a:?} vs model {b:?}")),
            },
            Op::Truncate(size) => {
                let len = spooled
                    .truncate(size.map(i64::from))
                    .map_err(|e| e.to_string())?;
                let new_len = size.map_or(model.position(), u64::from);
                model.get_mut().resize(usize::try_from(new_len).unwrap(), 0);
                if len != new_len {
                    return Err(format!("step {step}: truncate to {len}, model {new_len}"));
                }
                if threshold.is_some_and(|max| new_len > max) {
                    expect_rolled = true;
                }
            }
            Op::Rollover => {
                spooled.rollover().map_err(|e| e.to_string())?;
                expect_rolled = true;
            }
        }

        let tell = spooled.tell().map_err(|e| e.to_string())?;
        if tell != model.position() {
            return Err(format!("step {step}: tell {tell}, model {}", model.position()));
        }
        let contents = spooled.get_contents().map_err(|e| e.to_string())?;
        if &contents != model.get_ref() {
            return Err(format!("step {step}: contents diverged"));
        }
        if spooled.len().map_err(|e| e.to_string())? != model.get_ref().len() as u64 {
            return Err(format!("step {step}: len diverged"));
        }
        if spooled.is_rolled_over() != expect_rolled {
            return Err(format!(
                "step {step}: rolled over = {}, expected {expect_rolled}",
                spooled.is_rolled_over()
            ));
        }
    }
    Ok(())
}

/// Property: whatever the operation sequence and threshold, a spooled buffer
/// is indistinguishable from an in-memory cursor.
#[test]
fn matches_cursor_model_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(max_size: Option<u8>, ops: Vec<Op>) -> TestResult {
        match run_model(max_size, &ops) {
            Ok(()) => TestResult::passed(),
            Err(err) => {
                dbg!(&max_size, &ops);
                TestResult::error(err)
            }
        }
    }

    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 1_000 } else { 200 };
    #[cfg(miri)]
    let tests = 5;

    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(Option<u8>, Vec<Op>) -> TestResult);
}

#[test]
fn matches_cursor_model_repro() {
    let ops = [
        Op::Write(b"abcdef".to_vec()),
        Op::Seek(SeekFrom::End(3)),
        Op::Write(b"g".to_vec()),
        Op::Seek(SeekFrom::Start(2)),
        Op::Truncate(None),
        Op::Seek(SeekFrom::Current(-3)),
        Op::Read(Some(4)),
        Op::Truncate(Some(12)),
        Op::Read(None),
    ];
    run_model(Some(8), &ops).unwrap();
}

/// Property: reading text back `n` characters at a time, on either side of a
/// rollover, reassembles the original string and never splits a character.
#[quickcheck]
#[allow(clippy::needless_pass_by_value)]
fn text_reads_reassemble(text: String, n: u8, max_size: u8) -> TestResult {
    if n == 0 {
        return TestResult::discard();
    }
    let mut b = SpooledText::with_max_size(u64::from(max_size));
    b.write(&text).unwrap();
    b.seek(SeekFrom::Start(0)).unwrap();

    let mut out = String::new();
    loop {
        let piece = b.read(Some(usize::from(n))).unwrap();
        if piece.is_empty() {
            break;
        }
        let replaced = piece.contains('\u{FFFD}') && !text.contains('\u{FFFD}');
        if replaced || piece.chars().count() > usize::from(n) {
            return TestResult::failed();
        }
        out.push_str(&piece);
    }
    TestResult::from_bool(out == text && b.tell().unwrap() == text.len() as u64)
}
