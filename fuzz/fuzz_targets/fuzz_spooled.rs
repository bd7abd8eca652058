#![no_main]
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spooled::{SpoolError, SpooledBytes, SpooledText};

#[derive(Arbitrary, Debug)]
enum Op {
    Write(Vec<u8>),
    WriteText(String),
    Read(Option<u8>),
    ReadLine,
    SeekStart(u16),
    SeekCurrent(i16),
    SeekEnd(i16),
    Truncate(Option<i16>),
    Rollover,
}

#[derive(Arbitrary, Debug)]
struct Input {
    max_size: Option<u16>,
    ops: Vec<Op>,
}

fn seek_target(op: &Op) -> Option<SeekFrom> {
    match *op {
        Op::SeekStart(offset) => Some(SeekFrom::Start(u64::from(offset))),
        Op::SeekCurrent(delta) => Some(SeekFrom::Current(i64::from(delta))),
        Op::SeekEnd(delta) => Some(SeekFrom::End(i64::from(delta))),
        _ => None,
    }
}

/// Binary buffer against `Cursor<Vec<u8>>`: content and cursor must agree
/// after every operation.
fn differential(input: &Input) {
    let mut spooled = SpooledBytes::with_max_size(input.max_size.map_or(0, u64::from));
    let mut model = Cursor::new(Vec::<u8>::new());

    for op in &input.ops {
        match op {
            Op::Write(data) => {
                spooled.write(data).unwrap();
                model.write_all(data).unwrap();
            }
            Op::WriteText(text) => {
                assert!(matches!(
                    spooled.write(text),
                    Err(SpoolError::InvalidType { .. })
                ));
            }
            Op::Read(n) => {
                let got = spooled.read(n.map(usize::from)).unwrap();
                let mut want = Vec::new();
                let read = match n {
                    Some(n) => (&mut model).take(u64::from(*n)).read_to_end(&mut want),
                    None => model.read_to_end(&mut want),
                };
                read.unwrap();
                assert_eq!(got, want);
            }
            Op::ReadLine => {
                let got = spooled.readline().unwrap();
                let mut want = Vec::new();
                std::io::BufRead::read_until(&mut model, b'\n', &mut want).unwrap();
                assert_eq!(got, want);
            }
            Op::SeekStart(_) | Op::SeekCurrent(_) | Op::SeekEnd(_) => {
                let pos = seek_target(op).unwrap();
                match (spooled.seek(pos), model.seek(pos)) {
                    (Ok(a), Ok(b)) => assert_eq!(a, b),
                    (Err(SpoolError::NegativeSeek(_)), Err(_)) => {}
                    (a, b) => panic!("seek diverged: {a:?} vs {b:?}"),
                }
            }
            Op::Truncate(size) => match size {
                Some(size) if *size < 0 => {
                    assert!(matches!(
                        spooled.truncate(Some(i64::from(*size))),
                        Err(SpoolError::NegativeSize(_))
                    ));
                }
                _ => {
                    let new_len = size.map_or(model.position(), |s| s as u64);
                    spooled.truncate(size.map(i64::from)).unwrap();
                    model.get_mut().resize(new_len as usize, 0);
                }
            },
            Op::Rollover => spooled.rollover().unwrap(),
        }
        assert_eq!(spooled.tell().unwrap(), model.position());
        assert_eq!(&spooled.get_contents().unwrap(), model.get_ref());
    }
}

/// Text buffer: arbitrary overwrites may leave invalid UTF-8 behind, which
/// must decode lossily rather than panic, and lengths stay byte counts.
fn text_decoding(input: &Input) {
    let mut spooled = SpooledText::with_max_size(input.max_size.map_or(0, u64::from));
    for op in &input.ops {
        match op {
            Op::WriteText(text) => {
                spooled.write(text).unwrap();
            }
            Op::Read(n) => {
                spooled.read(n.map(usize::from)).unwrap();
            }
            Op::ReadLine => {
                spooled.readline().unwrap();
            }
            Op::SeekStart(offset) => {
                spooled.seek(SeekFrom::Start(u64::from(*offset))).unwrap();
            }
            Op::Rollover => spooled.rollover().unwrap(),
            _ => {}
        }
        // Replacement characters are never shorter than what they replace.
        let contents = spooled.get_contents().unwrap();
        assert!(contents.len() as u64 >= spooled.len().unwrap());
    }
}

fuzz_target!(|input: Input| {
    differential(&input);
    text_decoding(&input);
});
