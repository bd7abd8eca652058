#![allow(missing_docs)]
use std::{
    fmt::Write as _,
    io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write},
};

use rstest::rstest;
use spooled::{LINE_SEPARATOR, SpooledBytes, SpooledText};

#[rstest]
fn io_copy_through_threshold(#[values(0, 16, 1024)] max_size: u64) {
    let payload: Vec<u8> = (0..=255u8).cycle().take(700).collect();
    let mut b = SpooledBytes::with_max_size(max_size);

    let copied = io::copy(&mut payload.as_slice(), &mut b).unwrap();
    assert_eq!(copied, 700);
    assert_eq!(b.is_rolled_over(), max_size == 16);

    Seek::rewind(&mut b).unwrap();
    let mut out = Vec::new();
    Read::read_to_end(&mut b, &mut out).unwrap();
    assert_eq!(out, payload);
}

#[test]
fn io_errors_carry_spool_errors() {
    let mut b = SpooledBytes::new();
    b.close();
    let err = Write::write(&mut b, b"x").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

    let mut b = SpooledBytes::new();
    let err = Seek::seek(&mut b, SeekFrom::Current(-1)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn buf_reader_sees_same_lines() {
    let mut b = SpooledBytes::with_max_size(8);
    for line in ["alpha", "beta", "gamma"] {
        b.write(line.as_bytes()).unwrap();
        b.write(LINE_SEPARATOR.as_bytes()).unwrap();
    }
    assert!(b.is_rolled_over());
    b.seek(SeekFrom::Start(0)).unwrap();

    let lines: Vec<String> = BufReader::new(&mut b)
        .lines()
        .collect::<io::Result<_>>()
        .unwrap();
    assert_eq!(lines, ["alpha", "beta", "gamma"]);
}

#[test]
fn platform_separator_terminates_lines() {
    let mut b = SpooledText::new();
    b.write(format!("Text with\u{2014}{LINE_SEPARATOR}newlines!").as_str())
        .unwrap();
    b.seek(SeekFrom::Start(0)).unwrap();

    let first = b.readline().unwrap();
    assert_eq!(first.strip_suffix(LINE_SEPARATOR), Some("Text with\u{2014}"));
    assert_eq!(b.readline().unwrap(), "newlines!");
}

#[test]
fn fmt_write_into_text() {
    let mut b = SpooledText::with_max_size(9);
    write!(b, "{}-{}", "spooled", 42).unwrap();
    assert!(b.is_rolled_over());
    assert_eq!(b.get_contents().unwrap(), "spooled-42");
}
