//! # Trace Parsing Tests

use std::io::Write;

use cohesim::SimError;
use cohesim::common::{AccessType, PhysAddr, TraceError};
use cohesim::sim::{Request, Trace};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_parse_mixed_trace() {
    let src = "\
# core kind addr byte
0 1 0x40 ab
1 0 40 ab    # expects core 0's write

2 2 0X1000
";
    let trace: Trace = src.parse().unwrap();
    assert_eq!(
        trace.requests(),
        &[
            Request {
                core: 0,
                access: AccessType::Write,
                addr: PhysAddr(0x40),
                data: 0xab,
                expected: Some(0xab),
            },
            Request {
                core: 1,
                access: AccessType::Read,
                addr: PhysAddr(0x40),
                data: 0,
                expected: Some(0xab),
            },
            Request {
                core: 2,
                access: AccessType::Fetch,
                addr: PhysAddr(0x1000),
                data: 0,
                expected: None,
            },
        ]
    );
    assert_eq!(trace.len(), 3);
}

#[test]
fn test_empty_trace() {
    let trace: Trace = "\n# nothing here\n   \n".parse().unwrap();
    assert!(trace.is_empty());
}

#[rstest]
#[case("0", 1, "missing access kind")]
#[case("0 1", 1, "missing address")]
#[case("0 1 0x40", 1, "write without data byte")]
#[case("x 0 0x40", 1, "bad core id `x`")]
#[case("0 3 0x40", 1, "bad access kind `3`")]
#[case("0 0 zz", 1, "bad address `zz`")]
#[case("0 0 0x40 100", 1, "bad byte `100`")]
#[case("0 0 0x40 1 2", 1, "trailing fields")]
#[case("# ok\n0 0 0x0\n0 9 0x0", 3, "bad access kind `9`")]
fn test_parse_errors(#[case] src: &str, #[case] line: usize, #[case] reason: &str) {
    assert_eq!(
        src.parse::<Trace>(),
        Err(TraceError {
            line,
            reason: reason.to_string(),
        })
    );
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "0 0 0x10\n0 1 0x10 ff").unwrap();
    let trace = Trace::load(file.path()).unwrap();
    assert_eq!(trace.len(), 2);
    assert_eq!(trace.requests()[1].data, 0xff);
}

#[test]
fn test_load_reports_bad_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "0 0 0x10\n0 0").unwrap();
    assert!(matches!(
        Trace::load(file.path()),
        Err(SimError::Trace(TraceError { line: 2, .. }))
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Trace::load(dir.path().join("none.trace")),
        Err(SimError::Io(_))
    ));
}
