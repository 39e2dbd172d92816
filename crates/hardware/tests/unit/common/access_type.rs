//! # Access Type Tests

use cohesim::common::AccessType;
use rstest::rstest;

#[rstest]
#[case(0, Some(AccessType::Read))]
#[case(1, Some(AccessType::Write))]
#[case(2, Some(AccessType::Fetch))]
#[case(3, None)]
#[case(255, None)]
fn test_from_code(#[case] code: u8, #[case] expected: Option<AccessType>) {
    assert_eq!(AccessType::from_code(code), expected);
}

#[test]
fn test_predicates() {
    assert!(AccessType::Write.is_write());
    assert!(!AccessType::Read.is_write());
    assert!(!AccessType::Fetch.is_write());
    assert!(AccessType::Fetch.is_fetch());
    assert!(!AccessType::Read.is_fetch());
}
