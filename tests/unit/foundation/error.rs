use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FolioError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FolioError::invariant("x")
            .to_string()
            .contains("invariant violation:")
    );
    assert!(
        FolioError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FolioError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_invariant());
}

#[test]
fn only_invariant_class_is_flagged_fatal() {
    assert!(FolioError::invariant("shrink grew").is_invariant());
    assert!(!FolioError::validation("bad size").is_invariant());
}
