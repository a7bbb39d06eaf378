// tests/build_spec.rs
use tensegrity_robot::{BuildSpec, Builder, CableConfig, PairDefinition, RodConfig, Tags, TensegrityError};

fn spec() -> BuildSpec {
    BuildSpec::new()
        .with_builder("rod", Builder::rod(RodConfig::default()))
        .unwrap()
        .with_builder("muscle", Builder::cable(CableConfig::default()))
        .unwrap()
}

fn pair(tags: &str) -> PairDefinition {
    PairDefinition {
        from: 0,
        to: 1,
        tags: Tags::parse(tags),
    }
}

#[test]
fn test_resolves_exactly_one_match() {
    let spec = spec();
    let (tag, builder) = spec.resolve(0, &pair("r3 rod")).unwrap();
    assert_eq!(tag, "rod");
    assert!(builder.is_rigid_link());

    let (tag, builder) = spec.resolve(1, &pair("muscle")).unwrap();
    assert_eq!(tag, "muscle");
    assert!(!builder.is_rigid_link());
}

#[test]
fn test_unresolved_tag_is_an_error() {
    let err = spec().resolve(7, &pair("cable spring")).unwrap_err();
    match err {
        TensegrityError::UnresolvedTag { pair, tags } => {
            assert_eq!(pair, 7);
            assert_eq!(tags, "cable spring");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_ambiguous_tag_lists_every_match() {
    let err = spec().resolve(2, &pair("rod muscle")).unwrap_err();
    match err {
        TensegrityError::AmbiguousTag { pair, matches } => {
            assert_eq!(pair, 2);
            assert_eq!(matches, vec!["muscle".to_owned(), "rod".to_owned()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_duplicate_tag_is_rejected() {
    let mut spec = spec();
    let err = spec.add_builder("rod", Builder::rod(RodConfig::default())).unwrap_err();
    assert!(matches!(err, TensegrityError::DuplicateBuilder { ref tag } if tag == "rod"));
    assert_eq!(spec.len(), 2);
}

#[test]
fn test_empty_tag_is_rejected() {
    let mut spec = BuildSpec::new();
    assert!(matches!(
        spec.add_builder("   ", Builder::rod(RodConfig::default())),
        Err(TensegrityError::EmptyTag)
    ));
    assert!(spec.is_empty());
}

#[test]
fn test_invalid_config_is_rejected_when_bound() {
    let mut spec = BuildSpec::new();
    let err = spec
        .add_builder("rod", Builder::rod(RodConfig::new(0.0, 1.0)))
        .unwrap_err();
    assert!(matches!(err, TensegrityError::InvalidParameter { name: "radius", .. }));

    let err = spec
        .add_builder("muscle", Builder::cable(CableConfig::new(-5.0, 1.0, 0.0)))
        .unwrap_err();
    assert!(matches!(err, TensegrityError::InvalidParameter { name: "stiffness", .. }));
    assert!(spec.is_empty());
}

#[test]
fn test_tags_are_listed_sorted() {
    let tags: Vec<_> = spec().tags().map(str::to_owned).collect();
    assert_eq!(tags, vec!["muscle", "rod"]);
}
