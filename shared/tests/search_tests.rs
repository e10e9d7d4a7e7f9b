//! Query parsing tests

use wayfarer_shared::search::{CITY_SEARCH_MAX_LIMIT, MAX_QUERY_CHARS};
use wayfarer_shared::{CityQuery, ProfileQuery, ProfileSlug, ValidationError};

#[test]
fn test_digit_queries_match_public_id() {
    let q = ProfileQuery::parse("  0471 ").unwrap();
    assert_eq!(q, ProfileQuery::PublicIdPrefix("0471".to_string()));
    assert_eq!(q.like_pattern(), "0471%");
    assert_eq!(q.exact_public_id(), None);

    let full = ProfileQuery::parse("04718233").unwrap();
    assert_eq!(full.exact_public_id(), Some("04718233"));
}

#[test]
fn test_name_queries_are_lowercased_and_unprefixed() {
    let q = ProfileQuery::parse("@Marta_K").unwrap();
    assert_eq!(q, ProfileQuery::NamePrefix("marta_k".to_string()));
    assert_eq!(q.like_pattern(), "marta\\_k%");

    // mixed digits and letters are a name search
    let q = ProfileQuery::parse("abc123").unwrap();
    assert!(matches!(q, ProfileQuery::NamePrefix(_)));
}

#[test]
fn test_empty_and_oversized_queries_rejected() {
    assert_eq!(ProfileQuery::parse("   "), Err(ValidationError::EmptyQuery));
    assert_eq!(ProfileQuery::parse("@"), Err(ValidationError::EmptyQuery));

    let long = "x".repeat(MAX_QUERY_CHARS + 1);
    assert_eq!(
        ProfileQuery::parse(&long),
        Err(ValidationError::QueryTooLong(MAX_QUERY_CHARS))
    );
}

#[test]
fn test_city_query_validation() {
    let q = CityQuery::parse(Some(" Lis"), Some("pt"), Some(1000)).unwrap();
    assert_eq!(q.prefix, "lis");
    assert_eq!(q.country.as_deref(), Some("PT"));
    assert_eq!(q.limit, CITY_SEARCH_MAX_LIMIT);

    let q = CityQuery::parse(Some("Porto"), Some(""), None).unwrap();
    assert_eq!(q.country, None);
    assert_eq!(q.limit, 10);

    assert!(matches!(
        CityQuery::parse(Some("Porto"), Some("PRT"), None),
        Err(ValidationError::InvalidCountry(_))
    ));
    assert_eq!(
        CityQuery::parse(None, None, None),
        Err(ValidationError::EmptyQuery)
    );
}

#[test]
fn test_profile_slugs() {
    assert_eq!(
        ProfileSlug::parse("12345678").unwrap(),
        ProfileSlug::PublicId("12345678".to_string())
    );
    assert_eq!(ProfileSlug::parse("marta-k").unwrap(), ProfileSlug::Legacy);
    assert!(matches!(
        ProfileSlug::parse("1234"),
        Err(ValidationError::InvalidSlug(_))
    ));
    assert!(ProfileSlug::parse("").is_err());
}
