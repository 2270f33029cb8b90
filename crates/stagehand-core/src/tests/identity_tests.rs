use super::*;
use proptest::prelude::*;
use std::collections::HashSet as StdHashSet;

#[test]
fn plain_components_follow_key_naming_convention() {
    assert_eq!(derive("home", "name", None).as_str(), "home::name::");
    assert_eq!(derive("widgets", "slider", Some("3")).as_str(), "widgets::slider::3");
    assert_eq!(
        derive("fundamentals/hello", "greeting", None).as_str(),
        "fundamentals/hello::greeting::"
    );
}

#[test]
fn same_triple_yields_same_token() {
    let first = derive("widgets", "slider", Some("row-1"));
    let second = derive("widgets", "slider", Some("row-1"));
    assert_eq!(first, second);
    assert_eq!(first.digest(), second.digest());
}

#[test]
fn different_contexts_never_share_a_token() {
    let home = derive("home", "name", None);
    let widgets = derive("widgets", "name", None);
    assert_ne!(home, widgets);
    assert_ne!(home.digest(), widgets.digest());
}

#[test]
fn separators_inside_components_are_escaped() {
    let split_late = derive("a::b", "c", None);
    let split_early = derive("a", "b::c", None);
    assert_ne!(split_late, split_early);
    assert_eq!(split_late.as_str(), r"a\:\:b::c::");
    assert_eq!(split_early.as_str(), r"a::b\:\:c::");

    let backslash = derive(r"a\", "b", None);
    let colon = derive("a", ":b", None);
    assert_ne!(backslash, colon);
}

#[test]
fn empty_discriminator_equals_none() {
    assert_eq!(derive("home", "name", Some("")), derive("home", "name", None));
}

#[test]
fn generator_scopes_tokens_and_prefix() {
    let keys = IdentityKeyGenerator::for_context("quiz");
    let token = keys.derive("answer", Some("2"));
    assert!(token.has_prefix(&keys.prefix()));
    assert_eq!(token, derive("quiz", "answer", Some("2")));
    assert!(!token.has_prefix(&context_prefix("quiz/extra")));
}

#[test]
fn issued_keys_reject_second_holder() {
    let mut issued = IssuedKeys::default();
    let token = derive("home", "go", None);
    assert!(issued.issue(&token));
    assert!(!issued.issue(&token));
    assert_eq!(issued.len(), 1);
}

fn component() -> impl Strategy<Value = String> {
    "[a-z0-9:/\\\\]{0,6}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn ten_thousand_random_triples_do_not_collide(
        triples in prop::collection::vec(
            (component(), component(), prop::option::of(component())),
            10_000,
        )
    ) {
        let normalized: StdHashSet<(String, String, String)> = triples
            .into_iter()
            .map(|(context, base, discriminator)| (context, base, discriminator.unwrap_or_default()))
            .collect();
        let tokens: StdHashSet<IdentityToken> = normalized
            .iter()
            .map(|(context, base, discriminator)| derive(context, base, Some(discriminator.as_str())))
            .collect();
        prop_assert_eq!(tokens.len(), normalized.len());
    }

    #[test]
    fn derivation_is_deterministic(
        context in component(),
        base in component(),
        discriminator in prop::option::of(component()),
    ) {
        let first = derive(&context, &base, discriminator.as_deref());
        let second = derive(&context, &base, discriminator.as_deref());
        prop_assert_eq!(first.digest(), second.digest());
        prop_assert_eq!(first, second);
    }
}
