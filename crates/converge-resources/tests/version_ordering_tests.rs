//! Property tests for API version ordering and latest-version resolution

use converge_resources::{ApiVersion, ResourceDescriptor, ResourceRegistry, ResourceType};
use proptest::prelude::*;

struct Foo;

fn stability() -> impl Strategy<Value = (u8, Option<u32>)> {
    // 0 = alpha, 1 = beta, 2 = GA
    (0u8..3, proptest::option::of(1u32..50))
}

fn render(major: u32, (level, n): (u8, Option<u32>)) -> String {
    match (level, n) {
        (0, Some(n)) => format!("v{major}alpha{n}"),
        (0, None) => format!("v{major}alpha"),
        (1, Some(n)) => format!("v{major}beta{n}"),
        (1, None) => format!("v{major}beta"),
        _ => format!("v{major}"),
    }
}

proptest! {
    #[test]
    fn test_higher_major_always_wins(a in 0u32..1000, b in 0u32..1000, sa in stability(), sb in stability()) {
        prop_assume!(a != b);
        let va = ApiVersion::parse(&render(a, sa));
        let vb = ApiVersion::parse(&render(b, sb));
        prop_assert_eq!(a < b, va < vb);
    }

    #[test]
    fn test_stability_order_within_major(major in 0u32..100, alpha in 1u32..50, beta in 1u32..50) {
        let a = ApiVersion::parse(&format!("v{major}alpha{alpha}"));
        let b = ApiVersion::parse(&format!("v{major}beta{beta}"));
        let ga = ApiVersion::parse(&format!("v{major}"));
        prop_assert!(a < b);
        prop_assert!(b < ga);
    }

    #[test]
    fn test_order_is_total_and_antisymmetric(x in "[a-z0-9.]{0,8}", y in "[a-z0-9.]{0,8}") {
        let a = ApiVersion::parse(&x);
        let b = ApiVersion::parse(&y);
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a == b, x.trim() == y.trim());
    }

    #[test]
    fn test_resolve_returns_maximum(majors in proptest::collection::btree_set(1u32..40, 1..8)) {
        let mut registry = ResourceRegistry::new();
        for m in &majors {
            registry
                .register(ResourceDescriptor::of::<Foo>(ResourceType::new("Foo", "core", format!("v{m}"))))
                .unwrap();
        }
        let expected = format!("v{}", majors.iter().max().unwrap());
        let resolved = registry.resolve("Foo", "core").unwrap();
        prop_assert_eq!(&resolved.resource_type().api_version, &expected);
    }
}
