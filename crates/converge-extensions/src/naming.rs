//! Extension name and alias derivation
//!
//! Aliases are derived from the implementing type's name so that users can
//! refer to an extension by a short, provider-neutral name.

use std::collections::BTreeSet;

/// Where a provider places its name inside extension type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AffixPosition {
    /// `KafkaTopicCollector` for provider `kafka`.
    #[default]
    Prefix,

    /// `TopicCollectorKafka` for provider `kafka`.
    Suffix,
}

/// The affix a provider uses in its extension type names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamingConvention {
    affix: String,
    position: AffixPosition,
}

impl NamingConvention {
    pub fn prefix(affix: impl Into<String>) -> Self {
        Self {
            affix: affix.into(),
            position: AffixPosition::Prefix,
        }
    }

    pub fn suffix(affix: impl Into<String>) -> Self {
        Self {
            affix: affix.into(),
            position: AffixPosition::Suffix,
        }
    }

    /// No affix: only the simple and kebab-case names are derived.
    pub fn none() -> Self {
        Self::default()
    }

    /// Convention for a provider name such as `schema-registry`, whose affix
    /// is the PascalCase form `SchemaRegistry`.
    pub fn for_provider(provider: &str, position: AffixPosition) -> Self {
        Self {
            affix: to_pascal_case(provider),
            position,
        }
    }

    pub fn affix(&self) -> &str {
        &self.affix
    }

    pub fn position(&self) -> AffixPosition {
        self.position
    }

    /// Remove the affix from `name`. Returns `None` when the affix is empty,
    /// absent, or would leave nothing behind.
    pub fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        if self.affix.is_empty() {
            return None;
        }
        let stripped = match self.position {
            AffixPosition::Prefix => name.strip_prefix(self.affix.as_str()),
            AffixPosition::Suffix => name.strip_suffix(self.affix.as_str()),
        }?;
        (!stripped.is_empty()).then_some(stripped)
    }
}

/// Last path segment of a Rust type name, without generic arguments.
///
/// `kafka::topics::KafkaTopicCollector<Admin>` -> `KafkaTopicCollector`
pub fn simple_type_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base).trim()
}

/// Convert a PascalCase or camelCase identifier to kebab-case.
///
/// Acronyms stay together: `HTTPClient` -> `http-client`.
pub fn to_kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            if !result.is_empty() && !result.ends_with('-') {
                result.push('-');
            }
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !result.is_empty() && !result.ends_with('-') {
                result.push('-');
            }
        }
        result.extend(c.to_lowercase());
    }

    while result.ends_with('-') {
        result.pop();
    }
    result
}

fn to_pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Derive the aliases for an extension implemented by `type_name`.
///
/// Always includes the simple type name and its kebab-case form. When the
/// provider's affix can be stripped, the stripped name and its kebab-case
/// form are added too.
pub fn derive_aliases(type_name: &str, convention: &NamingConvention) -> BTreeSet<String> {
    let simple = simple_type_name(type_name);
    let mut aliases = BTreeSet::new();
    if simple.is_empty() {
        return aliases;
    }

    aliases.insert(simple.to_string());
    aliases.insert(to_kebab_case(simple));

    if let Some(stripped) = convention.strip(simple) {
        aliases.insert(stripped.to_string());
        aliases.insert(to_kebab_case(stripped));
    }
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("KafkaTopicCollector", "kafka-topic-collector")]
    #[case("HTTPClient", "http-client")]
    #[case("SchemaRegistryV2Controller", "schema-registry-v2-controller")]
    #[case("aclValidation", "acl-validation")]
    #[case("Already-kebab", "already-kebab")]
    #[case("snake_case_name", "snake-case-name")]
    #[case("", "")]
    fn test_to_kebab_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_kebab_case(input), expected);
    }

    #[rstest]
    #[case("KafkaTopicCollector", "KafkaTopicCollector")]
    #[case("kafka::topics::KafkaTopicCollector", "KafkaTopicCollector")]
    #[case("kafka::Wrapper<kafka::Admin>", "Wrapper")]
    fn test_simple_type_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(simple_type_name(input), expected);
    }

    #[test]
    fn test_for_provider_pascal_cases_affix() {
        let convention = NamingConvention::for_provider("schema-registry", AffixPosition::Prefix);
        assert_eq!(convention.affix(), "SchemaRegistry");
    }

    #[test]
    fn test_derive_aliases_with_prefix() {
        let aliases = derive_aliases(
            "converge_kafka::KafkaTopicCollector",
            &NamingConvention::prefix("Kafka"),
        );
        let expected: BTreeSet<String> = [
            "KafkaTopicCollector",
            "kafka-topic-collector",
            "TopicCollector",
            "topic-collector",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(aliases, expected);
    }

    #[test]
    fn test_derive_aliases_with_suffix() {
        let aliases = derive_aliases("TopicCollectorAiven", &NamingConvention::suffix("Aiven"));
        assert!(aliases.contains("TopicCollector"));
        assert!(aliases.contains("topic-collector"));
    }

    #[test]
    fn test_derive_aliases_without_matching_affix() {
        let aliases = derive_aliases("TopicCollector", &NamingConvention::prefix("Aiven"));
        assert_eq!(aliases.len(), 2);
    }

    #[test]
    fn test_affix_never_strips_to_empty() {
        let aliases = derive_aliases("Kafka", &NamingConvention::prefix("Kafka"));
        assert_eq!(aliases.len(), 2);
        assert!(aliases.contains("kafka"));
    }

    #[test]
    fn test_distinct_providers_do_not_collide() {
        let kafka = derive_aliases("KafkaTopicCollector", &NamingConvention::none());
        let aiven = derive_aliases("AivenTopicCollector", &NamingConvention::none());
        assert!(kafka.is_disjoint(&aiven));
    }
}
