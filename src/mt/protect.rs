/// Token protection for placeholders and character entities
///
/// Before a message goes to the MT provider, `{name}`-style placeholders and
/// `&amp;`-style entities are swapped for opaque markers so the provider
/// cannot translate or mangle them. After translation the markers are
/// swapped back.
///
/// Markers carry one counter shared by both passes:
/// `"Hi {name} &amp; bye"` → `"Hi __PH_0__ __ENT_1__ bye"`.
///
/// Placeholders are masked first and entities are searched in the already
/// masked text, so an entity inside a placeholder (`{a&amp;b}`) travels with
/// the placeholder and gets no marker of its own.
use crate::mt::error::{MtError, MtResult};
use regex::{Captures, Regex};

/// Default placeholder pattern: `{...}` without nested braces
pub const DEFAULT_PLACEHOLDER_PATTERN: &str = r"\{[^{}]+\}";

/// Default entity pattern: `&name;`, `&#123;`
pub const DEFAULT_ENTITY_PATTERN: &str = r"&[a-zA-Z0-9#]+;";

/// Kind of protected substring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Placeholder,
    Entity,
}

impl MarkerKind {
    /// Marker text for the given index, e.g. `__PH_0__` or `__ENT_3__`
    pub fn marker(self, index: usize) -> String {
        match self {
            MarkerKind::Placeholder => format!("__PH_{}__", index),
            MarkerKind::Entity => format!("__ENT_{}__", index),
        }
    }
}

/// Marker → original substring, in the order the markers were created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    entries: Vec<(String, String)>,
}

impl TokenMap {
    fn push(&mut self, marker: String, original: String) {
        self.entries.push((marker, original));
    }

    /// Replace every marker in `text` with its original substring
    ///
    /// Markers the provider dropped are simply absent from the result;
    /// markers it duplicated are all restored.
    pub fn restore(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (marker, original) in &self.entries {
            result = result.replace(marker.as_str(), original);
        }
        result
    }
}

/// Masks placeholders and entities with indexed markers
#[derive(Debug, Clone)]
pub struct TokenProtector {
    placeholder: Regex,
    entity: Regex,
}

impl TokenProtector {
    /// Build a protector from custom patterns
    pub fn new(placeholder_pattern: &str, entity_pattern: &str) -> MtResult<Self> {
        let compile = |pattern: &str, what: &str| {
            Regex::new(pattern).map_err(|e| {
                MtError::ConfigError(format!("Invalid {} pattern '{}': {}", what, pattern, e))
            })
        };

        Ok(Self {
            placeholder: compile(placeholder_pattern, "placeholder")?,
            entity: compile(entity_pattern, "entity")?,
        })
    }

    pub fn with_default_patterns() -> MtResult<Self> {
        Self::new(DEFAULT_PLACEHOLDER_PATTERN, DEFAULT_ENTITY_PATTERN)
    }

    /// Mask `text`, returning the masked text and the markers used
    pub fn protect(&self, text: &str) -> (String, TokenMap) {
        let mut tokens = TokenMap::default();
        if text.is_empty() {
            return (String::new(), tokens);
        }

        let mut index = 0;
        let mut substitute = |kind: MarkerKind, caps: &Captures| {
            let marker = kind.marker(index);
            index += 1;
            tokens.push(marker.clone(), caps[0].to_string());
            marker
        };

        let masked = self
            .placeholder
            .replace_all(text, |caps: &Captures| {
                substitute(MarkerKind::Placeholder, caps)
            })
            .into_owned();
        let masked = self
            .entity
            .replace_all(&masked, |caps: &Captures| {
                substitute(MarkerKind::Entity, caps)
            })
            .into_owned();

        (masked, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protector() -> TokenProtector {
        TokenProtector::with_default_patterns().unwrap()
    }

    fn original<'t>(tokens: &'t TokenMap, marker: &str) -> Option<&'t str> {
        tokens
            .entries
            .iter()
            .find(|(m, _)| m == marker)
            .map(|(_, o)| o.as_str())
    }

    fn assert_round_trip(text: &str) {
        let (masked, tokens) = protector().protect(text);
        assert_eq!(tokens.restore(&masked), text, "masked form: {}", masked);
    }

    #[test]
    fn test_marker_format() {
        assert_eq!(MarkerKind::Placeholder.marker(0), "__PH_0__");
        assert_eq!(MarkerKind::Entity.marker(12), "__ENT_12__");
    }

    #[test]
    fn test_protect_placeholder() {
        let (masked, tokens) = protector().protect("Hello {name}");
        assert_eq!(masked, "Hello __PH_0__");
        assert_eq!(tokens.entries.len(), 1);
        assert_eq!(original(&tokens, "__PH_0__"), Some("{name}"));
    }

    #[test]
    fn test_protect_entity() {
        let (masked, tokens) = protector().protect("Bye &amp;");
        assert_eq!(masked, "Bye __ENT_0__");
        assert_eq!(original(&tokens, "__ENT_0__"), Some("&amp;"));
    }

    #[test]
    fn test_counter_shared_and_placeholders_first() {
        // The entity comes first in the text but is numbered after the placeholders
        let (masked, tokens) = protector().protect("&lt; {a} és {b} &#39;");
        assert_eq!(masked, "__ENT_2__ __PH_0__ és __PH_1__ __ENT_3__");
        let markers: Vec<&str> = tokens.entries.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(markers, vec!["__PH_0__", "__PH_1__", "__ENT_2__", "__ENT_3__"]);
    }

    #[test]
    fn test_entity_inside_placeholder_not_masked_separately() {
        let (masked, tokens) = protector().protect("{a &amp; b} &lt;");
        assert_eq!(masked, "__PH_0__ __ENT_1__");
        assert_eq!(original(&tokens, "__PH_0__"), Some("{a &amp; b}"));
        assert_eq!(original(&tokens, "__ENT_1__"), Some("&lt;"));
        assert_eq!(tokens.entries.len(), 2);
    }

    #[test]
    fn test_nested_braces_mask_inner_only() {
        let (masked, tokens) = protector().protect("{{count}}");
        assert_eq!(masked, "{__PH_0__}");
        assert_eq!(original(&tokens, "__PH_0__"), Some("{count}"));
    }

    #[test]
    fn test_empty_string_is_noop() {
        let (masked, tokens) = protector().protect("");
        assert_eq!(masked, "");
        assert!(tokens.entries.is_empty());
    }

    #[test]
    fn test_plain_text_untouched() {
        let (masked, tokens) = protector().protect("Mentés és kilépés");
        assert_eq!(masked, "Mentés és kilépés");
        assert!(tokens.entries.is_empty());
    }

    #[test]
    fn test_lone_braces_and_ampersands_untouched() {
        let (masked, tokens) = protector().protect("a {} b & c; {unclosed");
        assert_eq!(masked, "a {} b & c; {unclosed");
        assert!(tokens.entries.is_empty());
    }

    #[test]
    fn test_round_trip() {
        for text in [
            "",
            "Mentés",
            "Hello {name}",
            "{a}{b}{c}",
            "&amp;&lt;&gt;",
            "{count} darab &nbsp;termék {unit}",
            "{a &amp; b} &lt;",
            "{{nested}} {x",
            "Adjacent{p}&amp;{q}",
            "{0} {1} {2} {3} {4} {5} {6} {7} {8} {9} {10} {11}",
        ] {
            assert_round_trip(text);
        }
    }

    #[test]
    fn test_restore_after_translation() {
        let (masked, tokens) = protector().protect("Szia {name}, &amp; üdv");
        assert_eq!(masked, "Szia __PH_0__, __ENT_1__ üdv");
        let translated = "Hi __PH_0__, __ENT_1__ welcome";
        assert_eq!(tokens.restore(translated), "Hi {name}, &amp; welcome");
    }

    #[test]
    fn test_restore_with_many_markers_does_not_confuse_prefixes() {
        let text = (0..12).map(|i| format!("{{p{}}}", i)).collect::<Vec<_>>().join(" ");
        let (masked, tokens) = protector().protect(&text);
        assert!(masked.contains("__PH_1__"));
        assert!(masked.contains("__PH_11__"));
        assert_eq!(tokens.restore(&masked), text);
    }

    #[test]
    fn test_custom_patterns() {
        let protector = TokenProtector::new(r"%\w+%", r"\$\d+").unwrap();
        let (masked, tokens) = protector.protect("%user% paid $1");
        assert_eq!(masked, "__PH_0__ paid __ENT_1__");
        assert_eq!(tokens.restore(&masked), "%user% paid $1");
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        match TokenProtector::new(r"\{[", DEFAULT_ENTITY_PATTERN) {
            Err(MtError::ConfigError(msg)) => assert!(msg.contains("placeholder")),
            _ => panic!("Expected ConfigError"),
        }
    }
}
