//! Contextual reference resolution
//!
//! Rewrites commands such as "cierra lo que abriste" into a concrete
//! command ("cierra chrome") using the session context. Runs before the
//! shortcut matcher so a rewritten command can still take a fast path.

use crate::context::ContextStore;

/// Phrases that point back at an earlier turn, as word sequences
const MARKERS: &[&[&str]] = &[
    &["lo", "que"],
    &["lo", "mismo"],
    &["eso"],
    &["esa"],
    &["ese"],
    &["esos"],
    &["esas"],
    &["lo", "anterior"],
    &["la", "anterior"],
    &["el", "anterior"],
    &["lo", "último"],
    &["la", "última"],
    &["el", "último"],
    &["lo", "ultimo"],
    &["la", "ultima"],
    &["el", "ultimo"],
];

/// Which antecedent a rewrite used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antecedent {
    App,
    Search,
    Url,
}

/// Outcome of resolving one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// True only when the command was rewritten
    pub is_contextual: bool,
    /// The command to process from here on
    pub command: String,
    pub antecedent: Option<Antecedent>,
}

impl Resolution {
    fn literal(command: &str) -> Self {
        Self {
            is_contextual: false,
            command: command.to_string(),
            antecedent: None,
        }
    }
}

/// One row of the decision table
struct RewriteRule {
    verbs: &'static [&'static str],
    antecedent: Antecedent,
    verb: &'static str,
}

/// Checked in order; the first rule with an available antecedent fires
const RULES: &[RewriteRule] = &[
    RewriteRule {
        verbs: &["cierra", "cerrar"],
        antecedent: Antecedent::App,
        verb: "cierra",
    },
    RewriteRule {
        verbs: &["abre", "abrir"],
        antecedent: Antecedent::App,
        verb: "abre",
    },
    RewriteRule {
        verbs: &["busca", "buscar"],
        antecedent: Antecedent::Search,
        verb: "busca",
    },
    RewriteRule {
        verbs: &["página", "pagina", "url", "sitio", "web"],
        antecedent: Antecedent::Url,
        verb: "abre",
    },
];

/// Resolves anaphoric references against the session context
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver;

impl ReferenceResolver {
    pub fn new() -> Self {
        Self
    }

    /// True when the command contains an anaphoric marker
    pub fn has_reference(&self, command: &str) -> bool {
        let lower = command.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        MARKERS
            .iter()
            .any(|marker| words.windows(marker.len()).any(|window| window == *marker))
    }

    /// Rewrite the command if it refers to an earlier result
    ///
    /// Without a marker, or without any antecedent in the context, the
    /// command comes back unchanged and is interpreted literally.
    pub fn resolve(&self, command: &str, context: &ContextStore) -> Resolution {
        if !self.has_reference(command) {
            return Resolution::literal(command);
        }

        if !context.has_prior_facts() {
            tracing::info!("Contextual command without prior context: '{}'", command);
            return Resolution::literal(command);
        }

        let lower = command.to_lowercase();
        for rule in RULES {
            if !rule.verbs.iter().any(|v| lower.contains(v)) {
                continue;
            }
            let value = match rule.antecedent {
                Antecedent::App => context.last_app(),
                Antecedent::Search => context.last_search(),
                Antecedent::Url => context.last_url(),
            };
            if let Some(value) = value {
                let rewritten = format!("{} {}", rule.verb, value);
                tracing::info!("Context: '{}' -> '{}'", command, rewritten);
                return Resolution {
                    is_contextual: true,
                    command: rewritten,
                    antecedent: Some(rule.antecedent),
                };
            }
        }

        tracing::debug!("No rewrite rule applies to '{}'", command);
        Resolution::literal(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextFact;

    fn context_with(facts: Vec<ContextFact>) -> ContextStore {
        let mut store = ContextStore::default();
        for fact in facts {
            store.apply(fact);
        }
        store
    }

    #[test]
    fn test_close_what_was_opened() {
        let context = context_with(vec![ContextFact::App("chrome".into())]);
        let resolution = ReferenceResolver::new().resolve("cierra lo que abriste", &context);
        assert!(resolution.is_contextual);
        assert_eq!(resolution.command, "cierra chrome");
        assert_eq!(resolution.antecedent, Some(Antecedent::App));
    }

    #[test]
    fn test_no_prior_context_returns_input() {
        let resolution =
            ReferenceResolver::new().resolve("cierra lo que abriste", &ContextStore::default());
        assert!(!resolution.is_contextual);
        assert_eq!(resolution.command, "cierra lo que abriste");
    }

    #[test]
    fn test_literal_command_untouched() {
        let context = context_with(vec![ContextFact::App("chrome".into())]);
        let resolution = ReferenceResolver::new().resolve("abre notepad", &context);
        assert_eq!(resolution, Resolution::literal("abre notepad"));
    }

    #[test]
    fn test_search_the_same() {
        let context = context_with(vec![ContextFact::Search("python tutorial".into())]);
        let resolution = ReferenceResolver::new().resolve("busca lo mismo", &context);
        assert_eq!(resolution.command, "busca python tutorial");
    }

    #[test]
    fn test_page_uses_last_url() {
        let context = context_with(vec![ContextFact::Url("https://rust-lang.org".into())]);
        let resolution = ReferenceResolver::new().resolve("vuelve a esa página", &context);
        assert_eq!(resolution.command, "abre https://rust-lang.org");
        assert_eq!(resolution.antecedent, Some(Antecedent::Url));
    }

    #[test]
    fn test_table_order_open_before_page() {
        let context = context_with(vec![
            ContextFact::App("chrome".into()),
            ContextFact::Url("https://rust-lang.org".into()),
        ]);
        let resolution = ReferenceResolver::new().resolve("abre esa página", &context);
        assert_eq!(resolution.command, "abre chrome");
    }

    #[test]
    fn test_rule_without_its_antecedent_is_skipped() {
        // Close needs an app; only a search is known
        let context = context_with(vec![ContextFact::Search("rust".into())]);
        let resolution = ReferenceResolver::new().resolve("cierra eso", &context);
        assert!(!resolution.is_contextual);
        assert_eq!(resolution.command, "cierra eso");
    }

    #[test]
    fn test_markers_match_whole_words() {
        let resolver = ReferenceResolver::new();
        assert!(resolver.has_reference("cierra eso"));
        assert!(resolver.has_reference("abre lo último"));
        assert!(resolver.has_reference("Abre LO ULTIMO"));
        assert!(resolver.has_reference("cierra lo que abriste"));
        assert!(!resolver.has_reference("cierra el proceso"));
        assert!(!resolver.has_reference("presenta la mesa"));
        assert!(!resolver.has_reference("lo quemado"));
    }
}
