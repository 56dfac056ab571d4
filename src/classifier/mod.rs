use crate::constants::OTHER_CATEGORY;
use crate::error::AppError;
use crate::models::{CategoryRegistry, Classification, ClassificationOverrides, DomainRecord};
use crate::stats;
use rusqlite::Connection;

/// Keyword heuristics for domains absent from every explicit list, checked
/// in this fixed order after the registry.
const HEURISTICS: &[(&str, &[&str])] = &[
    ("ai_tools", &[
        "ai", "gpt", "bot", "gemini", "claude", "perplexity", "anthropic", "character",
        "llm", "midjourney", "mistral", "deepseek", "flux", "opus", "flow",
    ]),
    ("social", &["social", "chat", "network", "messenger", "community", "forum"]),
    ("entertainment", &[
        "video", "movie", "stream", "play", "game", "music", "tv", "show", "clip",
        "anime", "manga",
    ]),
    ("development", &[
        "dev", "code", "git", "stack", "cloud", "api", "docker", "kube", "linux", "repo",
    ]),
    ("shopping", &["shop", "buy", "store", "cart", "deal", "market", "commerce"]),
    ("news", &["news", "journal", "daily", "times", "press", "tribune", "post"]),
    ("finance", &[
        "bank", "card", "pay", "wallet", "crypto", "coin", "trade", "invest", "stock",
        "finance", "ledger",
    ]),
    ("education", &[
        "edu", "learn", "academy", "school", "university", "research", "wiki", "study",
        "course",
    ]),
];

/// Maps domains to category tags against an in-memory copy of the registry.
///
/// The copy makes registry mutation copy-on-write: a classify call sees the
/// pre- or post-mutation registry atomically, never a partial update.
pub struct Classifier {
    registry: CategoryRegistry,
}

impl Classifier {
    pub fn new(conn: &Connection) -> Result<Self, AppError> {
        Ok(Self {
            registry: CategoryRegistry::load(conn)?,
        })
    }

    /// Map a domain to a category tag. Deterministic and total: explicit
    /// registry lists first (exact or dot-suffix match, in registry order),
    /// then keyword heuristics, then `other`.
    pub fn classify(&self, domain: &str) -> String {
        let lower = domain.to_lowercase();
        if lower.is_empty() {
            return OTHER_CATEGORY.to_string();
        }

        for entry in &self.registry.entries {
            if entry.tag == OTHER_CATEGORY {
                continue;
            }
            for d in &entry.domains {
                if lower == *d || lower.ends_with(&format!(".{d}")) {
                    return entry.tag.clone();
                }
            }
        }

        for (tag, keywords) in HEURISTICS {
            for kw in *keywords {
                if lower.contains(kw) {
                    return (*tag).to_string();
                }
            }
        }

        OTHER_CATEGORY.to_string()
    }

    /// Move a domain into `new_tag`'s explicit list and persist the
    /// registry. Future classify calls see the change immediately;
    /// categories already cached on past day-bucket records are untouched.
    pub fn reassign(&mut self, conn: &Connection, domain: &str, new_tag: &str) -> Result<(), AppError> {
        let mut next = self.registry.clone();
        next.reassign_domain(domain, new_tag)?;
        next.save(conn)?;
        self.registry = next;
        Ok(())
    }

    /// Re-read the registry after an out-of-band mutation.
    pub fn reload(&mut self, conn: &Connection) -> Result<(), AppError> {
        self.registry = CategoryRegistry::load(conn)?;
        Ok(())
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// The category of a stored record, recomputed when the record predates
    /// category seeding.
    pub fn category_for(&self, domain: &str, record: &DomainRecord) -> String {
        if record.category.is_empty() {
            self.classify(domain)
        } else {
            record.category.clone()
        }
    }

    /// Effective tri-state classification of a domain: the user's explicit
    /// override wins, otherwise derived from the category weight.
    pub fn classification_status(
        &self,
        overrides: &ClassificationOverrides,
        domain: &str,
    ) -> Classification {
        if let Some(c) = overrides.get(domain) {
            return *c;
        }
        Classification::from_weight(stats::productivity_weight(&self.classify(domain)))
    }
}
