use crate::constants::{CATEGORIES_KEY, OTHER_CATEGORY};
use crate::db;
use crate::error::AppError;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// One entry in the category registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub tag: String,
    pub label: String,
    pub color: String,
    pub icon: String,
    #[serde(default)]
    pub domains: Vec<String>,
}

/// The user-editable category registry, stored under the `categories` key.
///
/// Stored as an ordered array, not a map: classification is first-match-wins
/// in registry order, so the order is part of the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRegistry {
    pub entries: Vec<CategoryEntry>,
}

impl CategoryRegistry {
    /// Load the registry, falling back to the built-in defaults when the
    /// store has none (first run before migrations seeded it).
    pub fn load(conn: &Connection) -> Result<Self, AppError> {
        Ok(db::get(conn, CATEGORIES_KEY)?.unwrap_or_else(Self::defaults))
    }

    pub fn save(&self, conn: &Connection) -> Result<(), AppError> {
        db::set(conn, CATEGORIES_KEY, self)
    }

    pub fn entry(&self, tag: &str) -> Option<&CategoryEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entry(tag).is_some()
    }

    /// Remove `domain` from every entry's list (absence is not an error),
    /// then append it to `new_tag`'s list. `other` keeps no explicit list,
    /// so reassigning there only removes.
    pub fn reassign_domain(&mut self, domain: &str, new_tag: &str) -> Result<(), AppError> {
        if new_tag != OTHER_CATEGORY && !self.contains(new_tag) {
            return Err(AppError::InvalidInput {
                field: "category",
                reason: format!("unknown tag '{new_tag}'"),
            });
        }

        for entry in &mut self.entries {
            entry.domains.retain(|d| d != domain);
        }

        if new_tag != OTHER_CATEGORY {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.tag == new_tag) {
                entry.domains.push(domain.to_string());
            }
        }

        Ok(())
    }

    pub fn defaults() -> Self {
        fn entry(tag: &str, label: &str, color: &str, icon: &str, domains: &[&str]) -> CategoryEntry {
            CategoryEntry {
                tag: tag.to_string(),
                label: label.to_string(),
                color: color.to_string(),
                icon: icon.to_string(),
                domains: domains.iter().map(|d| (*d).to_string()).collect(),
            }
        }

        Self {
            entries: vec![
                entry("social", "Social Media", "#f472b6", "💬", &[
                    "facebook.com", "twitter.com", "x.com", "instagram.com", "tiktok.com",
                    "snapchat.com", "reddit.com", "linkedin.com", "pinterest.com",
                    "tumblr.com", "mastodon.social", "threads.net", "bsky.app", "vk.com",
                    "ok.ru", "weibo.com", "wechat.com", "line.me", "telegram.org", "whatsapp.com",
                ]),
                entry("entertainment", "Entertainment", "#c084fc", "🎬", &[
                    "youtube.com", "netflix.com", "twitch.tv", "spotify.com",
                    "hulu.com", "disneyplus.com", "primevideo.com", "crunchyroll.com",
                    "soundcloud.com", "vimeo.com", "dailymotion.com", "hbomax.com",
                    "steamcommunity.com", "steampowered.com", "epicgames.com", "roblox.com",
                    "ign.com", "gamespot.com", "kotaku.com",
                ]),
                entry("development", "Development", "#34d399", "💻", &[
                    "github.com", "gitlab.com", "bitbucket.org", "stackoverflow.com",
                    "codepen.io", "codesandbox.io", "replit.com", "vercel.com",
                    "netlify.com", "heroku.com", "npmjs.com", "pypi.org",
                    "developer.mozilla.org", "w3schools.com", "dev.to", "medium.com",
                    "docker.com", "kubernetes.io", "terraform.io", "aws.amazon.com",
                    "console.cloud.google.com", "portal.azure.com", "jetbrains.com",
                ]),
                entry("productivity", "Productivity", "#60a5fa", "📋", &[
                    "notion.so", "trello.com", "asana.com", "monday.com",
                    "clickup.com", "todoist.com", "airtable.com", "miro.com",
                    "figma.com", "canva.com", "slack.com", "discord.com",
                    "zoom.us", "meet.google.com", "teams.microsoft.com", "calendly.com",
                    "zoom.com", "docusign.com", "dropbox.com", "box.com",
                ]),
                entry("ai_tools", "AI Tools", "#818cf8", "🤖", &[
                    "chatgpt.com", "openai.com", "claude.ai", "anthropic.com",
                    "gemini.google.com", "perplexity.ai", "midjourney.com",
                    "remix.al", "character.ai", "deepseek.com", "mistral.ai",
                    "hf.co", "huggingface.co", "poe.com", "flowith.io", "opus.pro",
                    "opusclip.com", "descript.com", "runwayml.com", "pika.art",
                ]),
                entry("search", "Search", "#fbbf24", "🔍", &[
                    "google.com", "bing.com", "duckduckgo.com", "yahoo.com",
                    "baidu.com", "ecosia.org", "brave.com", "yandex.com", "wolframalpha.com",
                ]),
                entry("finance", "Finance", "#10b981", "💰", &[
                    "chase.com", "bankofamerica.com", "wellsfargo.com", "paypal.com",
                    "stripe.com", "coinbase.com", "binance.com", "revolut.com",
                    "finance.yahoo.com", "bloomberg.com", "wsj.com", "mint.com", "robinhood.com",
                ]),
                entry("email", "Email", "#fb923c", "📧", &[
                    "mail.google.com", "outlook.live.com", "outlook.office.com",
                    "mail.yahoo.com", "protonmail.com", "proton.me", "zoho.com",
                ]),
                entry("shopping", "Shopping", "#f87171", "🛒", &[
                    "amazon.com", "ebay.com", "etsy.com", "walmart.com",
                    "aliexpress.com", "shopify.com", "target.com", "bestbuy.com",
                    "nike.com", "adidas.com", "zara.com", "h&m.com", "ikea.com",
                ]),
                entry("news", "News", "#a78bfa", "📰", &[
                    "cnn.com", "bbc.com", "bbc.co.uk", "reuters.com", "aljazeera.com",
                    "nytimes.com", "theguardian.com", "washingtonpost.com",
                    "news.ycombinator.com", "techcrunch.com", "theverge.com", "wired.com",
                    "arstechnica.com", "engadget.com", "forbes.com", "un.org", "economist.com",
                ]),
                entry("education", "Education", "#2dd4bf", "📚", &[
                    "coursera.org", "udemy.com", "edx.org", "khanacademy.org",
                    "skillshare.com", "codecademy.com", "freecodecamp.org",
                    "leetcode.com", "hackerrank.com", "duolingo.com",
                    "wikipedia.org", "scholar.google.com", "researchgate.net", "jstor.org",
                ]),
                entry(OTHER_CATEGORY, "Other", "#94a3b8", "🌐", &[]),
            ],
        }
    }
}
