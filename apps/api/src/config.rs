use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub port: u16,
    pub rust_log: String,
    pub profile: FreelancerProfile,
}

/// Who the generated proposals are signed by, and which links they may cite.
#[derive(Debug, Clone, Default)]
pub struct FreelancerProfile {
    pub name: String,
    pub title: String,
    pub github_url: Option<String>,
    pub stackoverflow_url: Option<String>,
    pub website_url: Option<String>,
    /// Fallback portfolio links listed when no portfolio project matches a job.
    pub default_links: Vec<ProfileLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLink {
    pub label: String,
    pub url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            mongodb_uri: require_env("MONGODB_URI")?,
            mongodb_database: env_or("MONGODB_DATABASE", "scope"),
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com"),
            chat_model: env_or("CHAT_MODEL", "gpt-3.5-turbo"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            profile: FreelancerProfile {
                name: env_or("FREELANCER_NAME", "Your Name"),
                title: env_or("FREELANCER_TITLE", "Top Rated Freelancer"),
                github_url: optional_env("GITHUB_URL"),
                stackoverflow_url: optional_env("STACKOVERFLOW_URL"),
                website_url: optional_env("WEBSITE_URL"),
                default_links: parse_profile_links(
                    &std::env::var("DEFAULT_PORTFOLIO_LINKS").unwrap_or_default(),
                ),
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `Label=url` pairs separated by commas. Malformed pairs are skipped.
pub fn parse_profile_links(raw: &str) -> Vec<ProfileLink> {
    raw.split(',')
        .filter_map(|pair| {
            let (label, url) = pair.split_once('=')?;
            let (label, url) = (label.trim(), url.trim());
            if label.is_empty() || url.is_empty() {
                return None;
            }
            Some(ProfileLink {
                label: label.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_links_reads_pairs() {
        let links = parse_profile_links(
            "Android=https://play.google.com/store/apps/x, iOS=https://apps.apple.com/app/x",
        );
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].label, "Android");
        assert_eq!(links[1].url, "https://apps.apple.com/app/x");
    }

    #[test]
    fn test_parse_profile_links_keeps_equals_in_url() {
        let links = parse_profile_links("Store=https://example.com/?id=42");
        assert_eq!(links[0].url, "https://example.com/?id=42");
    }

    #[test]
    fn test_parse_profile_links_skips_malformed_pairs() {
        assert!(parse_profile_links("").is_empty());
        assert!(parse_profile_links("no-equals,=https://x,Label=").is_empty());
    }
}
