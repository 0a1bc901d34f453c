//! Builds the proposal prompt, calls the chat model and post-processes the
//! reply.
//!
//! Post-processing: strip markdown emphasis, then splice a bold
//! "Additional Relevant Work" block with the included project links above the
//! signature (or append it when the model dropped the signature).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{FreelancerProfile, ProfileLink};
use crate::errors::AppError;
use crate::llm_client::{ChatRequest, LanguageModel, LlmError};
use crate::models::portfolio::PortfolioProject;
use crate::models::proposal::JobMetadata;
use crate::proposals::prompts::{
    ADDITIONAL_WORK_HEADING, DEFAULT_GREETING, DEFAULT_LINKS_HEADER, EXTERNAL_LINKS_HEADER,
    PROJECT_MENTION_TEMPLATE, PROPOSAL_SYSTEM_TEMPLATE, PROPOSAL_USER_TEMPLATE,
    SELECTED_PROJECTS_HEADER,
};

const PLAIN_MAX_TOKENS: u32 = 600;
const PORTFOLIO_MAX_TOKENS: u32 = 700;
const CUSTOM_MAX_TOKENS: u32 = 800;
/// Summary characters quoted per project in the prompt.
const PROJECT_SUMMARY_CHARS: usize = 100;
const METADATA_LINE_CHARS: usize = 100;

static BOLD_MARKDOWN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

/// A project as cited in a proposal. Built from a stored project, or sent by
/// the caller for custom proposals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRef {
    pub name: String,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(default)]
    pub app_store_url: Option<String>,
}

impl From<&PortfolioProject> for ProjectRef {
    fn from(p: &PortfolioProject) -> Self {
        Self {
            name: p.name.clone(),
            ai_summary: Some(p.ai_summary.clone()).filter(|s| !s.is_empty()),
            description: Some(p.description.clone()),
            github_url: p.github_url.clone(),
            live_url: p.live_url.clone(),
            app_store_url: p.app_store_url.clone(),
        }
    }
}

impl ProjectRef {
    fn primary_link(&self) -> Option<&str> {
        [&self.github_url, &self.live_url, &self.app_store_url]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|url| !url.trim().is_empty())
    }

    fn summary(&self) -> &str {
        self.ai_summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.description.as_deref())
            .unwrap_or_default()
    }
}

/// Which configured profile links a custom proposal should list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExternalLinks {
    #[serde(default)]
    pub github: bool,
    #[serde(default)]
    pub stackoverflow: bool,
    #[serde(default)]
    pub website: bool,
}

impl ExternalLinks {
    /// Enabled links that have a configured URL.
    pub fn resolve(&self, profile: &FreelancerProfile) -> Vec<ProfileLink> {
        [
            (self.github, "GitHub", &profile.github_url),
            (self.stackoverflow, "Stack Overflow", &profile.stackoverflow_url),
            (self.website, "Website", &profile.website_url),
        ]
        .into_iter()
        .filter_map(|(enabled, label, url)| {
            let url = url.as_ref().filter(|_| enabled)?;
            Some(ProfileLink {
                label: label.to_string(),
                url: url.clone(),
            })
        })
        .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomProposal {
    pub client_name: Option<String>,
    pub selected_projects: Vec<ProjectRef>,
    pub external_links: ExternalLinks,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// Generates a proposal without portfolio projects.
pub async fn generate(
    llm: &dyn LanguageModel,
    profile: &FreelancerProfile,
    job_description: &str,
) -> Result<String, AppError> {
    let system = build_system_prompt(profile, DEFAULT_GREETING, &[], &[]);
    let proposal = complete_proposal(llm, system, job_description, PLAIN_MAX_TOKENS)
        .await
        .map_err(|e| AppError::Llm(format!("Failed to generate proposal: {e}")))?;
    info!(
        "Generated proposal for job description ({} chars)",
        job_description.len()
    );
    Ok(proposal)
}

/// Generates a proposal citing `projects`. Falls back to plain generation
/// when the portfolio-aware call fails.
pub async fn generate_with_portfolio(
    llm: &dyn LanguageModel,
    profile: &FreelancerProfile,
    job_description: &str,
    projects: &[ProjectRef],
) -> Result<String, AppError> {
    if projects.is_empty() {
        return generate(llm, profile, job_description).await;
    }

    let system = build_system_prompt(profile, DEFAULT_GREETING, projects, &[]);
    match complete_proposal(llm, system, job_description, PORTFOLIO_MAX_TOKENS).await {
        Ok(proposal) => {
            info!(
                "Generated proposal with {} portfolio projects",
                projects.len()
            );
            Ok(splice_work_block(&proposal, &work_lines(projects, &[])))
        }
        Err(e) => {
            warn!("Portfolio-aware generation failed, falling back: {}", e);
            generate(llm, profile, job_description).await
        }
    }
}

/// Generates a proposal addressed to a named client, citing caller-selected
/// projects and the enabled profile links.
pub async fn generate_custom(
    llm: &dyn LanguageModel,
    profile: &FreelancerProfile,
    job_description: &str,
    custom: &CustomProposal,
) -> Result<String, AppError> {
    let greeting = greeting_for(custom.client_name.as_deref());
    let links = custom.external_links.resolve(profile);
    let system = build_system_prompt(profile, &greeting, &custom.selected_projects, &links);

    let proposal = complete_proposal(llm, system, job_description, CUSTOM_MAX_TOKENS)
        .await
        .map_err(|e| AppError::Llm(format!("Failed to generate proposal: {e}")))?;

    let lines = work_lines(&custom.selected_projects, &links);
    Ok(if lines.is_empty() {
        proposal
    } else {
        splice_work_block(&proposal, &lines)
    })
}

async fn complete_proposal(
    llm: &dyn LanguageModel,
    system: String,
    job_description: &str,
    max_tokens: u32,
) -> Result<String, LlmError> {
    let user = PROPOSAL_USER_TEMPLATE.replace("{job_description}", job_description);
    let request = ChatRequest::new(system, user)
        .max_tokens(max_tokens)
        .temperature(0.7);
    let text = llm.complete(&request).await?;
    Ok(clean_markdown(text.trim()))
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt building
// ────────────────────────────────────────────────────────────────────────────

fn greeting_for(client_name: Option<&str>) -> String {
    match client_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("{} {},", to_bold("Hi"), to_bold(name)),
        None => DEFAULT_GREETING.to_string(),
    }
}

fn signature(profile: &FreelancerProfile) -> String {
    format!(
        "{}\n{}\n{}",
        to_bold("Best Regards,"),
        to_bold(&profile.name),
        to_bold(&profile.title)
    )
}

fn build_system_prompt(
    profile: &FreelancerProfile,
    greeting: &str,
    projects: &[ProjectRef],
    external_links: &[ProfileLink],
) -> String {
    let project_mention = projects
        .first()
        .map(|p| PROJECT_MENTION_TEMPLATE.replace("{project}", &p.name))
        .unwrap_or_default();

    let mut sections = Vec::new();

    if !projects.is_empty() {
        let mut block = vec![SELECTED_PROJECTS_HEADER.to_string()];
        for project in projects {
            let summary: String = project.summary().chars().take(PROJECT_SUMMARY_CHARS).collect();
            block.push(format!("- {}: {}...", project.name, summary));
            if let Some(url) = &project.github_url {
                block.push(format!("  GitHub: {url}"));
            }
            if let Some(url) = &project.live_url {
                block.push(format!("  Live: {url}"));
            }
            if let Some(url) = &project.app_store_url {
                block.push(format!("  App Store: {url}"));
            }
        }
        sections.push(block.join("\n"));
    }

    if !external_links.is_empty() {
        sections.push(link_block(EXTERNAL_LINKS_HEADER, external_links));
    }

    if !profile.default_links.is_empty() {
        sections.push(link_block(DEFAULT_LINKS_HEADER, &profile.default_links));
    }

    let portfolio_section = if sections.is_empty() {
        String::new()
    } else {
        format!("\n{}\n", sections.join("\n\n"))
    };

    PROPOSAL_SYSTEM_TEMPLATE
        .replace("{name}", &profile.name)
        .replace("{greeting}", greeting)
        .replace("{project_mention}", &project_mention)
        .replace("{signature}", &signature(profile))
        .replace("{portfolio_section}", &portfolio_section)
}

fn link_block(header: &str, links: &[ProfileLink]) -> String {
    let mut block = vec![header.to_string()];
    block.extend(links.iter().map(|l| format!("- {}: {}", l.label, l.url)));
    block.join("\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Post-processing
// ────────────────────────────────────────────────────────────────────────────

/// Maps ASCII letters and digits to Mathematical Bold; everything else is kept.
pub fn to_bold(text: &str) -> String {
    text.chars()
        .map(|c| {
            let bold = match c {
                'A'..='Z' => char::from_u32(0x1D400 + (c as u32 - 'A' as u32)),
                'a'..='z' => char::from_u32(0x1D41A + (c as u32 - 'a' as u32)),
                '0'..='9' => char::from_u32(0x1D7CE + (c as u32 - '0' as u32)),
                _ => None,
            };
            bold.unwrap_or(c)
        })
        .collect()
}

/// Removes markdown bold: `**text**` becomes `text`, then stray `**` go.
pub fn clean_markdown(text: &str) -> String {
    let cleaned = BOLD_MARKDOWN.replace_all(text, "$1").replace("**", "");
    debug!("Cleaned markdown formatting from proposal text");
    cleaned
}

/// One `✔ name: url` line per project, then one per external link.
fn work_lines(projects: &[ProjectRef], links: &[ProfileLink]) -> Vec<String> {
    projects
        .iter()
        .map(|p| match p.primary_link() {
            Some(url) => format!("✔ {}: {}", p.name, url),
            None => format!("✔ {}", p.name),
        })
        .chain(links.iter().map(|l| format!("✔ {}: {}", l.label, l.url)))
        .collect()
}

/// Inserts the work block before the first bold "Best Regards", or appends it.
pub fn splice_work_block(proposal: &str, lines: &[String]) -> String {
    let block = format!("\n\n{}\n{}\n", ADDITIONAL_WORK_HEADING, lines.join("\n"));
    let marker = to_bold("Best Regards");
    match proposal.find(&marker) {
        Some(idx) => format!("{}{}\n{}", &proposal[..idx], block, &proposal[idx..]),
        None => format!("{proposal}{block}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Job metadata
// ────────────────────────────────────────────────────────────────────────────

const BUDGET_KEYWORDS: [&str; 6] = ["$", "budget", "pay", "rate", "price", "cost"];
const DURATION_KEYWORDS: [&str; 4] = ["duration", "timeline", "week", "month"];

/// Keyword heuristics over the description's lines. No LLM call.
pub fn extract_job_metadata(job_description: &str) -> JobMetadata {
    let lines: Vec<&str> = job_description.lines().collect();

    let job_title = lines
        .iter()
        .take(5)
        .map(|l| l.trim())
        .find(|l| {
            let len = l.chars().count();
            len > 10 && len < 100
        })
        .map(str::to_string);

    JobMetadata {
        job_title,
        budget_range: first_line_mentioning(&lines, &BUDGET_KEYWORDS),
        project_duration: first_line_mentioning(&lines, &DURATION_KEYWORDS),
    }
}

fn first_line_mentioning(lines: &[&str], keywords: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|line| {
            let lower = line.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .map(|line| line.trim().chars().take(METADATA_LINE_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    fn profile() -> FreelancerProfile {
        FreelancerProfile {
            name: "Sam Lee".to_string(),
            title: "Top Rated Freelancer".to_string(),
            github_url: Some("https://github.com/samlee".to_string()),
            stackoverflow_url: None,
            website_url: Some("https://samlee.dev".to_string()),
            default_links: vec![ProfileLink {
                label: "Android".to_string(),
                url: "https://play.google.com/store/apps/details?id=x".to_string(),
            }],
        }
    }

    fn project(name: &str, github: Option<&str>, live: Option<&str>) -> ProjectRef {
        ProjectRef {
            name: name.to_string(),
            ai_summary: Some(format!("{name} summary")),
            github_url: github.map(str::to_string),
            live_url: live.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_bold_maps_letters_and_digits() {
        assert_eq!(to_bold("Hi there,"), DEFAULT_GREETING);
        assert_eq!(to_bold("Additional Relevant Work:"), ADDITIONAL_WORK_HEADING);
        assert_eq!(to_bold("A1"), "𝐀𝟏");
        assert_eq!(to_bold("é-!"), "é-!");
    }

    #[test]
    fn test_clean_markdown_strips_emphasis() {
        assert_eq!(
            clean_markdown("**Hello** there, **my** friend"),
            "Hello there, my friend"
        );
        assert_eq!(clean_markdown("dangling ** marker"), "dangling  marker");
        assert_eq!(clean_markdown("no markup"), "no markup");
    }

    #[test]
    fn test_splice_places_block_before_signature() {
        let proposal = format!("Intro text.\n\n{}\n{}", to_bold("Best Regards,"), to_bold("Sam"));
        let lines = vec!["✔ Burger Lab: https://github.com/x/burger".to_string()];

        let spliced = splice_work_block(&proposal, &lines);

        let heading = spliced.find(ADDITIONAL_WORK_HEADING).unwrap();
        let item = spliced.find("✔ Burger Lab").unwrap();
        let signature = spliced.find(&to_bold("Best Regards")).unwrap();
        assert!(heading < item && item < signature);
        assert!(spliced.starts_with("Intro text."));
        assert!(spliced.ends_with(&to_bold("Sam")));
    }

    #[test]
    fn test_splice_appends_when_signature_missing() {
        let lines = vec!["✔ Shop".to_string()];
        let spliced = splice_work_block("Intro text.", &lines);
        assert_eq!(
            spliced,
            format!("Intro text.\n\n{ADDITIONAL_WORK_HEADING}\n✔ Shop\n")
        );
    }

    #[test]
    fn test_work_lines_use_first_non_blank_link() {
        let projects = vec![
            project("Burger Lab", None, Some("https://burgerlab.example")),
            project("CLI", None, None),
            project("Blank GitHub", Some(" "), Some("https://shop.example")),
        ];
        let links = vec![ProfileLink {
            label: "GitHub".to_string(),
            url: "https://github.com/samlee".to_string(),
        }];
        assert_eq!(
            work_lines(&projects, &links),
            vec![
                "✔ Burger Lab: https://burgerlab.example",
                "✔ CLI",
                "✔ Blank GitHub: https://shop.example",
                "✔ GitHub: https://github.com/samlee",
            ]
        );
    }

    #[test]
    fn test_system_prompt_lists_projects_and_signature() {
        let projects = vec![project("Burger Lab", Some("https://github.com/x/burger"), None)];
        let prompt = build_system_prompt(&profile(), DEFAULT_GREETING, &projects, &[]);

        assert!(prompt.starts_with("You are Sam Lee,"));
        assert!(prompt.contains("Mention one relevant project briefly: Burger Lab"));
        assert!(prompt.contains("- Burger Lab: Burger Lab summary..."));
        assert!(prompt.contains("  GitHub: https://github.com/x/burger"));
        assert!(prompt.contains(&to_bold("Top Rated Freelancer")));
        assert!(prompt.contains("- Android: https://play.google.com/store/apps/details?id=x"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_system_prompt_without_projects_has_no_mention() {
        let prompt = build_system_prompt(&FreelancerProfile::default(), DEFAULT_GREETING, &[], &[]);
        assert!(!prompt.contains("Mention one relevant project"));
        assert!(!prompt.contains("PORTFOLIO INTEGRATION"));
    }

    #[test]
    fn test_project_summary_is_truncated_in_prompt() {
        let mut long = project("Big", None, None);
        long.ai_summary = Some("y".repeat(300));
        let prompt = build_system_prompt(&profile(), DEFAULT_GREETING, &[long], &[]);
        assert!(prompt.contains(&format!("- Big: {}...", "y".repeat(100))));
        assert!(!prompt.contains(&"y".repeat(101)));
    }

    #[test]
    fn test_greeting_addresses_client() {
        assert_eq!(greeting_for(Some("John")), format!("{} {},", to_bold("Hi"), to_bold("John")));
        assert_eq!(greeting_for(Some("  ")), DEFAULT_GREETING);
        assert_eq!(greeting_for(None), DEFAULT_GREETING);
    }

    #[test]
    fn test_external_links_need_toggle_and_url() {
        let toggles = ExternalLinks {
            github: true,
            stackoverflow: true,
            website: false,
        };
        let links = toggles.resolve(&profile());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "GitHub");
    }

    #[test]
    fn test_extract_job_metadata() {
        let jd = "Hi\nFlutter developer for food delivery app\n\
                  We need someone experienced with Firebase.\n\
                  Budget: $2,000 - $3,000 fixed\n\
                  Timeline: about 6 weeks";
        let metadata = extract_job_metadata(jd);
        assert_eq!(
            metadata.job_title.as_deref(),
            Some("Flutter developer for food delivery app")
        );
        assert_eq!(
            metadata.budget_range.as_deref(),
            Some("Budget: $2,000 - $3,000 fixed")
        );
        assert_eq!(
            metadata.project_duration.as_deref(),
            Some("Timeline: about 6 weeks")
        );
    }

    #[test]
    fn test_extract_job_metadata_without_matches() {
        let metadata = extract_job_metadata("short\nlines only");
        assert_eq!(metadata, JobMetadata::default());
    }

    #[test]
    fn test_metadata_lines_are_truncated() {
        let jd = format!("Budget {}", "9".repeat(200));
        let metadata = extract_job_metadata(&jd);
        assert_eq!(metadata.budget_range.unwrap().chars().count(), 100);
    }

    #[tokio::test]
    async fn test_generate_with_portfolio_cleans_and_splices() {
        let reply = format!(
            "**{}**\nI can build this.\n\n{}\n{}",
            DEFAULT_GREETING,
            to_bold("Best Regards,"),
            to_bold("Sam Lee")
        );
        let model = ScriptedModel::new().reply(&reply);
        let projects = vec![project("Burger Lab", Some("https://github.com/x/burger"), None)];

        let proposal = generate_with_portfolio(&model, &profile(), "Build a food app", &projects)
            .await
            .unwrap();

        assert!(!proposal.contains("**"));
        assert!(proposal.starts_with(DEFAULT_GREETING));
        let item = proposal.find("✔ Burger Lab: https://github.com/x/burger").unwrap();
        assert!(item < proposal.find(&to_bold("Best Regards")).unwrap());

        let sent = model.last_request().unwrap();
        assert_eq!(sent.max_tokens, PORTFOLIO_MAX_TOKENS);
        assert_eq!(sent.messages[0].content, "Job Description:\nBuild a food app");
    }

    #[tokio::test]
    async fn test_generate_with_portfolio_falls_back_to_plain() {
        // Nothing scripted: both the portfolio call and the fallback fail
        let model = ScriptedModel::new();
        let result =
            generate_with_portfolio(&model, &profile(), "Build a food app", &[project("P", None, None)])
                .await;
        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(model.requests.lock().unwrap().len(), 2);
        assert_eq!(
            model.requests.lock().unwrap()[1].max_tokens,
            PLAIN_MAX_TOKENS
        );
    }

    #[tokio::test]
    async fn test_generate_custom_addresses_client_and_lists_links() {
        let model = ScriptedModel::new().reply("Proposal body without signature");
        let custom = CustomProposal {
            client_name: Some("John".to_string()),
            selected_projects: vec![],
            external_links: ExternalLinks {
                github: true,
                ..Default::default()
            },
        };

        let proposal = generate_custom(&model, &profile(), "Build an API", &custom)
            .await
            .unwrap();

        assert!(proposal.ends_with("✔ GitHub: https://github.com/samlee\n"));
        let sent = model.last_request().unwrap();
        assert!(sent.system.contains(&to_bold("John")));
        assert!(sent.system.contains("EXTERNAL PROFILE LINKS"));
    }
}
