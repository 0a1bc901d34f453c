// Prompt constants for portfolio analysis.
// Reuses the JSON-only fragment from llm_client::prompts.

/// Metadata extraction instructions. Sent through `llm_client::prompts::json_only`.
pub const METADATA_INSTRUCTIONS: &str = r#"You are a technical project analyst. Analyze the given project and extract structured metadata.

Return a JSON object with these exact keys:
{
  "tags": ["tag1", "tag2", "tag3"],
  "technologies": ["tech1", "tech2", "tech3"],
  "project_type": "web_app|mobile_app|api|desktop_app|game|ai_ml|other",
  "complexity_level": "beginner|intermediate|advanced|expert"
}

Guidelines:
- tags: 5-8 relevant keywords (e.g., "e-commerce", "real-time", "responsive", "authentication")
- technologies: Specific technologies, frameworks, languages mentioned or implied
- project_type: Choose the most appropriate category
- complexity_level: Based on technical scope and features described"#;

/// Replace `{name}` and `{description}` before sending.
pub const METADATA_PROMPT_TEMPLATE: &str = "Project Name: {name}\n\nProject Description: {description}";

pub const SUMMARY_SYSTEM: &str = "Create a concise, professional summary of this project in 2-3 sentences. \
Focus on:
1. What the project does/solves
2. Key technical highlights
3. Main technologies used

Keep it under 100 words and make it suitable for a portfolio.";

/// Replace `{name}` and `{description}` before sending.
pub const SUMMARY_PROMPT_TEMPLATE: &str = "Project: {name}\n\nDescription: {description}";
