//! Prompt templates and the university agent registry.
//!
//! Templates carry two placeholders: [`CONTENT_PLACEHOLDER`] for the combined
//! page text and [`DOMAIN_PLACEHOLDER`] for the site's domain.

pub const CONTENT_PLACEHOLDER: &str = "{{WEBSITE_SCRAPED_CONTENT}}";
pub const DOMAIN_PLACEHOLDER: &str = "${domain}";

/// Marker every template asks the model to put before its final JSON
pub const ANSWER_PREFIX: &str = "Answer:";

pub const BUSINESS_PROFILE_PROMPT: &str = r#"You are a meticulous web-content analyst.
Read the text after the line `---SCRAPED TEXT START---` and do **not** copy that text verbatim.
Instead, fill the following JSON schema **exactly** (no extra keys, no comments):

{
    "type": "object",
    "title": "WebsiteProfile",
    "properties": {
        "businessOverview":         { "type": "string" },
        "uniqueSellingPoints":      { "type": "array", "items": { "type": "string" } },
        "servicesProducts":         { "type": "array", "items": { "type": "string" } },
        "brandVoice":               { "type": "string" },
        "valuePropositions":        { "type": "array", "items": { "type": "string" } },
        "providedServicesProducts": { "type": "string",
                                      "description": "Two or more paragraphs answering: What services or products does your business provide?" },
        "competitiveDifference":    { "type": "string",
                                      "description": "Two or more paragraphs answering: How are you different from your competitors?" },
        "mostProfitableLineItems":  { "type": "string",
                                      "description": "Two or more paragraphs answering: What are your most profitable line items?" }
    },
    "required": [
        "businessOverview",
        "uniqueSellingPoints",
        "servicesProducts",
        "brandVoice",
        "valuePropositions",
        "providedServicesProducts",
        "competitiveDifference",
        "mostProfitableLineItems"
    ]
}

Rules:
* Output **only** valid JSON (no markdown fencing, no explanatory prose).
* Each array must have **exactly 5 elements**.
* For providedServicesProducts, competitiveDifference, and mostProfitableLineItems
  write **at least two paragraphs**, separated by a blank line, max three sentences each.
* If the answer is unknown, output an empty string ("") or an empty array ([]) as appropriate.
* Think step by step, but at the end, return only the final answer prefixed with Answer:

---SCRAPED TEXT START---
{{WEBSITE_SCRAPED_CONTENT}}
---SCRAPED TEXT END---"#;

pub const BUSINESS_ENGAGEMENT_PROMPT: &str = r#"You write sales and chat copy for the website below.
Read the text after the line `---SCRAPED TEXT START---` and fill the following JSON schema **exactly**:

{
    "type": "object",
    "title": "WebsiteEngagement",
    "properties": {
        "bestSalesLines": { "type": "array", "items": { "type": "string" } },
        "greetings": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Five friendly welcome messages, each ending with a question to spark conversation. Feel free to use ${domain} as a placeholder."
        }
    },
    "required": ["bestSalesLines", "greetings"]
}

Rules:
* Output **only** valid JSON (no markdown fencing, no explanatory prose).
* bestSalesLines must have **exactly 5 elements**, grounded in the site's own offers.
* greetings must be five concise, friendly welcome lines (1-2 sentences each).
  You *may* insert **${domain}** anywhere to reference the site dynamically.
* If the answer is unknown, output an empty array ([]).
* Think step by step, but at the end, return only the final answer prefixed with Answer:

---SCRAPED TEXT START---
{{WEBSITE_SCRAPED_CONTENT}}
---SCRAPED TEXT END---"#;

pub const UNIVERSITY_GENERAL_PROMPT: &str = r#"You are a higher-education research analyst. Review the scraped website text and return a JSON object that fills the schema below with grounded insights. Do not hallucinate. Use empty strings or empty arrays when you cannot find information.

{
    "type": "object",
    "title": "UniversityGeneralKnowledge",
    "properties": {
        "institutionOverview":         { "type": "string" },
        "keyDifferentiators":          { "type": "array", "items": { "type": "string" } },
        "availableProgramsAndDegrees": { "type": "array", "items": { "type": "string" } },
        "admissionsProcess":           { "type": "string" },
        "tuitionAndFees":              { "type": "string" },
        "campusSafety":                { "type": "string" },
        "campusLife":                  { "type": "string" },
        "financialAidOptions":         { "type": "string" },
        "scholarshipsAndGrants":       { "type": "string" },
        "studentSupportServices":      { "type": "string" },
        "communicationTone":           { "type": "string" },
        "aiGreetings":                 { "type": "array", "items": { "type": "string" } },
        "frequentlyAskedQuestions":    { "type": "array",
                                         "items": {
                                             "type": "object",
                                             "properties": {
                                                 "question": { "type": "string" },
                                                 "answer":   { "type": "string" }
                                             },
                                             "required": ["question", "answer"]
                                         } },
        "resourceLinks":               { "type": "array",
                                         "items": {
                                             "type": "object",
                                             "properties": {
                                                 "label": { "type": "string" },
                                                 "url":   { "type": "string" }
                                             },
                                             "required": ["label", "url"]
                                         } }
    }
}

Rules:
- Every array must contain 3 concise items unless a field naturally needs more. For aiGreetings, provide exactly 5 friendly one-line greetings and you may reference ${domain}.
- Frequently asked questions must contain at least 5 relevant Q&A pairs; keep answers to 2 short paragraphs or fewer.
- Resource links should list up to 5 useful URLs with descriptive labels pulled from the site.
- If a value is not available, use "" or [] as appropriate.
- Output JSON only (no markdown, no commentary), prefixed with Answer:

---SCRAPED TEXT START---
{{WEBSITE_SCRAPED_CONTENT}}
---SCRAPED TEXT END---"#;

const RECRUITER_PROMPT: &str = r#"You curate specialized insights for the Recruiter AI agent. Study the scraped text and populate the JSON schema below with grounded data. Do not add extra keys. Use empty strings or arrays when details are unavailable.

{
    "type": "object",
    "title": "RecruiterAISpecialization",
    "properties": {
        "recruitmentHighlights":    { "type": "array", "items": { "type": "string" } },
        "strategicEnrollmentGoals": { "type": "array", "items": { "type": "string" } },
        "targetDemographics":       { "type": "array", "items": { "type": "string" } },
        "keyMessaging":             { "type": "array", "items": { "type": "string" } },
        "featuredCoursesOrMajors":  { "type": "array", "items": { "type": "string" } },
        "applicationDeadlines":     { "type": "array", "items": { "type": "string" } },
        "regionalEventsAndVisits":  { "type": "array", "items": { "type": "string" } }
    }
}

Rules:
- Each array should list 3-5 concise bullet points summarizing the topic.
- Use explicit term names, regions, or audiences whenever available.
- Output JSON only (no markdown, no commentary), prefixed with Answer:

---SCRAPED TEXT START---
{{WEBSITE_SCRAPED_CONTENT}}
---SCRAPED TEXT END---"#;

const ADMISSIONS_PROMPT: &str = r#"You curate specialized insights for the Admissions AI agent. Study the scraped text and populate the JSON schema below with grounded data. Do not add extra keys. Use empty strings or arrays when details are unavailable.

{
    "type": "object",
    "title": "AdmissionsAISpecialization",
    "properties": {
        "admissionsRequirements":         { "type": "array", "items": { "type": "string" } },
        "applicationProcessSteps":        { "type": "array", "items": { "type": "string" } },
        "requiredDocuments":              { "type": "array", "items": { "type": "string" } },
        "internationalStudentGuidelines": { "type": "string" },
        "standardizedTestPolicies":       { "type": "string" },
        "transferCreditsPolicy":          { "type": "string" }
    }
}

Rules:
- Provide applicationProcessSteps as an ordered list describing each step succinctly.
- Use bullet-style strings for requirements and required documents.
- Summaries should stay within two short paragraphs when a field is a string.
- Output JSON only (no markdown, no commentary), prefixed with Answer:

---SCRAPED TEXT START---
{{WEBSITE_SCRAPED_CONTENT}}
---SCRAPED TEXT END---"#;

const FINANCIAL_AID_PROMPT: &str = r#"You curate specialized insights for the Financial Aid AI agent. Study the scraped text and populate the JSON schema below with grounded data. Do not add extra keys. Use empty strings or arrays when details are unavailable.

{
    "type": "object",
    "title": "FinancialAidAISpecialization",
    "properties": {
        "typesOfAidAvailable":            { "type": "array", "items": { "type": "string" } },
        "financialAidApplicationProcess": { "type": "string" },
        "FAFSADetails":                   { "type": "string" },
        "scholarshipCriteria":            { "type": "array", "items": { "type": "string" } },
        "paymentPlans":                   { "type": "string" },
        "financialAidDeadlines":          { "type": "array", "items": { "type": "string" } },
        "workStudyPrograms":              { "type": "string" }
    }
}

Rules:
- Highlight concrete program names, eligibility criteria, and deadlines whenever they appear.
- For arrays, include 3-5 focused bullet points.
- Keep string fields to two short paragraphs or fewer.
- Output JSON only (no markdown, no commentary), prefixed with Answer:

---SCRAPED TEXT START---
{{WEBSITE_SCRAPED_CONTENT}}
---SCRAPED TEXT END---"#;

const ATHLETICS_PROMPT: &str = r#"You curate specialized insights for the Athletics AI agent. Study the scraped text and populate the JSON schema below with grounded data. Do not add extra keys. Use empty strings or arrays when details are unavailable.

{
    "type": "object",
    "title": "AthleticsAISpecialization",
    "properties": {
        "athleticProgramsOffered":       { "type": "array", "items": { "type": "string" } },
        "scholarshipOpportunities":      { "type": "string" },
        "recruitmentProcessForAthletes": { "type": "string" },
        "athleticFacilitiesInfo":        { "type": "string" },
        "eligibilityRequirements":       { "type": "array", "items": { "type": "string" } },
        "gameSchedulesAndResults":       { "type": "string" }
    }
}

Rules:
- When possible, call out specific sports, facilities, or events.
- Limit string fields to two concise paragraphs.
- Output JSON only (no markdown, no commentary), prefixed with Answer:

---SCRAPED TEXT START---
{{WEBSITE_SCRAPED_CONTENT}}
---SCRAPED TEXT END---"#;

const CAMPUS_LIFE_PROMPT: &str = r#"You curate specialized insights for the Campus Life AI agent. Study the scraped text and populate the JSON schema below with grounded data. Do not add extra keys. Use empty strings or arrays when details are unavailable.

{
    "type": "object",
    "title": "CampusLifeAISpecialization",
    "properties": {
        "housingAndDiningOptions":       { "type": "string" },
        "studentOrganizations":          { "type": "array", "items": { "type": "string" } },
        "campusEventsCalendar":          { "type": "string" },
        "wellnessAndHealthServices":     { "type": "string" },
        "campusRecreationOptions":       { "type": "string" },
        "diversityAndInclusionPrograms": { "type": "string" },
        "studentConductAndSupport":      { "type": "string" }
    }
}

Rules:
- Arrays should list 3-5 notable items or groups.
- Keep narrative fields within two short paragraphs.
- Output JSON only (no markdown, no commentary), prefixed with Answer:

---SCRAPED TEXT START---
{{WEBSITE_SCRAPED_CONTENT}}
---SCRAPED TEXT END---"#;

/// A specialized university agent and the prompt that feeds it
#[derive(Debug)]
pub struct AgentType {
    pub key: &'static str,
    pub display_name: &'static str,
    pub aliases: &'static [&'static str],
    pub template: &'static str,
}

pub static AGENT_TYPES: [AgentType; 5] = [
    AgentType {
        key: "recruiter_ai",
        display_name: "Recruiter AI",
        aliases: &["recruiter", "recruiter ai", "recruitment"],
        template: RECRUITER_PROMPT,
    },
    AgentType {
        key: "admissions_ai",
        display_name: "Admissions AI",
        aliases: &["admissions", "admissions ai", "admission"],
        template: ADMISSIONS_PROMPT,
    },
    AgentType {
        key: "financial_aid_ai",
        display_name: "Financial Aid AI",
        aliases: &["financial aid", "financial aid ai"],
        template: FINANCIAL_AID_PROMPT,
    },
    AgentType {
        key: "athletics_ai",
        display_name: "Athletics AI",
        aliases: &["athletics", "athletics ai", "sports"],
        template: ATHLETICS_PROMPT,
    },
    AgentType {
        key: "campus_life_ai",
        display_name: "Campus Life AI",
        aliases: &["campus life", "campus", "campus life ai"],
        template: CAMPUS_LIFE_PROMPT,
    },
];

/// Map a loosely written agent label to its registry entry.
///
/// Case, `_`, `-`, and repeated whitespace are ignored, so `Financial-Aid`,
/// `financial_aid_ai`, and `financial aid` all resolve to the same agent.
pub fn resolve_agent(label: &str) -> Option<&'static AgentType> {
    let normalized = label
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if normalized.is_empty() {
        return None;
    }

    AGENT_TYPES.iter().find(|agent| {
        normalized == agent.key.replace('_', " ")
            || normalized == agent.display_name.to_lowercase()
            || agent.aliases.contains(&normalized.as_str())
    })
}

/// Canonical agent keys, for error messages listing the valid choices
pub fn agent_keys() -> Vec<&'static str> {
    AGENT_TYPES.iter().map(|agent| agent.key).collect()
}

/// Fill a template with the combined page text and, when known, the site's domain.
///
/// Without a domain the placeholder stays in the prompt so the model can echo
/// it back for the client to substitute.
pub fn render(template: &str, content: &str, domain: Option<&str>) -> String {
    // Domain first: scraped text may itself contain the domain placeholder.
    let template = match domain {
        Some(domain) => template.replace(DOMAIN_PLACEHOLDER, domain),
        None => template.to_string(),
    };
    template.replace(CONTENT_PLACEHOLDER, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_agent_normalizes_labels() {
        for label in ["financial_aid_ai", "Financial-Aid", "  financial   aid ", "Financial Aid AI"] {
            assert_eq!(resolve_agent(label).map(|a| a.key), Some("financial_aid_ai"), "{label}");
        }
        assert_eq!(resolve_agent("sports").map(|a| a.key), Some("athletics_ai"));
        assert_eq!(resolve_agent("CAMPUS").map(|a| a.key), Some("campus_life_ai"));
        assert!(resolve_agent("").is_none());
        assert!(resolve_agent("janitor").is_none());
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let rendered = render(UNIVERSITY_GENERAL_PROMPT, "H1: Hello ${domain}", Some("example.edu"));
        assert!(rendered.contains("H1: Hello ${domain}"));
        assert!(rendered.contains("you may reference example.edu."));
        assert!(!rendered.contains(CONTENT_PLACEHOLDER));

        let rendered = render(BUSINESS_ENGAGEMENT_PROMPT, "H1: Hello", None);
        assert!(rendered.contains("Feel free to use ${domain} as a placeholder"));
    }

    #[test]
    fn test_every_template_has_content_slot() {
        let templates = [BUSINESS_PROFILE_PROMPT, BUSINESS_ENGAGEMENT_PROMPT, UNIVERSITY_GENERAL_PROMPT]
            .into_iter()
            .chain(AGENT_TYPES.iter().map(|agent| agent.template));
        for template in templates {
            assert!(template.contains(CONTENT_PLACEHOLDER));
            assert!(template.contains(ANSWER_PREFIX));
        }
    }
}
