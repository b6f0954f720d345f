//! Instruction templates, one per user-selectable analysis.
//!
//! Each template fixes the model's persona and the shape of its answer. They
//! are process-wide constants: the only input to the lookup is the
//! [`Action`], so the catalog is pure and cannot fail.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Overall evaluation of the resume against the job description.
pub const ABOUT_RESUME_PROMPT: &str = r#"You are an experienced technical HR manager and a skilled ATS (Applicant Tracking System) scanner with a deep understanding of data science, data analytics, AI & ML and ATS functionality. Your task is to evaluate the resume against the provided job description. Share your professional evaluation of whether the profile aligns with the role: highlight the strengths and weaknesses of the resume in relation to the specified job requirements, and finish with your final thoughts. Use you/your/yours pronouns to refer to the person whose resume you are checking."#;

/// Percentage match, then missing keywords, then final thoughts.
pub const PERCENTAGE_MATCH_PROMPT: &str = r#"You are a skilled ATS (Applicant Tracking System) scanner with expertise in data science, data analytics, AI, and ML, as well as a strong understanding of ATS functionality. Your task is to assess the resume against the provided job description. First, output the percentage match between the resume and the job description. Next, list any missing keywords, and finally, provide your overall thoughts on the candidate's suitability for the role. Use you/your/yours pronouns to refer to the person whose resume you are checking."#;

/// Skill gaps and what to learn next.
pub const IMPROVE_SKILLS_PROMPT: &str = r#"You are a skilled career advisor with expertise in data science, data analytics, AI, ML, and computer science. Your task is to review the candidate's resume in comparison to the job description provided and identify any skill gaps or areas for improvement. Based on these gaps, recommend specific skills, tools, or technologies the candidate should develop to better align with the role requirements. Please explain why these improvements are relevant to the job description. Use you/your/yours pronouns to refer to the person whose resume you are checking."#;

/// Keywords present in the job description but absent from the resume.
pub const MISSING_KEYWORDS_PROMPT: &str = r#"You are an advanced ATS scanner specialized in data science, data analytics, AI, ML, and technical roles. Your task is to analyze the candidate's resume and identify any critical keywords or phrases missing when compared to the job description provided. After identifying these keywords, list them along with a brief explanation of their importance in relation to the role. Use you/your/yours pronouns to refer to the person whose resume you are checking."#;

/// One of the four analyses a user can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// "Tell me about my resume"
    AboutResume,
    /// "Percentage match"
    PercentageMatch,
    /// "How can I improve my skills?"
    ImproveSkills,
    /// "What are the keywords that are missing?"
    MissingKeywords,
}

impl Action {
    /// Every action, in menu order.
    pub const ALL: [Action; 4] = [
        Action::AboutResume,
        Action::ImproveSkills,
        Action::MissingKeywords,
        Action::PercentageMatch,
    ];

    /// The instruction template sent with this action.
    pub fn instruction(self) -> &'static str {
        instruction_for(self)
    }

    /// Button caption shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Action::AboutResume => "Tell me about my resume",
            Action::PercentageMatch => "Percentage match",
            Action::ImproveSkills => "How can I improve my skills?",
            Action::MissingKeywords => "What are the keywords that are missing?",
        }
    }

    /// Stable command-line identifier.
    pub fn slug(self) -> &'static str {
        match self {
            Action::AboutResume => "about-resume",
            Action::PercentageMatch => "percentage-match",
            Action::ImproveSkills => "improve-skills",
            Action::MissingKeywords => "missing-keywords",
        }
    }
}

/// Look up the instruction template for an action.
pub fn instruction_for(action: Action) -> &'static str {
    match action {
        Action::AboutResume => ABOUT_RESUME_PROMPT,
        Action::PercentageMatch => PERCENTAGE_MATCH_PROMPT,
        Action::ImproveSkills => IMPROVE_SKILLS_PROMPT,
        Action::MissingKeywords => MISSING_KEYWORDS_PROMPT,
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Accepts a slug (`percentage-match`) or a 1-based menu number (`4`).
impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Ok(n) = s.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| Action::ALL.get(i).copied())
                .ok_or_else(|| format!("menu choice must be 1–{}, got {n}", Action::ALL.len()));
        }
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.slug() == s || a.slug().replace('-', "_") == s)
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_is_complete_and_distinct() {
        let prompts: HashSet<&str> = Action::ALL.iter().map(|a| a.instruction()).collect();
        assert_eq!(prompts.len(), 4);
        assert!(prompts.iter().all(|p| !p.trim().is_empty()));
    }

    #[test]
    fn percentage_match_leads_with_percentage() {
        let p = instruction_for(Action::PercentageMatch);
        let pct = p.find("percentage match").expect("mentions percentage");
        let kw = p.find("missing keywords").expect("mentions keywords");
        assert!(pct < kw);
    }

    #[test]
    fn parse_slugs_and_numbers() {
        assert_eq!("percentage-match".parse::<Action>(), Ok(Action::PercentageMatch));
        assert_eq!("MISSING_KEYWORDS".parse::<Action>(), Ok(Action::MissingKeywords));
        assert_eq!("1".parse::<Action>(), Ok(Action::AboutResume));
        assert_eq!("4".parse::<Action>(), Ok(Action::PercentageMatch));
        assert!("0".parse::<Action>().is_err());
        assert!("5".parse::<Action>().is_err());
        assert!("summarise".parse::<Action>().is_err());
    }

    #[test]
    fn slug_round_trips_through_display() {
        for a in Action::ALL {
            assert_eq!(a.to_string().parse::<Action>(), Ok(a));
        }
    }

    #[test]
    fn serde_uses_slugs() {
        let json = serde_json::to_string(&Action::ImproveSkills).unwrap();
        assert_eq!(json, "\"improve-skills\"");
    }
}
