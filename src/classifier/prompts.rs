//! Prompt template for screenshot analysis

/// Builder for the WCAG analysis instruction sent with each screenshot
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisPrompt {
    extended_analysis: bool,
    web_grounding: bool,
}

const BASE_PROMPT: &str = "\
Analyze this screenshot of a website for WCAG 2.1 AA accessibility issues.

Return ONLY a valid JSON object with this exact shape:
{
  \"issues\": [
    {
      \"wcag_id\": \"dotted success criterion number, e.g. 1.4.3\",
      \"principle\": \"Perceivable | Operable | Understandable | Robust\",
      \"icon\": \"error | warning | info\",
      \"title\": \"short issue name\",
      \"description\": \"what is wrong\",
      \"severity\": \"CRITICAL | MAJOR | MINOR | INFO\",
      \"element\": \"where on the page the issue appears\",
      \"howToFix\": \"code or instructions to fix\",
      \"whyMatters\": \"why this matters for accessibility\",
      \"confidence\": 0.0
    }
  ],
  \"grounding_sources\": [],
  \"overall_assessment\": \"one paragraph summary\"
}

\"confidence\" is a float between 0.0 and 1.0 saying how sure you are.
If no issues are found, return an empty \"issues\" array.";

const EXTENDED_GUIDANCE: &str = "\
Work through every WCAG 2.1 A and AA success criterion that can be judged \
from a static image (text alternatives, contrast, text resizing, focus \
visibility, headings and labels, link purpose, error identification) before \
answering. Only report issues visible in the screenshot.";

const GROUNDING_GUIDANCE: &str = "\
List in \"grounding_sources\" the W3C reference URLs (Understanding WCAG 2.1 \
or Techniques pages) that support the issues you report.";

impl AnalysisPrompt {
    pub fn new(extended_analysis: bool, web_grounding: bool) -> Self {
        Self {
            extended_analysis,
            web_grounding,
        }
    }

    pub fn render(&self) -> String {
        let mut prompt = String::from(BASE_PROMPT);
        if self.extended_analysis {
            prompt.push_str("\n\n");
            prompt.push_str(EXTENDED_GUIDANCE);
        }
        if self.web_grounding {
            prompt.push_str("\n\n");
            prompt.push_str(GROUNDING_GUIDANCE);
        }
        prompt
    }
}
