//! The instruction prompt sent with every uploaded report.
//!
//! The dashboard reads exactly the section and field names listed here, so
//! the prompt spells them out verbatim. Changing a key in this prompt means
//! changing the matching [`crate::result::TextField`] or
//! [`crate::result::ListField`] too.
//!
//! Callers can override the prompt via [`crate::config::AnalysisConfig::prompt`];
//! the constant here is used only when no override is provided.

/// Default analysis prompt.
pub const ANALYST_PROMPT: &str = r#"You are a senior financial analyst. Analyze the attached PDF document.

CRITICAL INSTRUCTION: Return valid JSON only. No Markdown.

EXTRACT THESE FIELDS:
1. Meta: Company Name, Quarter/Period.
2. Sentiment: Tone (Optimistic/Cautious/etc), Confidence Score, and Rationale.
3. Key Takeaways: List of 3-5 Positives and 3-5 Concerns.
4. Guidance: Revenue, Margin, and Capex outlooks.
5. Operational: Capacity Utilization and New Growth Initiatives.

Use exactly this shape, with string values unless a list is shown:
{
  "Meta": {"Company Name": "", "Quarter/Period": ""},
  "Sentiment": {"Tone": "", "Confidence Score": "", "Rationale": ""},
  "Key Takeaways": {"Positives": [""], "Concerns": [""]},
  "Guidance": {"Revenue": "", "Margin": "", "Capex": ""},
  "Operational": {"Capacity Utilization": "", "New Growth Initiatives": ""}
}
If the document does not state a value, use "N/A"."#;
