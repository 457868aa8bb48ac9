// LLM prompt templates for resume analysis.

/// System instruction for resume analysis — enforces JSON-only output.
pub const ANALYSIS_SYSTEM: &str = "You are an expert technical recruiter. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Describes the exact output schema. Embedded into the prompt template.
pub const FORMAT_INSTRUCTIONS: &str = r#"The output MUST be a JSON object with exactly these fields (no extra fields):
{
  "name": "string, candidate's full name, or \"N/A\"",
  "email": "string, or \"N/A\"",
  "phone": "string, or \"N/A\"",
  "linkedin_url": "string, or \"N/A\"",
  "portfolio_url": "string, or \"N/A\"",
  "summary": "string, two or three sentence professional summary, or \"N/A\"",
  "work_experience": [
    {
      "role": "string",
      "company": "string",
      "duration": "string, e.g. \"Jan 2020 - Mar 2023\"",
      "description": ["string, one line per responsibility or achievement"]
    }
  ],
  "education": [
    {"degree": "string", "institution": "string", "graduation_year": "string"}
  ],
  "technical_skills": ["string"],
  "soft_skills": ["string"],
  "projects": ["string"],
  "certifications": ["string"],
  "resume_rating": "integer between 1 and 10 (required)",
  "improvement_areas": "string, constructive feedback on what to improve (required)",
  "upskill_suggestions": ["string, a specific skill worth learning next"]
}
Use empty arrays for list fields with no entries. Never use null."#;

/// Resume analysis prompt template. Replace `{format_instructions}` and
/// `{resume_text}` before sending.
pub const RESUME_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following resume and extract all key information.
Also, provide constructive feedback on areas for improvement and suggest specific skills for upskilling based on the resume content.
Rate the resume overall with an integer from 1 (poor) to 10 (excellent).

Return the output as a valid JSON object.

{format_instructions}

Resume Text:
{resume_text}"#;

/// Builds the analysis prompt for one resume.
pub fn build_analysis_prompt(resume_text: &str) -> String {
    RESUME_ANALYSIS_PROMPT_TEMPLATE
        .replace("{format_instructions}", FORMAT_INSTRUCTIONS)
        .replace("{resume_text}", resume_text)
}
