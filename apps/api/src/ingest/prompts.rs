//! Prompt for splitting an undelimited resume into sections.

pub const SECTION_IDENTIFICATION_PROMPT: &str = r#"Identify the sections of the following resume and copy each section's text verbatim.

RESUME:
{resume_text}

Return a JSON object whose keys are section names and whose values are the section text as a single string.
Use these keys when the resume has such a section:
contact_information, summary, education, experience, skills, projects, certifications, additional
Omit sections that are not present. Do not rewrite, summarize or invent content.
{json_only}"#;
