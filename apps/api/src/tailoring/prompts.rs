//! Prompt templates for job analysis and resume tailoring.
//! Placeholders in `{braces}` are filled by `tailoring::fill_template`.

pub const JOB_ANALYSIS_PROMPT: &str = r#"Analyze the following job description and extract:
1. Required skills
2. Preferred skills
3. Required experience
4. Required education
5. Key responsibilities
6. Important keywords that would be valuable to include in a resume

Job Description:
{job_description}

Return the analysis as a JSON object with exactly these keys:
{
    "required_skills": ["skill1", "skill2"],
    "preferred_skills": ["skill1", "skill2"],
    "required_experience": ["experience1"],
    "required_education": ["education1"],
    "responsibilities": ["responsibility1"],
    "keywords": ["keyword1", "keyword2"]
}

Ensure all lists contain string items, not nested objects.
{json_only}"#;

pub const TAILOR_RESUME_PROMPT: &str = r#"You are an expert resume writer and career coach. Tailor the following resume to match the job description provided.

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_description}

INSTRUCTIONS:
1. Analyze the job description for key requirements, skills, and keywords
2. Modify the resume to emphasize relevant experience and skills
3. Add missing keywords naturally where appropriate
4. Reorder sections to highlight most relevant qualifications first
5. Quantify achievements with specific metrics when possible
6. Ensure ATS-friendly formatting
7. {no_fabrication}

Return the tailored resume in the same format as the original."#;

pub const TAILOR_SECTION_PROMPT: &str = r#"You are an expert resume writer. Rewrite the "{section_name}" section of a resume so it speaks directly to the job description below.

SECTION CONTENT:
{section_body}

JOB DESCRIPTION:
{job_description}

{no_fabrication}
Return only the rewritten section content, without the section title and without commentary."#;
