// All LLM prompt templates for the analysis pipeline.
// Bodies are embedded verbatim; the model's output format is requested, never enforced.

/// Resume parsing prompt. Replace `{resume_text}` before sending.
pub const RESUME_PARSE_TEMPLATE: &str = r#"You are a resume parser.

Extract:
- Skills
- Experience summary
- Education
- Tools & technologies

Resume:
{resume_text}

Return in bullet points."#;

/// Job description parsing prompt. Replace `{jd_text}` before sending.
pub const JD_PARSE_TEMPLATE: &str = r#"Extract:
- Required skills
- Responsibilities
- Preferred qualifications

Job Description:
{jd_text}

Return in bullet points."#;

/// Match comparison prompt. Replace `{parsed_resume}` and `{parsed_jd}` before sending.
pub const ATS_MATCH_TEMPLATE: &str = r#"You are an Applicant Tracking System.

Compare the resume and job description.

Resume:
{parsed_resume}

Job Description:
{parsed_jd}

Provide:
1. Match percentage (0-100)
2. Matching skills
3. Missing skills
4. Strengths
5. Improvement suggestions"#;

pub fn build_resume_prompt(resume_text: &str) -> String {
    render(RESUME_PARSE_TEMPLATE, &[("{resume_text}", resume_text)])
}

pub fn build_job_description_prompt(jd_text: &str) -> String {
    render(JD_PARSE_TEMPLATE, &[("{jd_text}", jd_text)])
}

pub fn build_match_prompt(parsed_resume: &str, parsed_jd: &str) -> String {
    render(
        ATS_MATCH_TEMPLATE,
        &[("{parsed_resume}", parsed_resume), ("{parsed_jd}", parsed_jd)],
    )
}

/// Substitutes placeholders in a single left-to-right pass over the template.
///
/// Inserted values are never rescanned, so a body that happens to contain
/// `{parsed_jd}` is embedded unchanged.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let extra: usize = vars.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    loop {
        let next = vars
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, *key, *value)))
            .min_by_key(|(pos, _, _)| *pos);

        match next {
            Some((pos, key, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}
