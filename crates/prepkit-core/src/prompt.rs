//! Question-generation prompt builder.

use crate::types::InterviewParams;

/// Build the prompt asking the model for a JSON array of interview questions.
///
/// The tech stack is passed through exactly as received.
pub fn build_question_prompt(params: &InterviewParams) -> String {
    let mut parts = Vec::new();

    parts.push("Prepare questions for a job interview.".to_string());
    parts.push(format!("The job role is {}.", params.role));
    parts.push(format!("The job experience level is {}.", params.level));
    parts.push(format!(
        "The tech stack used in the job is: {}.",
        params.techstack
    ));
    parts.push(format!(
        "The focus between behavioural and technical questions should lean towards: {}.",
        params.interview_type
    ));
    parts.push(format!(
        "The amount of questions required is: {}.",
        params.amount
    ));
    parts.push("Please return only the questions, without any additional text.".to_string());
    parts.push(
        "The questions are going to be read by a voice assistant so do not use \"/\" or \"*\" \
         or any other special characters which might break the voice assistant."
            .to_string(),
    );
    parts.push("Return the questions formatted like this:".to_string());
    parts.push(r#"["Question 1", "Question 2", "Question 3"]"#.to_string());

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_params() {
        let params = InterviewParams {
            interview_type: "behavioural".into(),
            role: "Frontend Developer".into(),
            level: "Junior".into(),
            techstack: "React, TypeScript".into(),
            amount: 5,
            user_id: "u9".into(),
        };
        let prompt = build_question_prompt(&params);
        assert!(prompt.starts_with("Prepare questions for a job interview.\n"));
        assert!(prompt.contains("The job role is Frontend Developer."));
        assert!(prompt.contains("The job experience level is Junior."));
        assert!(prompt.contains("The tech stack used in the job is: React, TypeScript."));
        assert!(prompt.contains("should lean towards: behavioural."));
        assert!(prompt.contains("The amount of questions required is: 5."));
        assert!(prompt.ends_with(r#"["Question 1", "Question 2", "Question 3"]"#));
        assert!(!prompt.contains("u9"));
    }
}
