//! Prompt builders. Each asks for a reply shaped so that
//! [`super::interpreter`] can pull sections back out.

use super::FixRequest;

pub fn explain_divergence(test_body: &str, source_body: &str) -> String {
    format!(
        "Compare this test with the code it exercises.\n\
         State whether the test's expectation matches what the code actually does.\n\
         If it does not, say \"mismatch\", then what the test expects and what the code returns.\n\n\
         TEST:\n```\n{}\n```\n\nCODE:\n```\n{}\n```\n",
        test_body.trim_end(),
        source_body.trim_end()
    )
}

pub fn analyze_test_expectation(test_body: &str) -> String {
    format!(
        "Describe what this test expects. Answer using exactly these sections:\n\
         DESCRIPTION: <one sentence>\n\
         INPUTS: <one per line, prefixed with ->\n\
         OUTPUTS: <one per line, prefixed with ->\n\
         EXCEPTIONS: <one per line, prefixed with ->\n\n\
         TEST:\n```\n{}\n```\n",
        test_body.trim_end()
    )
}

pub fn analyze_code_behavior(source_body: &str) -> String {
    format!(
        "Describe what this code does. Answer using exactly these sections:\n\
         DESCRIPTION: <one sentence>\n\
         SIDE EFFECTS: <one per line, prefixed with ->\n\
         RETURNS: <one sentence>\n\
         ERRORS: <one per line, prefixed with ->\n\n\
         CODE:\n```\n{}\n```\n",
        source_body.trim_end()
    )
}

pub fn suggest_fix(request: &FixRequest) -> String {
    format!(
        "A test in {} fails: {}\n\
         Propose the smallest change that resolves it. Answer using these sections:\n\
         SUGGESTION: <the change, as a fenced code block or diff>\n\
         EXPLANATION: <why>\n\n\
         TEST:\n```\n{}\n```\n\nCODE:\n```\n{}\n```\n",
        request.file_path.display(),
        request.error_message.trim(),
        request.test_code.trim_end(),
        request.source_code.trim_end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_prompts_embed_code() {
        let prompt = explain_divergence("assertEquals(90, f());", "return 85;");
        assert!(prompt.contains("assertEquals(90, f());"));
        assert!(prompt.contains("return 85;"));
        assert!(analyze_test_expectation("t").contains("EXCEPTIONS:"));
        assert!(analyze_code_behavior("c").contains("SIDE EFFECTS:"));
    }

    #[test]
    fn test_fix_prompt_names_file_and_error() {
        let prompt = suggest_fix(&FixRequest {
            test_code: "assertEquals(90, f());".into(),
            source_code: "return 85;".into(),
            error_message: "expected 90 but was 85".into(),
            file_path: PathBuf::from("src/test/java/CalcTest.java"),
        });
        assert!(prompt.contains("src/test/java/CalcTest.java"));
        assert!(prompt.contains("expected 90 but was 85"));
        assert!(prompt.contains("SUGGESTION:"));
    }
}
