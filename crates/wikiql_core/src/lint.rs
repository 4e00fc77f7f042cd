use serde::Serialize;

use crate::links::heading_level;

pub const MAX_LINE_LENGTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub line: usize,
    pub severity: Severity,
    pub rule: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub valid: bool,
    pub errors: Vec<LintIssue>,
    pub warnings: Vec<LintIssue>,
    pub all: Vec<LintIssue>,
}

impl LintReport {
    fn from_issues(all: Vec<LintIssue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = all
            .iter()
            .cloned()
            .partition(|issue| issue.severity == Severity::Error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            all,
        }
    }
}

pub fn lint_markdown(content: &str) -> LintReport {
    if content.lines().all(|line| line.trim().is_empty()) {
        return LintReport::from_issues(vec![issue(
            1,
            Severity::Error,
            "no-empty",
            "Document is empty".to_string(),
        )]);
    }

    let mut issues = Vec::new();
    let mut previous_blank = false;
    let mut first_heading: Option<(usize, usize)> = None;

    for (index, line) in content.split('\n').enumerate() {
        let line_num = index + 1;
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.len() != line.trim_end().len() {
            issues.push(issue(
                line_num,
                Severity::Warning,
                "trailing-whitespace",
                "Trailing whitespace".to_string(),
            ));
        }

        let blank = line.trim().is_empty();
        if blank && previous_blank {
            issues.push(issue(
                line_num,
                Severity::Warning,
                "no-multiple-blanks",
                "Multiple consecutive blank lines".to_string(),
            ));
        }
        previous_blank = blank;

        if heading_missing_space(line) {
            issues.push(issue(
                line_num,
                Severity::Error,
                "heading-space",
                "Heading marker must be followed by a space".to_string(),
            ));
        }

        let length = line.chars().count();
        if length > MAX_LINE_LENGTH && !line.contains("http") {
            issues.push(issue(
                line_num,
                Severity::Warning,
                "line-length",
                format!("Line exceeds {MAX_LINE_LENGTH} characters ({length})"),
            ));
        }

        if line.contains('\t') {
            issues.push(issue(
                line_num,
                Severity::Warning,
                "no-tabs",
                "Tab character found".to_string(),
            ));
        }

        if has_unclosed_link(line) {
            issues.push(issue(
                line_num,
                Severity::Error,
                "unclosed-link",
                "Markdown link is missing its closing parenthesis".to_string(),
            ));
        }

        if first_heading.is_none()
            && let Some(level) = heading_level(line)
        {
            first_heading = Some((line_num, level));
        }
    }

    if let Some((line_num, level)) = first_heading
        && level != 1
    {
        issues.push(issue(
            line_num,
            Severity::Warning,
            "first-heading-h1",
            format!("First heading should be level 1, found level {level}"),
        ));
    }

    LintReport::from_issues(issues)
}

fn issue(line: usize, severity: Severity, rule: &'static str, message: String) -> LintIssue {
    LintIssue {
        line,
        severity,
        rule,
        message,
    }
}

/// `#`..`######` directly followed by something other than whitespace or `#`.
fn heading_missing_space(line: &str) -> bool {
    let hashes = line.bytes().take_while(|byte| *byte == b'#').count();
    if !(1..=6).contains(&hashes) {
        return false;
    }
    line[hashes..]
        .chars()
        .next()
        .is_some_and(|next| !next.is_whitespace() && next != '#')
}

/// A `[text](` whose parenthesis never closes before the end of the line.
fn has_unclosed_link(line: &str) -> bool {
    let bytes = line.as_bytes();
    for (open, byte) in bytes.iter().enumerate() {
        if *byte != b'[' {
            continue;
        }
        let Some(close) = bytes[open + 1..]
            .iter()
            .position(|byte| *byte == b']')
            .map(|offset| open + 1 + offset)
        else {
            return false;
        };
        if bytes.get(close + 1) == Some(&b'(') && !bytes[close + 2..].contains(&b')') {
            return true;
        }
    }
    false
}
