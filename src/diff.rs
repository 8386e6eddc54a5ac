use similar::TextDiff;
use std::fmt::Display;

const CONTEXT_RADIUS: usize = 3;

pub const EQUAL_MESSAGE: &str = "Content is equal";
pub const READ_FAILURE_MESSAGE: &str = "Failed to read secret content";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Addition,
    Deletion,
    HunkHeader,
    Context,
}

impl LineKind {
    /// `+` and `-` are checked before `@@`, so file headers count as
    /// additions and deletions as well.
    pub fn classify(line: &str) -> Self {
        if line.starts_with('+') {
            Self::Addition
        } else if line.starts_with('-') {
            Self::Deletion
        } else if line.starts_with("@@") {
            Self::HunkHeader
        } else {
            Self::Context
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub kind: LineKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffBody {
    Equal,
    Lines(Vec<ClassifiedLine>),
}

impl DiffBody {
    pub fn line_count(&self) -> usize {
        match self {
            Self::Equal => 1,
            Self::Lines(lines) => lines.len(),
        }
    }
}

/// Diff plus the read failures that were substituted with empty content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport {
    pub failures: Vec<String>,
    pub body: DiffBody,
}

pub fn render(left_label: &str, right_label: &str, left: &str, right: &str) -> DiffBody {
    if left == right {
        return DiffBody::Equal;
    }

    let diff = TextDiff::from_lines(left, right);
    let unified = diff
        .unified_diff()
        .context_radius(CONTEXT_RADIUS)
        .missing_newline_hint(true)
        .header(left_label, right_label)
        .to_string();

    DiffBody::Lines(
        unified
            .lines()
            .map(|line| ClassifiedLine {
                kind: LineKind::classify(line),
                text: line.to_string(),
            })
            .collect(),
    )
}

/// Renders whatever could be fetched. A failed side is diffed as empty text
/// and reported in `failures`; rendering itself never fails.
pub fn render_fetched<E: Display>(
    left_label: &str,
    right_label: &str,
    left: Result<String, E>,
    right: Result<String, E>,
) -> DiffReport {
    let mut failures = Vec::new();
    let mut unwrap_side = |label: &str, side: Result<String, E>| match side {
        Ok(text) => text,
        Err(err) => {
            failures.push(format!("{READ_FAILURE_MESSAGE} {label}: {err}"));
            String::new()
        }
    };
    let left_text = unwrap_side(left_label, left);
    let right_text = unwrap_side(right_label, right);

    DiffReport {
        body: render(left_label, right_label, &left_text, &right_text),
        failures,
    }
}
