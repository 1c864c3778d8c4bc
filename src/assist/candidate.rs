use std::ops::Range;

use serde::Serialize;

/// One fragment returned by the backend. The text is untrusted and need not
/// be well-formed code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSnippet {
    pub text: String,
    pub description: String,
    /// Ordered and duplicate-free.
    pub imports: Vec<String>,
}

impl CandidateSnippet {
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
            imports: Vec::new(),
        }
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for import in imports {
            let import = import.into();
            if !self.imports.contains(&import) {
                self.imports.push(import);
            }
        }
        self
    }
}

/// Span of the buffer to replace and the text to put there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionPlan {
    pub replace_start: usize,
    /// `None`: insert at `replace_start` without consuming anything.
    pub replace_len: Option<usize>,
    pub insert_text: String,
    pub imports: Vec<String>,
}

impl InsertionPlan {
    /// Signed length, `-1` for a pure insertion.
    pub fn replace_length(&self) -> isize {
        match self.replace_len {
            Some(n) => n as isize,
            None => -1,
        }
    }

    pub fn replaced_range(&self) -> Range<usize> {
        self.replace_start..self.replace_start + self.replace_len.unwrap_or(0)
    }

    pub fn overlaps(&self, other: &InsertionPlan) -> bool {
        let (a, b) = (self.replaced_range(), other.replaced_range());
        match (a.is_empty(), b.is_empty()) {
            (true, true) => a.start == b.start,
            (true, false) => b.contains(&a.start),
            (false, true) => a.contains(&b.start),
            (false, false) => a.start < b.end && b.start < a.end,
        }
    }
}

/// An aligned candidate as handed to the host editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub plan: InsertionPlan,
    pub label: String,
    pub detail: String,
    /// `false` for alternates whose span collides with an earlier suggestion.
    pub live: bool,
}
