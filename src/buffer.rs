use std::ops::Range;

use parking_lot::{RwLock, RwLockReadGuard};
use ropey::Rope;
use tracing::{debug, warn};

use crate::assist::candidate::InsertionPlan;
use crate::assist::error::{AssistError, Result};
use crate::assist::imports;

/// Text of one open editor, guarded by a reader/writer lock.
///
/// Offsets are byte offsets into the UTF-8 text. Classification takes the
/// read lock for the duration of a single call; only plan application and
/// import merging take the write lock.
#[derive(Debug)]
pub struct EditorBuffer {
    language_id: String,
    text: RwLock<Rope>,
}

impl EditorBuffer {
    pub fn new(language_id: impl Into<String>, text: &str) -> Self {
        Self {
            language_id: language_id.into(),
            text: RwLock::new(Rope::from_str(text)),
        }
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// Document association consulted when the token sequence is empty.
    pub fn is_code_document(&self) -> bool {
        self.language_id == "java"
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Rope> {
        self.text.read()
    }

    pub fn len(&self) -> usize {
        self.text.read().len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self) -> String {
        self.text.read().to_string()
    }

    pub fn set_text(&self, text: &str) {
        *self.text.write() = Rope::from_str(text);
    }

    pub fn get_text(&self, offset: usize, len: usize) -> Result<String> {
        let rope = self.text.read();
        let start = char_index(&rope, offset)?;
        let end = char_index(&rope, offset.saturating_add(len))?;
        Ok(rope.slice(start..end).to_string())
    }

    /// Byte range of the line containing `offset`, without its terminator.
    pub fn line_bounds(&self, offset: usize) -> Result<Range<usize>> {
        let rope = self.text.read();
        char_index(&rope, offset)?;
        let line_idx = rope.byte_to_line(offset);
        let start = rope.line_to_byte(line_idx);
        let line = rope.line(line_idx);
        let mut len = line.len_bytes();
        if line.chars().last() == Some('\n') {
            len -= 1;
            if len > 0 && line.char(line.len_chars() - 2) == '\r' {
                len -= 1;
            }
        }
        Ok(start..start + len)
    }

    pub fn insert_str(&self, offset: usize, text: &str) -> Result<()> {
        let mut rope = self.text.write();
        let at = char_index(&rope, offset)?;
        rope.insert(at, text);
        Ok(())
    }

    pub fn remove(&self, offset: usize, len: usize) -> Result<()> {
        let mut rope = self.text.write();
        let end_offset = offset.saturating_add(len);
        let start = char_index(&rope, offset)?;
        let end = char_index(&rope, end_offset).map_err(|_| AssistError::InvalidSpan {
            start: offset,
            end: end_offset,
            len: rope.len_bytes(),
        })?;
        rope.remove(start..end);
        Ok(())
    }

    /// Splices a finished plan into the buffer, then merges its imports.
    ///
    /// A plan whose span no longer fits the buffer (the user kept typing while
    /// the query was in flight) is dropped and `false` is returned.
    pub fn apply(&self, plan: &InsertionPlan) -> bool {
        let mut rope = self.text.write();
        let range = plan.replaced_range();
        let (Ok(start), Ok(end)) = (char_index(&rope, range.start), char_index(&rope, range.end))
        else {
            warn!(
                start = range.start,
                end = range.end,
                len = rope.len_bytes(),
                "stale insertion plan dropped"
            );
            return false;
        };
        rope.remove(start..end);
        rope.insert(start, &plan.insert_text);
        merge_imports_locked(&mut rope, &plan.imports);
        debug!(
            start = range.start,
            replaced = range.len(),
            inserted = plan.insert_text.len(),
            "insertion plan applied"
        );
        true
    }

    /// Appends missing imports to the import section. Returns whether the
    /// buffer changed.
    pub fn merge_imports(&self, imports: &[String]) -> bool {
        let mut rope = self.text.write();
        merge_imports_locked(&mut rope, imports)
    }
}

fn merge_imports_locked(rope: &mut Rope, wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return false;
    }
    let source = rope.to_string();
    let Some(edit) = imports::import_edit(&source, wanted) else {
        return false;
    };
    let at = rope.byte_to_char(edit.offset);
    rope.insert(at, &edit.text);
    true
}

/// Byte offset -> char index, rejecting offsets past the end or inside a
/// multi-byte character.
fn char_index(rope: &Rope, offset: usize) -> Result<usize> {
    if offset > rope.len_bytes() {
        return Err(AssistError::OffsetOutOfBounds {
            offset,
            len: rope.len_bytes(),
        });
    }
    let idx = rope.byte_to_char(offset);
    if rope.char_to_byte(idx) != offset {
        return Err(AssistError::NotCharBoundary { offset });
    }
    Ok(idx)
}

/// The line holding the caret, as seen by the alignment engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretLine {
    pub line_start: usize,
    pub caret: usize,
    pub text: String,
}

impl CaretLine {
    pub fn at(source: &str, caret: usize) -> Result<Self> {
        crate::assist::error::check_offset(source, caret)?;
        let line_start = source[..caret].rfind('\n').map_or(0, |i| i + 1);
        let mut line_end = source[caret..]
            .find('\n')
            .map_or(source.len(), |i| caret + i);
        if line_end > caret && source.as_bytes()[line_end - 1] == b'\r' {
            line_end -= 1;
        }
        Ok(Self {
            line_start,
            caret,
            text: source[line_start..line_end].to_string(),
        })
    }

    pub fn before_caret(&self) -> &str {
        let col = (self.caret - self.line_start).min(self.text.len());
        &self.text[..col]
    }

    /// First non-whitespace character of the line.
    pub fn leading_char(&self) -> Option<char> {
        self.text.trim_start().chars().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_text_and_bounds_errors() {
        let buf = EditorBuffer::new("java", "class A {}");
        assert_eq!(buf.get_text(6, 1).unwrap(), "A");
        assert_eq!(
            buf.get_text(8, 10),
            Err(AssistError::OffsetOutOfBounds { offset: 18, len: 10 })
        );
    }

    #[test]
    fn test_line_bounds_excludes_terminator() {
        let buf = EditorBuffer::new("java", "ab\r\ncd\nef");
        assert_eq!(buf.line_bounds(0).unwrap(), 0..2);
        assert_eq!(buf.line_bounds(5).unwrap(), 4..6);
        assert_eq!(buf.line_bounds(9).unwrap(), 7..9);
    }

    #[test]
    fn test_multibyte_offset_rejected() {
        let buf = EditorBuffer::new("java", "ü");
        assert_eq!(
            buf.insert_str(1, "x"),
            Err(AssistError::NotCharBoundary { offset: 1 })
        );
    }

    #[test]
    fn test_insert_and_remove() {
        let buf = EditorBuffer::new("java", "int x;");
        buf.insert_str(5, " = 1").unwrap();
        assert_eq!(buf.text(), "int x = 1;");
        buf.remove(5, 4).unwrap();
        assert_eq!(buf.text(), "int x;");
        assert!(buf.remove(4, 10).is_err());
    }

    #[test]
    fn test_apply_plan_splices_and_merges_imports() {
        let src = "package a;\n\nclass A {\n    Lis\n}\n";
        let buf = EditorBuffer::new("java", src);
        let caret = src.find("Lis").unwrap() + 3;
        let plan = InsertionPlan {
            replace_start: caret - 3,
            replace_len: Some(3),
            insert_text: "List<String> names;".into(),
            imports: vec!["java.util.List".into()],
        };
        assert!(buf.apply(&plan));
        assert_eq!(
            buf.text(),
            "package a;\n\nimport java.util.List;\n\nclass A {\n    List<String> names;\n}\n"
        );
    }

    #[test]
    fn test_stale_plan_is_dropped() {
        let buf = EditorBuffer::new("java", "short");
        let plan = InsertionPlan {
            replace_start: 3,
            replace_len: Some(10),
            insert_text: "x".into(),
            imports: vec![],
        };
        assert!(!buf.apply(&plan));
        assert_eq!(buf.text(), "short");
    }

    #[test]
    fn test_caret_line() {
        let src = "a\r\n    foo.ba|r();\nz";
        let caret = src.find('|').unwrap();
        let src = src.replace('|', "");
        let line = CaretLine::at(&src, caret).unwrap();
        assert_eq!(line.text, "    foo.bar();");
        assert_eq!(line.before_caret(), "    foo.ba");
        assert_eq!(line.leading_char(), Some('f'));
    }

    #[test]
    fn test_caret_line_on_blank_line() {
        let line = CaretLine::at("x\n\ny", 2).unwrap();
        assert_eq!(line.text, "");
        assert_eq!(line.leading_char(), None);
    }

    #[test]
    fn test_code_document_association() {
        assert!(EditorBuffer::new("java", "").is_code_document());
        assert!(!EditorBuffer::new("plaintext", "").is_code_document());
    }
}
