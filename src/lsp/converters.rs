use ropey::Rope;
use tower_lsp::lsp_types::*;

use crate::assist::candidate::Suggestion;
use crate::assist::imports;
use crate::buffer::EditorBuffer;
use crate::language::rope_utils::{rope_line_col_to_offset, rope_offset_to_line_col};

/// LSP Position -> byte offset (UTF-16 columns)
pub fn lsp_pos_to_offset(rope: &Rope, pos: Position) -> Option<usize> {
    rope_line_col_to_offset(rope, pos.line, pos.character)
}

pub fn offset_to_lsp_pos(rope: &Rope, offset: usize) -> Option<Position> {
    rope_offset_to_line_col(rope, offset).map(|(line, character)| Position { line, character })
}

/// Converts aligned suggestions to completion items, in order.
///
/// The plan's span becomes the item's `textEdit` and its imports a single
/// `additionalTextEdits` insertion. Only the first live suggestion is
/// preselected; alternates sort after it.
pub fn suggestions_to_items(buffer: &EditorBuffer, suggestions: &[Suggestion]) -> Vec<CompletionItem> {
    let rope = buffer.read();
    let source = rope.to_string();
    suggestions
        .iter()
        .enumerate()
        .filter_map(|(i, s)| suggestion_to_item(s, &rope, &source, i))
        .collect()
}

fn suggestion_to_item(
    suggestion: &Suggestion,
    rope: &Rope,
    source: &str,
    index: usize,
) -> Option<CompletionItem> {
    let plan = &suggestion.plan;
    let span = plan.replaced_range();
    let range = Range {
        start: offset_to_lsp_pos(rope, span.start)?,
        end: offset_to_lsp_pos(rope, span.end)?,
    };

    let additional_text_edits = imports::import_edit(source, &plan.imports).and_then(|edit| {
        let at = offset_to_lsp_pos(rope, edit.offset)?;
        Some(vec![TextEdit {
            range: Range { start: at, end: at },
            new_text: edit.text,
        }])
    });

    Some(CompletionItem {
        label: suggestion.label.clone(),
        kind: Some(CompletionItemKind::SNIPPET),
        detail: (!suggestion.detail.is_empty()).then(|| suggestion.detail.clone()),
        preselect: Some(index == 0 && suggestion.live),
        sort_text: Some(format!("{index:04}")),
        // clients filter on the replaced text; keep every suggestion visible
        filter_text: source.get(span).map(str::to_string),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range,
            new_text: plan.insert_text.clone(),
        })),
        additional_text_edits,
        ..Default::default()
    })
}
