use ropey::Rope;

/// LSP position (UTF-16 column) to byte offset.
pub fn rope_line_col_to_offset(rope: &Rope, line: u32, character: u32) -> Option<usize> {
    let line_idx = line as usize;
    if line_idx >= rope.len_lines() {
        return None;
    }

    let line_byte_start = rope.line_to_byte(line_idx);
    let line_slice = rope.line(line_idx);

    let mut utf16_units = 0usize;
    let mut byte_offset = 0usize;

    for ch in line_slice.chars() {
        if utf16_units >= character as usize || ch == '\n' || ch == '\r' {
            break;
        }
        utf16_units += ch.len_utf16();
        byte_offset += ch.len_utf8();
    }

    Some(line_byte_start + byte_offset)
}

/// Byte offset to LSP position (line, UTF-16 column).
pub fn rope_offset_to_line_col(rope: &Rope, offset: usize) -> Option<(u32, u32)> {
    if offset > rope.len_bytes() {
        return None;
    }
    let line_idx = rope.byte_to_line(offset);
    let line_char_start = rope.line_to_char(line_idx);
    let char_idx = rope.byte_to_char(offset);
    let character: usize = rope
        .slice(line_char_start..char_idx)
        .chars()
        .map(char::len_utf16)
        .sum();
    Some((line_idx as u32, character as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_col_to_offset(source: &str, line: u32, character: u32) -> Option<usize> {
        rope_line_col_to_offset(&Rope::from_str(source), line, character)
    }

    fn offset_to_line_col(source: &str, offset: usize) -> Option<(u32, u32)> {
        rope_offset_to_line_col(&Rope::from_str(source), offset)
    }

    #[test]
    fn test_line_col_to_offset() {
        let src = "hello\nworld";
        assert_eq!(line_col_to_offset(src, 0, 5), Some(5));
        assert_eq!(line_col_to_offset(src, 1, 3), Some(9));
        assert_eq!(line_col_to_offset(src, 5, 0), None);
    }

    #[test]
    fn test_column_past_line_end_clamps_before_newline() {
        let src = "ab\ncd";
        assert_eq!(line_col_to_offset(src, 0, 10), Some(2));
    }

    #[test]
    fn test_offset_to_line_col_utf16() {
        // '😀' is two UTF-16 units and four bytes
        let src = "a😀b\nc";
        assert_eq!(offset_to_line_col(src, 0), Some((0, 0)));
        assert_eq!(offset_to_line_col(src, 5), Some((0, 3)));
        assert_eq!(offset_to_line_col(src, 7), Some((1, 0)));
        assert_eq!(offset_to_line_col(src, 8), Some((1, 1)));
        assert_eq!(offset_to_line_col(src, 9), None);
    }

    #[test]
    fn test_positions_round_trip_on_multibyte_line() {
        let src = "String s = \"ü\"; x";
        let offset = src.find('x').unwrap();
        let (line, col) = offset_to_line_col(src, offset).unwrap();
        assert_eq!(line_col_to_offset(src, line, col), Some(offset));
    }
}
