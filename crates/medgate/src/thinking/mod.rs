//! Reasoning-block extraction for model output
//!
//! Local reasoning models wrap chain-of-thought in `<think>...</think>`
//! markers. This module splits a reply into user-visible text and reasoning
//! text, with a batch variant for complete replies and an incremental
//! variant that tolerates markers truncated mid-stream.

/// Opening marker for a reasoning block
const THINK_OPEN: &str = "<think>";

/// Closing marker for a reasoning block
const THINK_CLOSE: &str = "</think>";

/// Separator between multiple extracted reasoning blocks
const BLOCK_SEPARATOR: &str = "\n\n";

/// Result of splitting a reply into visible and reasoning text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Reply text with all reasoning blocks removed, trimmed
    pub cleaned_text: String,
    /// Concatenated reasoning block interiors, `None` when no block matched
    pub thinking_content: Option<String>,
}

impl ExtractionResult {
    fn new(cleaned: String, thinking: String) -> Self {
        Self {
            cleaned_text: cleaned.trim().to_string(),
            thinking_content: {
                let trimmed = thinking.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            },
        }
    }
}

/// Extract reasoning blocks from a complete reply.
///
/// Scans left to right for non-overlapping `<think>...</think>` pairs.
/// Each interior is trimmed and appended to the reasoning buffer, blocks
/// separated by a blank line; the full marker span is removed from the
/// visible text. An opening marker with no matching close is left untouched
/// in the visible text: batch mode only extracts fully closed pairs.
pub fn extract_thinking(text: &str) -> ExtractionResult {
    let mut cleaned = String::new();
    let mut thinking = String::new();
    let mut rest = text;

    while let Some(open_idx) = rest.find(THINK_OPEN) {
        let interior_start = open_idx + THINK_OPEN.len();
        match rest[interior_start..].find(THINK_CLOSE) {
            Some(close_rel) => {
                cleaned.push_str(&rest[..open_idx]);
                let interior = rest[interior_start..interior_start + close_rel].trim();
                if !interior.is_empty() {
                    if !thinking.is_empty() {
                        thinking.push_str(BLOCK_SEPARATOR);
                    }
                    thinking.push_str(interior);
                }
                rest = &rest[interior_start + close_rel + THINK_CLOSE.len()..];
            }
            // Unclosed opener: keep everything from here on as visible text
            None => break,
        }
    }
    cleaned.push_str(rest);

    ExtractionResult::new(cleaned, thinking)
}

/// Scanner position relative to a reasoning block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    Inside,
}

/// Extract reasoning blocks from the buffer available so far during a stream.
///
/// Walks the buffer with a two-state scanner. Complete markers flip the
/// state and are consumed. If the unconsumed tail is a strict prefix of the
/// opening marker while outside a block (the stream may have ended in the
/// middle of `<think>`), those characters are withheld from both outputs
/// until more of the stream arrives.
///
/// Intended to be called repeatedly with ever-longer prefixes of the same
/// stream; each call re-scans the provided buffer from the start.
pub fn extract_thinking_streaming(text: &str) -> ExtractionResult {
    let mut visible = String::new();
    let mut thinking = String::new();
    let mut state = ScanState::Outside;
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        match state {
            ScanState::Outside => {
                if let Some(after) = rest.strip_prefix(THINK_OPEN) {
                    state = ScanState::Inside;
                    rest = after;
                    continue;
                }
                // Possible marker truncated by the end of the buffer
                if rest.len() < THINK_OPEN.len() && THINK_OPEN.starts_with(rest) {
                    break;
                }
                visible.push(ch);
            }
            ScanState::Inside => {
                if let Some(after) = rest.strip_prefix(THINK_CLOSE) {
                    state = ScanState::Outside;
                    rest = after;
                    continue;
                }
                thinking.push(ch);
            }
        }
        rest = &rest[ch.len_utf8()..];
    }

    ExtractionResult::new(visible, thinking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_no_markers() {
        let result = extract_thinking("  just a plain answer  ");
        assert_eq!(result.cleaned_text, "just a plain answer");
        assert_eq!(result.thinking_content, None);
    }

    #[test]
    fn test_batch_empty_input() {
        let result = extract_thinking("");
        assert_eq!(result.cleaned_text, "");
        assert_eq!(result.thinking_content, None);
    }

    #[test]
    fn test_batch_single_block() {
        let result = extract_thinking("<think>let me reason</think>The answer is 42.");
        assert_eq!(result.cleaned_text, "The answer is 42.");
        assert_eq!(result.thinking_content, Some("let me reason".to_string()));
    }

    #[test]
    fn test_batch_multiple_blocks_joined_with_blank_line() {
        let result =
            extract_thinking("<think>first</think>visible<think>second</think> tail");
        assert_eq!(result.cleaned_text, "visible tail");
        assert_eq!(
            result.thinking_content,
            Some("first\n\nsecond".to_string())
        );
    }

    #[test]
    fn test_batch_interior_is_trimmed() {
        let result = extract_thinking("<think>\n  padded  \n</think>answer");
        assert_eq!(result.cleaned_text, "answer");
        assert_eq!(result.thinking_content, Some("padded".to_string()));
    }

    #[test]
    fn test_batch_empty_block_ignored() {
        let result = extract_thinking("<think>   </think>answer");
        assert_eq!(result.cleaned_text, "answer");
        assert_eq!(result.thinking_content, None);
    }

    #[test]
    fn test_batch_unclosed_marker_left_in_place() {
        let result = extract_thinking("hello <think>unfinished");
        assert_eq!(result.cleaned_text, "hello <think>unfinished");
        assert_eq!(result.thinking_content, None);
    }

    #[test]
    fn test_batch_multiline_block() {
        let result = extract_thinking("<think>line one\nline two</think>done");
        assert_eq!(result.cleaned_text, "done");
        assert_eq!(
            result.thinking_content,
            Some("line one\nline two".to_string())
        );
    }

    #[test]
    fn test_streaming_complete_block() {
        let result = extract_thinking_streaming("<think>abc</think>visible");
        assert_eq!(result.cleaned_text, "visible");
        assert_eq!(result.thinking_content, Some("abc".to_string()));
    }

    #[test]
    fn test_streaming_open_block_accumulates_thinking() {
        let result = extract_thinking_streaming("<think>partial reasoning so far");
        assert_eq!(result.cleaned_text, "");
        assert_eq!(
            result.thinking_content,
            Some("partial reasoning so far".to_string())
        );
    }

    #[test]
    fn test_streaming_withholds_partial_opening_marker() {
        for tail in ["<", "<t", "<th", "<thi", "<thin", "<think"] {
            let input = format!("hello{tail}");
            let result = extract_thinking_streaming(&input);
            assert_eq!(result.cleaned_text, "hello", "tail: {tail}");
            assert_eq!(result.thinking_content, None, "tail: {tail}");
        }
    }

    #[test]
    fn test_streaming_non_marker_angle_bracket_is_emitted() {
        let result = extract_thinking_streaming("a < b and a <x> b");
        assert_eq!(result.cleaned_text, "a < b and a <x> b");
        assert_eq!(result.thinking_content, None);
    }

    #[test]
    fn test_streaming_prefix_stability() {
        let full = "<think>abc</think>visible";
        let batch = extract_thinking(full);

        // Feeding any prefix first must not change the final outcome
        for cut in 0..full.len() {
            if !full.is_char_boundary(cut) {
                continue;
            }
            let _ = extract_thinking_streaming(&full[..cut]);
        }
        let streamed = extract_thinking_streaming(full);
        assert_eq!(streamed.cleaned_text, batch.cleaned_text);
        assert_eq!(streamed.thinking_content, batch.thinking_content);
    }

    #[test]
    fn test_streaming_empty_input() {
        let result = extract_thinking_streaming("");
        assert_eq!(result.cleaned_text, "");
        assert_eq!(result.thinking_content, None);
    }

    #[test]
    fn test_streaming_multiple_blocks() {
        let result =
            extract_thinking_streaming("<think>one</think>mid<think>two</think>end");
        assert_eq!(result.cleaned_text, "midend");
        assert_eq!(result.thinking_content, Some("onetwo".to_string()));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let input = "<think>why</think>because";
        let first = extract_thinking(input);
        let second = extract_thinking(input);
        assert_eq!(first, second);

        let first = extract_thinking_streaming(input);
        let second = extract_thinking_streaming(input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_streaming_handles_multibyte_text() {
        let result = extract_thinking_streaming("<think>思考中</think>回答です");
        assert_eq!(result.cleaned_text, "回答です");
        assert_eq!(result.thinking_content, Some("思考中".to_string()));
    }
}
