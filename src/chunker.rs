//! Splits document text into the sentence-sized chunks that narration
//! synthesizes and schedules one at a time.

/// Fragments shorter than this (non-whitespace characters) are dropped;
/// they are almost always stray page numbers or OCR noise.
pub const MIN_CHUNK_CHARS: usize = 3;

/// Split text on sentence-terminal punctuation and newlines, keeping the
/// terminal punctuation with its chunk. Deterministic for a given input.
pub fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        match ch {
            '.' | '!' | '?' => {
                current.push(ch);
                push_chunk(&mut chunks, &mut current);
            }
            '\n' => {
                push_chunk(&mut chunks, &mut current);
            }
            _ => current.push(ch),
        }
    }
    push_chunk(&mut chunks, &mut current);

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if trimmed.chars().filter(|c| !c.is_whitespace()).count() >= MIN_CHUNK_CHARS {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::split_chunks;

    #[test]
    fn splits_story_into_sentences() {
        let chunks = split_chunks("Once upon a time. There was a fox. The end.");
        assert_eq!(
            chunks,
            vec!["Once upon a time.", "There was a fox.", "The end."]
        );
    }

    #[test]
    fn newlines_are_chunk_boundaries() {
        let chunks = split_chunks("First line without a period\nSecond line.");
        assert_eq!(chunks, vec!["First line without a period", "Second line."]);
    }

    #[test]
    fn drops_tiny_fragments() {
        let chunks = split_chunks("7.\nA real sentence follows! Ok.");
        assert_eq!(chunks, vec!["A real sentence follows!", "Ok."]);
    }

    #[test]
    fn empty_and_whitespace_yield_nothing() {
        assert!(split_chunks("").is_empty());
        assert!(split_chunks("  \n\t \n").is_empty());
    }

    #[test]
    fn question_and_exclamation_terminate() {
        let chunks = split_chunks("Who is there? It is me! Good.");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "Who is there?");
    }
}
