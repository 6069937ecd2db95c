//! Chunk stage: split text into bounded-size segments
//!
//! Greedy sentence packing: boundaries come purely from character-length
//! accumulation, not semantic coherence. A hard ceiling on chunk count bounds
//! downstream cost; input beyond it is dropped (lossy truncation by policy,
//! not an error).

/// Split text into chunks of at most `max_chunk_chars` characters, never
/// producing more than `max_chunks` chunks.
///
/// Sentences are delimited by `". "`; a single sentence longer than
/// `max_chunk_chars` still becomes one (oversized) chunk.
pub fn chunk_text(text: &str, max_chunk_chars: usize, max_chunks: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in text.split(". ") {
        if sentence.trim().is_empty() {
            continue;
        }
        // The limit counts characters, not bytes, so multibyte text fills
        // chunks to the same configured length as ASCII.
        let sentence_chars = sentence.chars().count();
        if current_chars + sentence_chars < max_chunk_chars {
            current.push_str(sentence);
            current.push_str(". ");
            current_chars += sentence_chars + 2;
        } else {
            if !current.is_empty() {
                if chunks.len() >= max_chunks {
                    return chunks;
                }
                chunks.push(current.trim().to_string());
            }
            current = String::new();
            current.push_str(sentence);
            current.push_str(". ");
            current_chars = sentence_chars + 2;
        }
    }

    // Flush the final buffer, still honoring the ceiling
    let trimmed = current.trim();
    if !trimmed.is_empty() && chunks.len() < max_chunks {
        chunks.push(trimmed.to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("One sentence. Another sentence.", 1000, 50);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("One sentence"));
        assert!(chunks[0].contains("Another sentence"));
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 1000, 50).is_empty());
        assert!(chunk_text("   ", 1000, 50).is_empty());
    }

    #[test]
    fn chunks_respect_the_size_limit() {
        let text = (0..100)
            .map(|i| format!("Sentence number {} with a bit of padding text", i))
            .collect::<Vec<_>>()
            .join(". ");
        let chunks = chunk_text(&text, 200, 50);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            // Limit applies per chunk; only a single oversized sentence may break it
            assert!(chunk.len() <= 200 + 2, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        // Two 10-char multibyte sentences (20 bytes each) fit one
        // 25-char chunk; byte accounting would split them.
        let text = format!("{}. {}", "\u{e9}".repeat(10), "\u{e9}".repeat(10));
        let chunks = chunk_text(&text, 25, 50);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn oversized_sentence_becomes_its_own_chunk() {
        let long_sentence = "word ".repeat(100);
        let text = format!("Short one. {}. Short two.", long_sentence.trim());
        let chunks = chunk_text(&text, 50, 50);

        assert!(chunks.iter().any(|c| c.len() > 50));
        // Must still terminate and keep the surrounding sentences
        let joined = chunks.join(" ");
        assert!(joined.contains("Short one"));
        assert!(joined.contains("Short two"));
    }

    #[test]
    fn chunk_count_never_exceeds_the_ceiling() {
        let text = (0..500)
            .map(|i| format!("Sentence {}", i))
            .collect::<Vec<_>>()
            .join(". ");
        let chunks = chunk_text(&text, 20, 10);
        assert!(chunks.len() <= 10);
        assert_eq!(chunks.len(), 10);
    }

    #[test]
    fn content_is_preserved_up_to_truncation() {
        let sentences: Vec<String> = (0..20).map(|i| format!("Sentence {}", i)).collect();
        let text = sentences.join(". ");
        let chunks = chunk_text(&text, 1000, 50);

        let reassembled = chunks.join(" ");
        for sentence in &sentences {
            assert!(
                reassembled.contains(sentence.as_str()),
                "lost sentence: {}",
                sentence
            );
        }
    }
}
