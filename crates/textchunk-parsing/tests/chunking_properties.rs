//! Output properties that hold for every chunking method

use textchunk_config::ChunkMethod;
use textchunk_parsing::{ChunkOutput, ChunkingService, TokenCounter};
use textchunk_test_utils::{
    GUIDE_MARKDOWN, MIXED_SCRIPT, PLAIN_PROSE, assert_covers, assert_spans_within,
    assert_starts_increase, char_slice, oversized_list_markdown, settings,
};

fn spans(output: &ChunkOutput) -> Vec<(usize, usize)> {
    output
        .chunks
        .iter()
        .map(|c| (c.start_position, c.end_position))
        .collect()
}

fn run(method: ChunkMethod, size: usize, overlap: usize, text: &str) -> (ChunkingService, ChunkOutput) {
    let service = ChunkingService::new(settings(method, size, overlap)).expect("Should build service");
    let output = service.chunk(text).expect("Should chunk");
    (service, output)
}

#[test]
fn test_text_methods_report_exact_source_slices() {
    for (method, size, overlap) in [(ChunkMethod::Token, 20, 5), (ChunkMethod::Recursive, 60, 10)] {
        let (service, output) = run(method, size, overlap, PLAIN_PROSE);

        assert!(output.chunk_count > 1, "{method} should cut the prose");
        assert_spans_within(&spans(&output), PLAIN_PROSE.chars().count());
        assert_starts_increase(&spans(&output));
        for chunk in &output.chunks {
            assert_eq!(
                chunk.end_position,
                chunk.start_position + chunk.text.chars().count() - 1
            );
            assert_eq!(
                char_slice(PLAIN_PROSE, chunk.start_position, chunk.end_position),
                chunk.text
            );
            assert_eq!(chunk.token_count, service.counter().count(&chunk.text));
        }
    }
}

#[test]
fn test_text_methods_cover_every_character() {
    let cases = [
        (ChunkMethod::Token, 20, 5, PLAIN_PROSE),
        (ChunkMethod::Token, 5, 0, PLAIN_PROSE),
        (ChunkMethod::Recursive, 60, 10, PLAIN_PROSE),
        (ChunkMethod::Token, 5, 0, MIXED_SCRIPT),
        (ChunkMethod::Token, 7, 2, MIXED_SCRIPT),
        (ChunkMethod::Token, 3, 1, MIXED_SCRIPT),
        (ChunkMethod::Recursive, 10, 2, MIXED_SCRIPT),
    ];
    for (method, size, overlap, text) in cases {
        let (_, output) = run(method, size, overlap, text);

        assert!(output.chunk_count > 1, "{method} {size}/{overlap} should cut the text");
        assert_covers(text, &spans(&output));
        assert_spans_within(&spans(&output), text.chars().count());
        assert_starts_increase(&spans(&output));
        for chunk in &output.chunks {
            assert_eq!(
                char_slice(text, chunk.start_position, chunk.end_position),
                chunk.text
            );
        }
    }
}

#[test]
fn test_token_chunks_respect_the_budget() {
    let (_, output) = run(ChunkMethod::Token, 20, 5, PLAIN_PROSE);
    for chunk in &output.chunks {
        assert!(chunk.token_count <= 20, "{chunk:?}");
    }
}

#[test]
fn test_totals_add_up() {
    let (service, output) = run(ChunkMethod::Recursive, 60, 10, PLAIN_PROSE);
    let sum: usize = output.chunks.iter().map(|c| c.token_count).sum();
    assert_eq!(output.chunks_token_count, sum);
    assert_eq!(output.total_token_count, service.counter().count(PLAIN_PROSE));
    assert_eq!(output.chunk_count, output.chunks.len());
}

#[test]
fn test_markdown_chunks_keep_context_and_budget() {
    let (service, output) = run(ChunkMethod::Markdown, 40, 8, GUIDE_MARKDOWN);

    assert!(output.chunk_count > 1);
    assert_spans_within(&spans(&output), GUIDE_MARKDOWN.chars().count());
    assert_starts_increase(&spans(&output));
    for chunk in &output.chunks {
        assert!(chunk.token_count <= 40, "{chunk:?}");
        assert_eq!(chunk.token_count, service.counter().count(&chunk.text));
        assert!(chunk.text.starts_with('#'), "{chunk:?}");
    }

    let table = output
        .chunks
        .iter()
        .find(|c| c.text.contains("| rustc | 1.85 |"))
        .expect("Should contain the table");
    assert!(table.text.contains("## Requirements"));
    assert!(table.text.contains("| Tool | Version |"));

    assert!(
        output
            .chunks
            .iter()
            .any(|c| c.text.contains("# Troubleshooting\nIf the")),
        "a new top-level header should introduce its own paragraph"
    );
}

#[test]
fn test_markdown_header_and_paragraph_make_one_chunk() {
    let text = "# Title\n\nA single paragraph of body text.";
    let (_, output) = run(ChunkMethod::Markdown, 512, 100, text);

    assert_eq!(output.chunk_count, 1);
    assert_eq!(output.chunks[0].text, "# Title\nA single paragraph of body text.");
    assert_eq!(output.chunks[0].start_position, 9);
    assert_eq!(output.chunks[0].end_position, text.chars().count() - 1);
}

#[test]
fn test_oversized_list_item_is_cut_within_budget() {
    let text = oversized_list_markdown(150);
    let (_, output) = run(ChunkMethod::Markdown, 40, 5, &text);

    let pieces: Vec<_> = output
        .chunks
        .iter()
        .filter(|c| c.text.contains("lorem"))
        .collect();
    assert!(pieces.len() >= 2, "{pieces:?}");
    for piece in &pieces {
        assert!(piece.token_count <= 40, "{piece:?}");
        assert!(piece.text.starts_with("# Notes"), "{piece:?}");
        assert!(piece.text.contains("- parent item"), "{piece:?}");
    }
    assert_starts_increase(&spans(&output));
}

#[test]
fn test_service_is_reusable_across_inputs() {
    let service = ChunkingService::new(settings(ChunkMethod::Markdown, 64, 8)).expect("Should build");
    let first = service.chunk(GUIDE_MARKDOWN).expect("Should chunk");
    let second = service.chunk(GUIDE_MARKDOWN).expect("Should chunk again");
    assert_eq!(first, second);
}
