//! Tiktoken-based token counter for OpenAI models

use super::traits::TokenCounter;
use crate::error::{ParsingError, ParsingResult};
use textchunk_config::{ALL_SPECIAL_TOKENS, ChunkSettings};
use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Special tokens known to the OpenAI encodings
///
/// An encoding that does not define one of these encodes it as ordinary text.
pub const SPECIAL_TOKENS: [&str; 5] = [
    "<|endoftext|>",
    "<|fim_prefix|>",
    "<|fim_middle|>",
    "<|fim_suffix|>",
    "<|endofprompt|>",
];

/// How many tokens [`TokenCounter::truncate`] may drop from its cut before
/// giving up on decoding. A UTF-8 character spans at most four bytes.
const MAX_EDGE_TRIM: usize = 3;

/// Token counter using tiktoken for OpenAI models
pub struct TiktokenCounter {
    /// Model name for identification
    model_name: String,
    /// The tiktoken encoder
    encoder: CoreBPE,
    /// Special tokens encoded as single tokens
    allowed: Vec<String>,
    /// Special tokens whose presence rejects the input
    disallowed: Vec<String>,
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("model_name", &self.model_name)
            .field("allowed", &self.allowed)
            .field("disallowed", &self.disallowed)
            .finish_non_exhaustive()
    }
}

impl TiktokenCounter {
    /// Create a counter for `model_name` with no special tokens allowed
    ///
    /// # Errors
    /// Returns `ParsingError::Tokenization` for a model tiktoken does not know
    pub fn new(model_name: &str) -> ParsingResult<Self> {
        Self::with_special_tokens(model_name, &[], &[ALL_SPECIAL_TOKENS.to_string()])
    }

    /// Create a counter with explicit special-token policy
    ///
    /// `"all"` in `allowed` allows every special token. `"all"` in
    /// `disallowed` rejects every special token that is not allowed.
    ///
    /// # Errors
    /// Returns `ParsingError::Tokenization` for a model tiktoken does not know
    pub fn with_special_tokens(
        model_name: &str,
        allowed: &[String],
        disallowed: &[String],
    ) -> ParsingResult<Self> {
        let encoder = tiktoken_rs::get_bpe_from_model(model_name).map_err(|e| {
            ParsingError::tokenization_error(format!("unsupported model '{model_name}': {e}"))
        })?;

        let allowed = expand_special(allowed, &[]);
        let disallowed = expand_special(disallowed, &allowed);

        Ok(Self {
            model_name: model_name.to_string(),
            encoder,
            allowed,
            disallowed,
        })
    }

    /// Create the counter described by chunk settings
    ///
    /// # Errors
    /// Returns `ParsingError::Tokenization` for a model tiktoken does not know
    pub fn from_settings(settings: &ChunkSettings) -> ParsingResult<Self> {
        Self::with_special_tokens(
            &settings.model_name,
            &settings.allowed_special,
            &settings.disallowed_special,
        )
    }

    /// Reject text containing a disallowed special token
    ///
    /// # Errors
    /// Returns `ParsingError::DisallowedSpecialToken` naming the first token found
    pub fn ensure_allowed(&self, text: &str) -> ParsingResult<()> {
        match self.disallowed.iter().find(|token| text.contains(token.as_str())) {
            Some(token) => Err(ParsingError::DisallowedSpecialToken(token.clone())),
            None => Ok(()),
        }
    }

    /// Cut text into windows of `size` tokens, consecutive windows sharing
    /// `overlap` tokens
    ///
    /// Window edges fall on character boundaries. An edge that would split a
    /// multi-byte character moves back to the previous boundary, or forward
    /// when no boundary lies inside the window. A window that would hold a
    /// single character is widened, and a lone trailing character joins the
    /// window before it, so such windows may exceed `size`. The windows
    /// together cover every token and the last one reaches the end of the
    /// text.
    pub fn windows(&self, text: &str, size: usize, overlap: usize) -> Vec<String> {
        let tokens = encode_segments(
            self.segments(text),
            |s| self.encoder.encode_ordinary(s),
            |s| self.encoder.encode_with_special_tokens(s),
        );
        let decode = |window: &[_]| self.encoder.decode(window.to_vec()).ok();
        let boundaries = char_boundaries(&tokens, &decode);
        let chars_in = |start: usize, end: usize| {
            tokens
                .get(start..end)
                .and_then(&decode)
                .map_or(0, |window| window.chars().count())
        };
        window_spans(&boundaries, size.max(1), overlap, chars_in)
            .into_iter()
            .filter_map(|(start, end)| {
                let window = tokens.get(start..end).and_then(&decode);
                if window.is_none() {
                    warn!(start, end, "Skipping token window that does not decode");
                }
                window.filter(|w| !w.is_empty())
            })
            .collect()
    }

    fn segments<'a>(&self, text: &'a str) -> Vec<(&'a str, bool)> {
        if self.allowed.is_empty() {
            return vec![(text, false)];
        }

        let mut segments = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            let next = self
                .allowed
                .iter()
                .filter_map(|token| rest.find(token.as_str()).map(|at| (at, token.len())))
                .min_by_key(|&(at, len)| (at, std::cmp::Reverse(len)));

            let Some((at, len)) = next else {
                segments.push((rest, false));
                break;
            };
            let (before, from) = rest.split_at(at);
            let (special, after) = from.split_at(len);
            if !before.is_empty() {
                segments.push((before, false));
            }
            segments.push((special, true));
            rest = after;
        }
        segments
    }
}

/// Encode each segment with the encoder matching its kind, in order
fn encode_segments<T>(
    segments: Vec<(&str, bool)>,
    ordinary: impl Fn(&str) -> Vec<T>,
    special: impl Fn(&str) -> Vec<T>,
) -> Vec<T> {
    let mut tokens = Vec::new();
    for (segment, is_special) in segments {
        if is_special {
            tokens.extend(special(segment));
        } else {
            tokens.extend(ordinary(segment));
        }
    }
    tokens
}

fn expand_special(requested: &[String], exclude: &[String]) -> Vec<String> {
    let wants_all = requested.iter().any(|token| token == ALL_SPECIAL_TOKENS);
    let mut tokens: Vec<String> = if wants_all {
        SPECIAL_TOKENS.iter().map(ToString::to_string).collect()
    } else {
        requested
            .iter()
            .filter(|token| !token.is_empty())
            .cloned()
            .collect()
    };
    tokens.retain(|token| !exclude.contains(token));
    tokens.dedup();
    tokens
}

/// Token offsets where the decoded text ends on a character boundary
///
/// Ascending, starting at 0 and always ending at `tokens.len()`. Each run
/// between boundaries decodes on its own, so it is enough to grow the run
/// from the last boundary until it decodes.
fn char_boundaries<T>(tokens: &[T], decode: &impl Fn(&[T]) -> Option<String>) -> Vec<usize> {
    let mut boundaries = vec![0];
    let mut last = 0;
    for end in 1..=tokens.len() {
        if tokens.get(last..end).and_then(decode).is_some() {
            boundaries.push(end);
            last = end;
        }
    }
    if last < tokens.len() {
        boundaries.push(tokens.len());
    }
    boundaries
}

/// Largest boundary in `(after, at_most]`, else the first boundary past
/// `after`
fn boundary_near(boundaries: &[usize], after: usize, at_most: usize) -> Option<usize> {
    let below = boundaries.partition_point(|&b| b <= at_most);
    below
        .checked_sub(1)
        .and_then(|i| boundaries.get(i))
        .copied()
        .filter(|&b| b > after)
        .or_else(|| boundary_after(boundaries, after))
}

fn boundary_after(boundaries: &[usize], after: usize) -> Option<usize> {
    boundaries
        .get(boundaries.partition_point(|&b| b <= after))
        .copied()
}

/// Token ranges of the windows, on boundaries only
///
/// Each window starts `overlap` tokens before the end of the previous one,
/// rounded back to a boundary, so no token is left out. `chars_in(start,
/// end)` counts the characters of a range.
fn window_spans(
    boundaries: &[usize],
    size: usize,
    overlap: usize,
    chars_in: impl Fn(usize, usize) -> usize,
) -> Vec<(usize, usize)> {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let Some(&total) = boundaries.last() else {
        return spans;
    };

    let mut start = 0;
    while start < total {
        let mut end = boundary_near(boundaries, start, start.saturating_add(size)).unwrap_or(total);
        while end < total && chars_in(start, end) < 2 {
            end = boundary_after(boundaries, end).unwrap_or(total);
        }
        if end >= total && chars_in(start, end) < 2 {
            if let Some(previous) = spans.last_mut() {
                previous.1 = total;
                break;
            }
        }
        spans.push((start, end));
        if end >= total {
            break;
        }
        start = boundary_near(boundaries, start, end.saturating_sub(overlap)).unwrap_or(total);
    }
    spans
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn count(&self, text: &str) -> usize {
        self.segments(text)
            .into_iter()
            .map(|(segment, special)| {
                if special {
                    self.encoder.encode_with_special_tokens(segment).len()
                } else {
                    self.encoder.encode_ordinary(segment).len()
                }
            })
            .sum()
    }

    fn truncate(&self, text: &str, max_tokens: usize) -> String {
        let tokens = encode_segments(
            self.segments(text),
            |s| self.encoder.encode_ordinary(s),
            |s| self.encoder.encode_with_special_tokens(s),
        );
        if tokens.len() <= max_tokens {
            return text.to_string();
        }

        for trail in 0..=MAX_EDGE_TRIM {
            let Some(end) = max_tokens.checked_sub(trail).filter(|&end| end > 0) else {
                break;
            };
            if let Some(prefix) = tokens
                .get(..end)
                .and_then(|window| self.encoder.decode(window.to_vec()).ok())
            {
                return prefix;
            }
        }
        String::new()
    }
}
