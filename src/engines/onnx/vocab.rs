use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::model::OnnxError;

/// Start/end-of-sequence token.
pub const PAD_ID: i64 = 0;
/// Word-gap token, also used as tail padding.
pub const SPACE_ID: i64 = 16;

#[derive(Deserialize)]
struct ModelConfig {
    vocab: HashMap<String, i64>,
}

/// Load the phoneme vocabulary from the `vocab` object of a config.json.
///
/// Every key must be exactly one character.
pub fn load_vocab(config_path: &Path) -> Result<HashMap<char, i64>, OnnxError> {
    let content = std::fs::read_to_string(config_path)?;
    let config: ModelConfig = serde_json::from_str(&content)
        .map_err(|e| OnnxError::Config(format!("{}: {e}", config_path.display())))?;

    config
        .vocab
        .into_iter()
        .map(|(key, id)| {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Ok((ch, id)),
                _ => Err(OnnxError::Config(format!(
                    "vocab key {key:?} is not a single character"
                ))),
            }
        })
        .collect()
}

/// The 114-symbol phoneme vocabulary the exported voice was trained with.
pub fn builtin_vocab() -> HashMap<char, i64> {
    const ENTRIES: &[(char, i64)] = &[
        (';', 1), (':', 2), (',', 3), ('.', 4), ('!', 5), ('?', 6),
        ('—', 9), ('…', 10), ('"', 11), ('(', 12), (')', 13),
        ('\u{201c}', 14), ('\u{201d}', 15), (' ', 16), ('\u{0303}', 17),
        ('ʣ', 18), ('ʥ', 19), ('ʦ', 20), ('ʨ', 21), ('ᵝ', 22), ('\u{ab67}', 23),
        ('A', 24), ('I', 25), ('O', 31), ('Q', 33), ('S', 35), ('T', 36),
        ('W', 39), ('Y', 41), ('ᵊ', 42),
        ('a', 43), ('b', 44), ('c', 45), ('d', 46), ('e', 47), ('f', 48),
        ('h', 50), ('i', 51), ('j', 52), ('k', 53), ('l', 54), ('m', 55),
        ('n', 56), ('o', 57), ('p', 58), ('q', 59), ('r', 60), ('s', 61),
        ('t', 62), ('u', 63), ('v', 64), ('w', 65), ('x', 66), ('y', 67),
        ('z', 68),
        ('ɑ', 69), ('ɐ', 70), ('ɒ', 71), ('æ', 72), ('β', 75), ('ɔ', 76),
        ('ɕ', 77), ('ç', 78), ('ɖ', 80), ('ð', 81), ('ʤ', 82), ('ə', 83),
        ('ɚ', 85), ('ɛ', 86), ('ɜ', 87), ('ɟ', 90), ('ɡ', 92), ('ɥ', 99),
        ('ɨ', 101), ('ɪ', 102), ('ʝ', 103), ('ɯ', 110), ('ɰ', 111), ('ŋ', 112),
        ('ɳ', 113), ('ɲ', 114), ('ɴ', 115), ('ø', 116), ('ɸ', 118), ('θ', 119),
        ('œ', 120), ('ɹ', 123), ('ɾ', 125), ('ɻ', 126), ('ʁ', 128), ('ɽ', 129),
        ('ʂ', 130), ('ʃ', 131), ('ʈ', 132), ('ʧ', 133), ('ʊ', 135), ('ʋ', 136),
        ('ʌ', 138), ('ɣ', 139), ('ɤ', 140), ('χ', 142), ('ʎ', 143), ('ʒ', 147),
        ('ʔ', 148), ('ˈ', 156), ('ˌ', 157), ('ː', 158), ('ʰ', 162), ('ʲ', 164),
        ('↓', 169), ('→', 171), ('↗', 172), ('↘', 173), ('ᵻ', 177),
    ];
    ENTRIES.iter().copied().collect()
}

/// Maps an IPA string to the id sequence the graph expects:
/// `[PAD, ids.., SPACE × tail_padding, PAD]`.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: HashMap<char, i64>,
    substitutions: Vec<(String, String)>,
    tail_padding: usize,
}

impl Tokenizer {
    pub fn new(
        vocab: HashMap<char, i64>,
        substitutions: Vec<(String, String)>,
        tail_padding: usize,
    ) -> Self {
        Self {
            vocab,
            substitutions,
            tail_padding,
        }
    }

    /// Tokenize phonemes. Returns an empty vector when no phoneme is in the
    /// vocabulary; symbols missing from the vocabulary are dropped.
    pub fn tokenize(&self, phonemes: &str) -> Vec<i64> {
        let mut fixed = phonemes.to_string();
        for (from, to) in &self.substitutions {
            fixed = fixed.replace(from.as_str(), to);
        }

        let body: Vec<i64> = fixed
            .chars()
            .filter_map(|ch| self.vocab.get(&ch).copied())
            .collect();
        if body.is_empty() {
            return body;
        }

        let mut ids = Vec::with_capacity(body.len() + self.tail_padding + 2);
        ids.push(PAD_ID);
        ids.extend(body);
        ids.extend(std::iter::repeat(SPACE_ID).take(self.tail_padding));
        ids.push(PAD_ID);
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_vocab_is_complete() {
        let vocab = builtin_vocab();
        assert_eq!(vocab.len(), 114);
        assert_eq!(vocab[&'ə'], 83);
        assert_eq!(vocab[&' '], SPACE_ID);
    }

    #[test]
    fn wraps_ids_with_pad_and_tail() {
        let tokenizer = Tokenizer::new(builtin_vocab(), Vec::new(), 2);
        assert_eq!(tokenizer.tokenize("hə"), vec![0, 50, 83, 16, 16, 0]);
    }

    #[test]
    fn substitutions_run_before_lookup() {
        let subs = vec![("O".to_string(), "oʊ".to_string())];
        let tokenizer = Tokenizer::new(builtin_vocab(), subs, 0);
        assert_eq!(tokenizer.tokenize("hO"), vec![0, 50, 57, 135, 0]);
    }

    #[test]
    fn unknown_symbols_are_dropped() {
        let tokenizer = Tokenizer::new(builtin_vocab(), Vec::new(), 1);
        assert_eq!(tokenizer.tokenize("a✓b"), vec![0, 43, 44, 16, 0]);
        assert!(tokenizer.tokenize("✓✓").is_empty());
    }

    #[test]
    fn loads_vocab_from_config_json() {
        let path = std::env::temp_dir().join(format!("silk-vocab-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "vocab": { "a": 43, "ə": 83 }, "n_token": 178 }"#).unwrap();
        let vocab = load_vocab(&path).unwrap();
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab[&'ə'], 83);

        std::fs::write(&path, r#"{ "vocab": { "ab": 1 } }"#).unwrap();
        assert!(matches!(load_vocab(&path), Err(OnnxError::Config(_))));
        let _ = std::fs::remove_file(&path);
    }
}
