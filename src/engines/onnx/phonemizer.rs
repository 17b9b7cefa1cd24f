use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::model::OnnxError;

/// Where to find espeak-ng. `None` falls back to `espeak-ng` on PATH and its
/// compiled-in data directory.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

/// Convert text to an IPA string with espeak-ng.
///
/// espeak-ng drops punctuation, so the text is split at punctuation marks,
/// each run is phonemized on its own line and the marks are put back where
/// they were. The voice keeps its pause and intonation cues mid-sentence.
pub fn phonemize(text: &str, voice: &str, espeak: &EspeakConfig) -> Result<String, OnnxError> {
    let parts = split_text_parts(text);
    let runs: Vec<&str> = parts
        .iter()
        .filter_map(|part| match part {
            TextPart::Text(run) => Some(run.as_str()),
            TextPart::Punct(_) => None,
        })
        .collect();
    if runs.is_empty() {
        return Ok(parts
            .iter()
            .filter_map(|part| match part {
                TextPart::Punct(ch) => Some(*ch),
                TextPart::Text(_) => None,
            })
            .collect());
    }

    let mut phonemized = phonemize_runs(&runs, voice, espeak)?.into_iter();
    let mut ipa = String::new();
    for part in &parts {
        match part {
            TextPart::Text(_) => {
                let run = phonemized.next().unwrap_or_default();
                if !ipa.is_empty() && !ipa.ends_with([' ', '(', '\u{201c}']) {
                    ipa.push(' ');
                }
                ipa.push_str(&run);
            }
            TextPart::Punct(ch) => {
                if matches!(ch, '(' | '\u{201c}') && !ipa.is_empty() && !ipa.ends_with(' ') {
                    ipa.push(' ');
                }
                ipa.push(*ch);
            }
        }
    }
    Ok(ipa)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TextPart {
    Text(String),
    Punct(char),
}

fn split_text_parts(text: &str) -> Vec<TextPart> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for (idx, ch) in text.char_indices() {
        if is_boundary_punctuation(ch) && !is_numeric_connector(text, idx, ch) {
            flush_text_part(&mut parts, &mut current);
            parts.push(TextPart::Punct(ch));
            continue;
        }
        if ch.is_whitespace() {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
            }
            continue;
        }
        current.push(ch);
    }

    flush_text_part(&mut parts, &mut current);
    parts
}

fn flush_text_part(parts: &mut Vec<TextPart>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        parts.push(TextPart::Text(trimmed.to_string()));
    }
    current.clear();
}

/// Punctuation the voice has a token for.
fn is_boundary_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '.' | '!' | '?' | ',' | ';' | ':' | '—' | '…' | '"' | '(' | ')' | '\u{201c}' | '\u{201d}'
    )
}

/// `2.5` and `1,000` stay inside the text run so espeak reads them as numbers.
fn is_numeric_connector(text: &str, idx: usize, ch: char) -> bool {
    if !matches!(ch, '.' | ',') {
        return false;
    }
    let prev = text[..idx].chars().next_back();
    let next = text[idx + ch.len_utf8()..].chars().next();
    matches!(
        (prev, next),
        (Some(left), Some(right)) if left.is_ascii_digit() && right.is_ascii_digit()
    )
}

/// One espeak call for all runs, one input line each. If espeak does not
/// answer line for line, each run is phonemized separately.
fn phonemize_runs(
    runs: &[&str],
    voice: &str,
    espeak: &EspeakConfig,
) -> Result<Vec<String>, OnnxError> {
    let output = run_espeak(&runs.join("\n"), voice, espeak)?;
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() == runs.len() {
        return Ok(lines.into_iter().map(clean_ipa).collect());
    }

    log::debug!(
        "espeak-ng returned {} lines for {} runs; phonemizing runs one by one",
        lines.len(),
        runs.len()
    );
    runs.iter()
        .map(|run| {
            let output = run_espeak(run, voice, espeak)?;
            let joined = output
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Ok(clean_ipa(&joined))
        })
        .collect()
}

fn clean_ipa(line: &str) -> String {
    line.replace('_', "")
}

fn run_espeak(input: &str, voice: &str, espeak: &EspeakConfig) -> Result<String, OnnxError> {
    let bin = espeak
        .bin_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("espeak-ng"));

    let mut command = Command::new(&bin);
    command
        .args(["--ipa", "--stdin", "-q", "-v", voice])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(data) = &espeak.data_path {
        command.env("ESPEAK_DATA_PATH", data);
    }

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            OnnxError::EspeakNotFound
        } else {
            OnnxError::Io(e)
        }
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        // stdin mode is line oriented; an unterminated last line can lose its final phoneme.
        stdin.write_all(input.as_bytes())?;
        stdin.write_all(b"\n")?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OnnxError::PhonemizerFailed(format!(
            "espeak-ng exited with code {:?}: {stderr}",
            output.status.code()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn espeak_available() -> bool {
        Command::new("espeak-ng").arg("--version").output().is_ok()
    }

    #[test]
    fn blank_text_needs_no_espeak() {
        let missing = EspeakConfig {
            bin_path: Some(PathBuf::from("/nonexistent/espeak-ng")),
            data_path: None,
        };
        assert_eq!(phonemize("   ", "en-us", &missing).unwrap(), "");
    }

    #[test]
    fn missing_binary_is_reported() {
        let missing = EspeakConfig {
            bin_path: Some(PathBuf::from("/nonexistent/espeak-ng")),
            data_path: None,
        };
        assert!(matches!(
            phonemize("hello", "en-us", &missing),
            Err(OnnxError::EspeakNotFound)
        ));
    }

    #[test]
    fn punctuation_only_needs_no_espeak() {
        let missing = EspeakConfig {
            bin_path: Some(PathBuf::from("/nonexistent/espeak-ng")),
            data_path: None,
        };
        assert_eq!(phonemize(" ?! ", "en-us", &missing).unwrap(), "?!");
    }

    #[test]
    fn splits_at_inner_punctuation() {
        assert_eq!(
            split_text_parts("It sounds real, doesn't it?"),
            vec![
                TextPart::Text("It sounds real".to_string()),
                TextPart::Punct(','),
                TextPart::Text("doesn't it".to_string()),
                TextPart::Punct('?'),
            ]
        );
    }

    #[test]
    fn quotes_and_dashes_are_parts() {
        assert_eq!(
            split_text_parts("\u{201c}Wait\u{201d} \u{2014} she said"),
            vec![
                TextPart::Punct('\u{201c}'),
                TextPart::Text("Wait".to_string()),
                TextPart::Punct('\u{201d}'),
                TextPart::Punct('\u{2014}'),
                TextPart::Text("she said".to_string()),
            ]
        );
    }

    #[test]
    fn numbers_keep_their_separators() {
        assert_eq!(
            split_text_parts("about 2.5 or 1,000."),
            vec![
                TextPart::Text("about 2.5 or 1,000".to_string()),
                TextPart::Punct('.'),
            ]
        );
    }

    #[test]
    fn whitespace_collapses_inside_runs() {
        assert_eq!(
            split_text_parts("  one\n  two\t"),
            vec![TextPart::Text("one two".to_string())]
        );
    }

    #[test]
    fn keeps_punctuation_in_place() {
        if !espeak_available() {
            return;
        }
        let ipa = phonemize("Hello, world.", "en-us", &EspeakConfig::default()).unwrap();
        assert!(ipa.ends_with('.'), "{ipa:?}");
        let comma = ipa.find(',').expect("inner comma survives");
        assert!(comma > 0 && comma < ipa.len() - 2, "{ipa:?}");
        assert_eq!(ipa.matches(',').count(), 1);
    }
}
