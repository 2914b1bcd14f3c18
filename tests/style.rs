//! Style extraction integration tests

use yomi::persona::PersonaSource;
use yomi::style::{ExtractOptions, MAX_PROMPT_EXAMPLES, read_transcript, unique_messages};
use yomi::{PersonaArtifact, PersonaPrompt, StyleExtractor};

fn line(n: usize, speaker: &str, text: &str) -> String {
    format!("[1/{}/24, 9:{:02}:00 PM] {speaker}: {text}", n % 28 + 1, n % 60)
}

#[test]
fn transcript_to_loaded_persona() {
    let transcript = [
        "[1/1/24, 9:00:00 PM] alex: you up?".to_string(),
        line(1, "duke.sol", "I love you babe"),
        "[1/1/24, 9:02:00 PM] duke.sol: ‎image omitted".to_string(),
    ]
    .join("\n");

    let extraction = StyleExtractor::new("duke.sol").unwrap().extract(&transcript);
    assert_eq!(extraction.texts(), vec!["I love you babe"]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("textingStyle.json");
    PersonaArtifact::render("duke.sol", &extraction.texts())
        .write(&path)
        .unwrap();

    let persona = PersonaPrompt::load(&path);
    assert!(!persona.is_fallback());
    assert!(persona.as_str().contains("1. \"I love you babe\""));
    assert!(persona.as_str().contains("(duke.sol)"));
    assert_eq!(
        persona.source(),
        &PersonaSource::Artifact {
            speaker: "duke.sol".to_string(),
            examples_count: 1,
        }
    );
}

#[test]
fn duplicate_lines_collapse_in_order() {
    let transcript = [
        "[1/1/24, 9:00:00 PM] duke.sol: hey",
        "[1/1/24, 9:01:00 PM] duke.sol: hey",
        "[1/1/24, 9:02:00 PM] duke.sol: hey",
        "[1/1/24, 9:03:00 PM] duke.sol: ok",
    ]
    .join("\n");

    let extractor = StyleExtractor::new("duke.sol")
        .unwrap()
        .with_options(ExtractOptions::unfiltered());

    let unique = unique_messages(extractor.parse(&transcript));
    let texts: Vec<&str> = unique.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["hey", "ok"]);
}

#[test]
fn large_transcript_favours_recent_messages() {
    let transcript: Vec<String> = (0..1000)
        .map(|n| line(n, "duke.sol", &format!("message number {n}")))
        .collect();
    let transcript = transcript.join("\n");

    let extraction = StyleExtractor::new("duke.sol").unwrap().extract(&transcript);
    let report = extraction.report;

    assert_eq!(report.matched, 1000);
    assert_eq!(report.unique, 1000);
    assert_eq!((report.early, report.middle, report.recent), (300, 400, 300));
    let recent = report.recent_span.unwrap();
    assert!((recent.start - 0.7).abs() < 1e-9);
    assert!((recent.end - 0.999).abs() < 1e-9);

    // Every recent message, then a thinner sample of older ones
    assert_eq!(extraction.examples[0].text, "message number 700");
    assert!(report.examples > report.recent);
    assert!(report.examples < report.unique);

    let prompt = PersonaArtifact::render("duke.sol", &extraction.texts()).system_prompt;
    assert!(prompt.contains(&format!("{MAX_PROMPT_EXAMPLES}. \"message number 999\"")));
    assert!(!prompt.contains(&format!("{}. ", MAX_PROMPT_EXAMPLES + 1)));
}

#[test]
fn missing_artifact_falls_back_to_generic_persona() {
    let dir = tempfile::tempdir().unwrap();
    let persona = PersonaPrompt::load(&dir.path().join("absent.json"));
    assert!(persona.is_fallback());
    assert!(!persona.as_str().is_empty());
}

#[test]
fn malformed_artifact_falls_back_to_generic_persona() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("textingStyle.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(PersonaPrompt::load(&path).is_fallback());
}

#[test]
fn invalid_utf8_bytes_do_not_block_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat.txt");
    let mut bytes = b"[1/1/24, 9:00:00 PM] duke.sol: I love you babe\n".to_vec();
    bytes.extend_from_slice(b"[1/1/24, 9:01:00 PM] duke.sol: caf\xe9 later?\n");
    std::fs::write(&path, &bytes).unwrap();

    let transcript = read_transcript(&path).unwrap();
    assert!(transcript.contains("caf\u{FFFD} later?"));

    let extraction = StyleExtractor::new("duke.sol").unwrap().extract(&transcript);
    let texts = extraction.texts();
    assert!(texts.contains(&"I love you babe".to_string()));
    assert!(texts.contains(&"caf\u{FFFD} later?".to_string()));

    let artifact_path = dir.path().join("textingStyle.json");
    PersonaArtifact::render("duke.sol", &texts)
        .write(&artifact_path)
        .unwrap();
    assert!(artifact_path.exists());
}

#[test]
fn missing_transcript_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_transcript(&dir.path().join("absent.txt")).is_err());
}
