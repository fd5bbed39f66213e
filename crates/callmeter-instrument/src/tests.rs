use crate::*;

// ── Estimators ──────────────────────────────────────────────────────

#[test]
fn token_estimate_floors_words_times_factor() {
    assert_eq!(estimate_tokens(""), 0);
    assert_eq!(estimate_tokens("hello"), 1);
    assert_eq!(estimate_tokens("one two three four five"), 6);
    assert_eq!(estimate_tokens("  spaced\tout\nwords  "), 3);
    assert_eq!(estimate_tokens(&"word ".repeat(10)), 13);
}

#[test]
fn audio_estimates() {
    assert!((estimate_tts_audio(25) - 2.5).abs() < 1e-9);
    assert_eq!(estimate_tts_audio(0), 0.0);
    assert_eq!(estimate_asr_audio(0.5), 1.0);
}

// ── Chunk text ──────────────────────────────────────────────────────

#[test]
fn completion_chunk_field_precedence() {
    let chunk = CompletionChunk {
        content: Some(String::new()),
        delta: Some("from delta".to_string()),
        text: Some("from text".to_string()),
        message: None,
    };
    assert_eq!(chunk.chunk_text(), Some("from delta"));

    let chunk = CompletionChunk {
        message: Some(ChatMessage::new("assistant", "from message")),
        ..CompletionChunk::default()
    };
    assert_eq!(chunk.chunk_text(), Some("from message"));

    assert_eq!(CompletionChunk::content("hi").chunk_text(), Some("hi"));
    assert_eq!(CompletionChunk::default().chunk_text(), None);
}

#[test]
fn completion_chunk_from_vendor_json() {
    let chunk: CompletionChunk = serde_json::from_str(r#"{"text": "Hello"}"#).unwrap();
    assert_eq!(chunk.chunk_text(), Some("Hello"));

    let chunk: CompletionChunk =
        serde_json::from_str(r#"{"message": {"role": "assistant", "content": "Hi"}}"#).unwrap();
    assert_eq!(chunk.chunk_text(), Some("Hi"));
}

#[test]
fn plain_chunks() {
    assert_eq!("abc".chunk_text(), Some("abc"));
    assert_eq!(String::from("xyz").chunk_text(), Some("xyz"));
    assert_eq!(vec![0u8, 1, 2].chunk_text(), None);
}

#[test]
fn prompt_text_content_ignores_roles() {
    let prompt = Prompt::Messages(vec![
        ChatMessage::new("system", "You are helpful."),
        ChatMessage::new("user", "What time is it?"),
    ]);
    assert_eq!(prompt.text_content(), "You are helpful. What time is it?");
    assert_eq!(Prompt::from("plain").text_content(), "plain");
}
