//! Extract → translate → store, with a scripted endpoint.

use async_trait::async_trait;
use edgequake_pdftrans::pipeline::llm::{ChatRequest, Completion, ContentPart, MessageContent};
use edgequake_pdftrans::{
    cancel_pair, export_translation, CancelToken, CompletionBackend, CompletionError,
    Credentials, ExportSide, LanguagePair, PipelineConfig, TranslateError, TranslationStore,
    Translator,
};
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<Completion, CompletionError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .iter()
                    .map(|t| {
                        Ok(Completion {
                            content: t.to_string(),
                            ..Completion::default()
                        })
                    })
                    .collect(),
            ),
            ..Self::default()
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        _credentials: &Credentials,
        request: &ChatRequest,
    ) -> Result<Completion, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(CompletionError::Transport {
                detail: "no scripted reply".into(),
            })
        })
    }
}

fn translator(backend: Arc<ScriptedBackend>) -> Translator {
    let config = PipelineConfig::builder().backend(backend).build().unwrap();
    Translator::new(config).unwrap()
}

fn creds() -> Credentials {
    Credentials::new("sk-test", "")
}

fn system_text(request: &ChatRequest) -> String {
    match &request.messages[0].content {
        MessageContent::Text(t) => t.clone(),
        other => panic!("system turn should be text, got {other:?}"),
    }
}

fn write_png(dir: &std::path::Path, name: &str) -> String {
    let path = dir.join(name);
    RgbImage::from_pixel(32, 24, Rgb([240, 240, 240]))
        .save(&path)
        .unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn image_file_is_read_translated_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_png(dir.path(), "menu.png");
    let backend = ScriptedBackend::new(&["```markdown\n# Speisekarte\n```", "# Menu"]);
    let translator = translator(backend.clone());
    let mut store = TranslationStore::open(dir.path().join("store")).unwrap();
    let pair = LanguagePair::new("de", "en").unwrap();

    let record = translator
        .process_file(&input, &pair, &creds(), &mut store, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(record.file_name, "menu.png");
    assert_eq!(record.original_text, "# Speisekarte");
    assert_eq!(record.translated_text, "# Menu");
    assert_eq!(record.source_language, "de");
    assert_eq!(record.target_language, "en");
    assert_eq!(store.list().first().map(|t| &t.id), Some(&record.id));

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    match &requests[0].messages[1].content {
        MessageContent::Parts(parts) => assert!(parts.iter().any(|p| matches!(
            p,
            ContentPart::ImageUrl { image_url } if image_url.url.starts_with("data:image/jpeg;base64,")
        ))),
        other => panic!("image request should be multimodal, got {other:?}"),
    }
    assert!(system_text(&requests[1]).contains("German text into English"));

    let reopened = TranslationStore::open(dir.path().join("store")).unwrap();
    assert_eq!(reopened.list(), store.list());
}

#[tokio::test]
async fn blank_image_reply_means_no_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_png(dir.path(), "blank.png");
    let backend = ScriptedBackend::new(&["   "]);
    let translator = translator(backend.clone());
    let mut store = TranslationStore::open(dir.path().join("store")).unwrap();
    let pair = LanguagePair::new("auto", "fr").unwrap();

    let err = translator
        .process_file(&input, &pair, &creds(), &mut store, &CancelToken::never())
        .await
        .unwrap_err();

    assert!(
        matches!(&err, TranslateError::NoTextExtracted { name } if name == "blank.png"),
        "got {err:?}"
    );
    assert_eq!(backend.requests().len(), 1, "no translation request is made");
    assert!(store.list().is_empty());
}

#[tokio::test]
async fn pasted_text_is_translated_with_auto_source() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&["Bonjour"]);
    let translator = translator(backend.clone());
    let mut store = TranslationStore::open(dir.path()).unwrap();
    let pair = LanguagePair::new("auto", "fr").unwrap();

    let record = translator
        .process_text("Hello", &pair, &creds(), &mut store, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(record.file_name, "Text translation");
    assert_eq!(record.translated_text, "Bonjour");
    assert_eq!(record.source_language, "auto");
    let prompt = system_text(&backend.requests()[0]);
    assert!(prompt.contains("the following text into French"), "got: {prompt}");

    let out = tempfile::tempdir().unwrap();
    let path = export_translation(&record, ExportSide::Translated, out.path()).unwrap();
    assert!(path.ends_with("Text translation_translated_fr.md"));
}

#[tokio::test]
async fn missing_key_fails_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&["unused"]);
    let translator = translator(backend.clone());
    let mut store = TranslationStore::open(dir.path()).unwrap();
    let pair = LanguagePair::new("en", "de").unwrap();

    let err = translator
        .process_text(
            "Hello",
            &pair,
            &Credentials::new("  ", ""),
            &mut store,
            &CancelToken::never(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TranslateError::MissingApiKey));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn failed_translation_is_not_stored() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&[]);
    let translator = translator(backend);
    let mut store = TranslationStore::open(dir.path()).unwrap();
    let pair = LanguagePair::new("en", "ja").unwrap();

    let err = translator
        .process_text("Hello", &pair, &creds(), &mut store, &CancelToken::never())
        .await
        .unwrap_err();

    assert!(matches!(err, TranslateError::Translation(CompletionError::Transport { .. })));
    assert!(store.list().is_empty());
}

#[tokio::test]
async fn cancelled_token_stops_translation() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&["never seen"]);
    let translator = translator(backend);
    let mut store = TranslationStore::open(dir.path()).unwrap();
    let pair = LanguagePair::new("en", "ja").unwrap();
    let (handle, token) = cancel_pair();
    handle.cancel();

    let err = translator
        .process_text("Hello", &pair, &creds(), &mut store, &token)
        .await
        .unwrap_err();

    assert!(matches!(err, TranslateError::Cancelled));
    assert!(store.list().is_empty());
}

#[tokio::test]
async fn unknown_file_type_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "plain text").unwrap();
    let translator = translator(ScriptedBackend::new(&[]));
    let mut store = TranslationStore::open(dir.path().join("store")).unwrap();
    let pair = LanguagePair::new("en", "de").unwrap();

    let err = translator
        .process_file(
            path.to_str().unwrap(),
            &pair,
            &creds(),
            &mut store,
            &CancelToken::never(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TranslateError::UnsupportedFileType { .. }), "got {err:?}");
}
