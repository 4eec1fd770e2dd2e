//! Deterministic stand-ins for the hosted providers, used by tests

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use scholar_core::{
    ChatMessage, EmbeddingProvider, Error, GenerationConfig, GenerationResult, LLMProvider,
    Result,
};

const DIMENSIONS: usize = 64;

/// Bag-of-words embedder: texts sharing words get similar vectors
pub struct HashEmbedder {
    pub calls: AtomicUsize,
    model_id: String,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::named("hash-embedder")
    }
}

impl HashEmbedder {
    /// Same vectors, reported under another model id
    pub fn named(model_id: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            model_id: model_id.to_string(),
        }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSIONS];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            let digest = md5::compute(word.as_bytes());
            vector[digest[0] as usize % DIMENSIONS] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Embedder whose every call fails
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::EmbeddingProvider("quota exceeded".to_string()))
    }

    fn model_id(&self) -> &str {
        "failing-embedder"
    }
}

/// Chat model that answers with the context it was given and keeps every request
#[derive(Default)]
pub struct EchoLLM {
    pub requests: Mutex<Vec<(Vec<ChatMessage>, f32)>>,
}

impl EchoLLM {
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

#[async_trait]
impl LLMProvider for EchoLLM {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<GenerationResult> {
        self.chat_with_config(messages, &GenerationConfig::default()).await
    }

    async fn chat_with_config(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        self.requests
            .lock()
            .expect("requests lock")
            .push((messages.to_vec(), config.temperature));

        let system = messages.first().map(|m| m.content.as_str()).unwrap_or_default();
        let context = system.split("\n\n").skip(1).collect::<Vec<_>>().join(" | ");

        Ok(GenerationResult {
            text: format!("From the papers: {}", context),
            model_id: config.model_id.clone(),
            tokens_used: None,
        })
    }

    fn model_id(&self) -> &str {
        "echo"
    }
}

/// Chat model whose every call fails
pub struct FailingLLM;

#[async_trait]
impl LLMProvider for FailingLLM {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<GenerationResult> {
        self.chat_with_config(messages, &GenerationConfig::default()).await
    }

    async fn chat_with_config(
        &self,
        _messages: &[ChatMessage],
        _config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        Err(Error::LLMProvider("service unavailable".to_string()))
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

/// Write a minimal PDF with one line of text per page
pub fn write_test_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Serve every connection on a local port with the same HTTP response
///
/// Returns the base URL and a counter of accepted connections. Responses
/// close the connection, so each request is one connection.
pub async fn serve_http(status: &'static str, body: Vec<u8>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), hits)
}
