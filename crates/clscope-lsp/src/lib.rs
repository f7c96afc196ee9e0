//! Language server for Common Lisp scope analysis.
//!
//! Editor queries are answered from one [`AnalysisResult`] per open
//! document. Results are owned by a dedicated backend thread; the
//! `tower-lsp` handlers talk to it over a channel and await one-shot
//! replies.

pub mod call_hierarchy;
pub mod completion;
pub mod line_index;
pub mod navigation;
pub mod outline;
pub mod semantic_tokens;

use std::sync::{Arc, Mutex};

use clscope_core::AnalysisConfig;
use clscope_scope::{analyze_cancellable, AnalysisResult};
use hashbrown::HashMap;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

pub use line_index::LineIndex;

// ── Public helpers (also used by tests) ──────────────────────────

/// Read the analysis configuration from `initializationOptions` or a
/// `workspace/didChangeConfiguration` payload. Settings may be nested under
/// a `clscope` key. Malformed settings fall back to the defaults.
pub fn config_from_json(value: Option<&serde_json::Value>) -> AnalysisConfig {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return AnalysisConfig::default();
    };
    let value = value.get("clscope").unwrap_or(value);
    match serde_json::from_value(value.clone()) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("invalid clscope settings: {err}; using defaults");
            AnalysisConfig::default()
        }
    }
}

pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(
            TextDocumentSyncKind::FULL,
        )),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec!["(".to_string()]),
            ..Default::default()
        }),
        document_symbol_provider: Some(OneOf::Left(true)),
        semantic_tokens_provider: Some(semantic_tokens::semantic_tokens_options()),
        references_provider: Some(OneOf::Left(true)),
        definition_provider: Some(OneOf::Left(true)),
        call_hierarchy_provider: Some(CallHierarchyServerCapability::Simple(true)),
        ..Default::default()
    }
}

/// Convert a protocol position in `analysis`'s text, logging failures.
fn offset_of(analysis: &AnalysisResult, position: Position) -> Option<usize> {
    LineIndex::new(analysis.text())
        .offset(position)
        .map_err(|err| tracing::warn!("{err}"))
        .ok()
}

fn location(uri: &Url, index: &LineIndex<'_>, range: clscope_core::TextRange) -> Location {
    Location {
        uri: uri.clone(),
        range: index.range(range),
    }
}

// ── Request types (sent from tower-lsp async handlers → backend thread) ─

/// A read-only question about one document, answered on the backend
/// thread. The closure sends its own reply.
type Query = Box<dyn FnOnce(&AnalysisResult) + Send>;

enum LspRequest {
    /// Document opened or changed; reanalyze.
    DocumentChanged {
        uri: Url,
        version: i32,
        text: String,
    },
    /// Document closed; drop its analysis.
    DocumentClosed { uri: Url },
    /// New settings; reanalyze every open document.
    Configure { config: AnalysisConfig },
    /// Run `query` against the latest analysis of `uri`. Dropped (and the
    /// reply channel with it) when the document is unknown.
    Query { uri: Url, query: Query },
    /// Shutdown the backend thread.
    Shutdown,
}

/// Latest version received per document. An analysis in progress gives up
/// once a newer version has arrived.
type Versions = Arc<Mutex<HashMap<Url, i32>>>;

// ── Backend (runs on a dedicated std::thread, owns all analyses) ─

struct Document {
    version: i32,
    analysis: AnalysisResult,
}

struct BackendState {
    config: AnalysisConfig,
    documents: HashMap<Url, Document>,
    versions: Versions,
}

impl BackendState {
    fn new(config: AnalysisConfig, versions: Versions) -> Self {
        BackendState {
            config,
            documents: HashMap::new(),
            versions,
        }
    }

    fn is_stale(&self, uri: &Url, version: i32) -> bool {
        self.versions
            .lock()
            .map(|latest| latest.get(uri).is_some_and(|&v| v > version))
            .unwrap_or(false)
    }

    fn update(&mut self, uri: Url, version: i32, text: &str) {
        let analysis = analyze_cancellable(text, &self.config, || self.is_stale(&uri, version));
        match analysis {
            Some(analysis) => {
                self.documents.insert(uri, Document { version, analysis });
            }
            None => tracing::debug!(%uri, version, "analysis superseded by a newer version"),
        }
    }

    fn configure(&mut self, config: AnalysisConfig) {
        if config == self.config {
            return;
        }
        tracing::info!(?config, "analysis configuration changed");
        self.config = config;
        let open: Vec<(Url, i32, String)> = self
            .documents
            .iter()
            .map(|(uri, doc)| (uri.clone(), doc.version, doc.analysis.text().to_string()))
            .collect();
        for (uri, version, text) in open {
            self.update(uri, version, &text);
        }
    }

    fn handle(&mut self, req: LspRequest) -> bool {
        match req {
            LspRequest::DocumentChanged { uri, version, text } => {
                self.update(uri, version, &text);
            }
            LspRequest::DocumentClosed { uri } => {
                self.documents.remove(&uri);
                if let Ok(mut versions) = self.versions.lock() {
                    versions.remove(&uri);
                }
            }
            LspRequest::Configure { config } => self.configure(config),
            LspRequest::Query { uri, query } => match self.documents.get(&uri) {
                Some(doc) => query(&doc.analysis),
                None => tracing::debug!(%uri, "query for unknown document"),
            },
            LspRequest::Shutdown => return false,
        }
        true
    }
}

// ── tower-lsp Backend ────────────────────────────────────────────

struct Backend {
    client: Client,
    tx: tokio::sync::mpsc::UnboundedSender<LspRequest>,
    versions: Versions,
}

impl Backend {
    fn new(
        client: Client,
        tx: tokio::sync::mpsc::UnboundedSender<LspRequest>,
        versions: Versions,
    ) -> Self {
        Backend {
            client,
            tx,
            versions,
        }
    }

    fn document_changed(&self, uri: Url, version: i32, text: String) {
        if let Ok(mut versions) = self.versions.lock() {
            versions.insert(uri.clone(), version);
        }
        let _ = self
            .tx
            .send(LspRequest::DocumentChanged { uri, version, text });
    }

    /// Run `f` on the backend thread against the analysis of `uri`.
    async fn query<T, F>(&self, uri: Url, f: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&AnalysisResult) -> T + Send + 'static,
    {
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        let query: Query = Box::new(move |analysis| {
            let _ = reply_tx.send(f(analysis));
        });
        let _ = self.tx.send(LspRequest::Query { uri, query });
        reply_rx.await.ok()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let config = config_from_json(params.initialization_options.as_ref());
        let _ = self.tx.send(LspRequest::Configure { config });
        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "clscope".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "clscope language server ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        let _ = self.tx.send(LspRequest::Shutdown);
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.document_changed(doc.uri, doc.version, doc.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        // We use FULL sync, so there's exactly one content change with the full text.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.document_changed(uri, version, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let _ = self.tx.send(LspRequest::DocumentClosed {
            uri: params.text_document.uri,
        });
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let config = config_from_json(Some(&params.settings));
        let _ = self.tx.send(LspRequest::Configure { config });
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let items = self
            .query(uri, move |analysis| {
                let offset = offset_of(analysis, position)?;
                Some(completion::completions(analysis, offset))
            })
            .await
            .flatten();
        Ok(items.map(CompletionResponse::Array))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let symbols = self
            .query(params.text_document.uri, outline::document_symbols)
            .await;
        Ok(symbols.map(DocumentSymbolResponse::Nested))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let tokens = self
            .query(params.text_document.uri, semantic_tokens::semantic_tokens)
            .await;
        Ok(tokens.map(SemanticTokensResult::Tokens))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;
        let reply_uri = uri.clone();
        let locations = self
            .query(uri, move |analysis| {
                let offset = offset_of(analysis, position)?;
                let index = LineIndex::new(analysis.text());
                let ranges = navigation::references(analysis, offset, include_declaration);
                Some(
                    ranges
                        .into_iter()
                        .map(|r| location(&reply_uri, &index, r))
                        .collect(),
                )
            })
            .await
            .flatten();
        Ok(locations)
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let reply_uri = uri.clone();
        let location = self
            .query(uri, move |analysis| {
                let offset = offset_of(analysis, position)?;
                let range = navigation::definition(analysis, offset)?;
                let index = LineIndex::new(analysis.text());
                Some(location(&reply_uri, &index, range))
            })
            .await
            .flatten();
        Ok(location.map(GotoDefinitionResponse::Scalar))
    }

    async fn prepare_call_hierarchy(
        &self,
        params: CallHierarchyPrepareParams,
    ) -> Result<Option<Vec<CallHierarchyItem>>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let reply_uri = uri.clone();
        let items = self
            .query(uri, move |analysis| {
                let offset = offset_of(analysis, position)?;
                call_hierarchy::prepare(analysis, &reply_uri, offset)
            })
            .await
            .flatten();
        Ok(items)
    }

    async fn incoming_calls(
        &self,
        params: CallHierarchyIncomingCallsParams,
    ) -> Result<Option<Vec<CallHierarchyIncomingCall>>> {
        let item = params.item;
        let calls = self
            .query(item.uri.clone(), move |analysis| {
                call_hierarchy::incoming_calls(analysis, &item)
            })
            .await;
        Ok(calls)
    }

    async fn outgoing_calls(
        &self,
        params: CallHierarchyOutgoingCallsParams,
    ) -> Result<Option<Vec<CallHierarchyOutgoingCall>>> {
        let item = params.item;
        let calls = self
            .query(item.uri.clone(), move |analysis| {
                call_hierarchy::outgoing_calls(analysis, &item)
            })
            .await;
        Ok(calls)
    }
}

// ── Server entry point ───────────────────────────────────────────

/// Serve LSP over stdio until the client disconnects.
pub async fn run_server() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<LspRequest>();
    let versions: Versions = Arc::default();

    let (service, socket) = {
        let versions = versions.clone();
        LspService::new(move |client| Backend::new(client, tx.clone(), versions.clone()))
    };

    // Spawn the backend thread (owns every document analysis).
    let backend_handle = std::thread::spawn(move || {
        let mut state = BackendState::new(AnalysisConfig::default(), versions);
        while let Some(req) = rx.blocking_recv() {
            if !state.handle(req) {
                break;
            }
        }
        tracing::debug!("backend thread stopped");
    });

    tracing::info!("clscope language server started");
    Server::new(stdin, stdout, socket).serve(service).await;

    // Wait for backend thread to finish.
    let _ = backend_handle.join();
}
