use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info};

use super::capabilities::server_capabilities;
use super::handlers::completion::handle_completion;
use crate::assist::backend::command::CommandBackend;
use crate::assist::backend::{CompletionBackend, NoopBackend};
use crate::assist::engine::AssistEngine;
use crate::config::CompletionConfig;
use crate::language::LanguageRegistry;
use crate::workspace::{Workspace, document::Document};

pub struct Backend {
    client: Client,
    pub workspace: Arc<Workspace>,
    engine: RwLock<Arc<AssistEngine>>,
    pub registry: Arc<LanguageRegistry>,
    pub config: RwLock<CompletionConfig>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        let config = CompletionConfig::default();
        Self {
            client,
            workspace: Arc::new(Workspace::new()),
            engine: RwLock::new(Arc::new(build_engine(&config))),
            registry: Arc::new(LanguageRegistry::new()),
            config: RwLock::new(config),
        }
    }

    fn is_supported(&self, lang_id: &str) -> bool {
        self.registry.find(lang_id).is_some()
    }

    pub async fn update_config(&self, params: serde_json::Value) {
        let new_config = match serde_json::from_value::<CompletionConfig>(params) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Failed to parse incoming config");
                return;
            }
        };
        info!(config = ?new_config, "Config updated");
        self.workspace.apply_config(&new_config);
        *self.engine.write().await = Arc::new(build_engine(&new_config));
        *self.config.write().await = new_config;
    }
}

fn build_engine(config: &CompletionConfig) -> AssistEngine {
    let backend: Arc<dyn CompletionBackend> = match &config.backend {
        Some(command) => Arc::new(CommandBackend::new(command)),
        None => Arc::new(NoopBackend),
    };
    AssistEngine::new(config.clone(), backend)
}

/// Infer Language ID from LSP URI
pub(crate) fn language_id_from_uri(uri: &Url) -> &'static str {
    match uri.path().rsplit('.').next() {
        Some("java") => "java",
        _ => "plaintext",
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        info!("LSP initialize");

        if let Some(options) = params.initialization_options {
            self.update_config(options).await;
        }

        let capabilities = server_capabilities(&*self.config.read().await);
        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "java-assist".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            capabilities,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("LSP initialized");
        self.client
            .log_message(MessageType::INFO, "java-assist ready")
            .await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        info!("LSP shutdown");
        Ok(())
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.update_config(params.settings).await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let td = params.text_document;
        if !self.is_supported(&td.language_id) {
            return;
        }

        info!(uri = %td.uri, lang = %td.language_id, "did_open");

        let config = self.config.read().await;
        self.workspace.documents.open(Document::new(
            td.uri,
            td.language_id,
            td.version,
            &td.text,
            &config,
        ));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = &params.text_document.uri;

        // full sync: the last change holds the whole text
        let content = match params.content_changes.into_iter().last() {
            Some(c) => c.text,
            None => return,
        };

        let Some(doc) = self.workspace.documents.get(uri) else {
            debug!(uri = %uri, lang = language_id_from_uri(uri), "change for unopened document");
            return;
        };

        let typed = self
            .workspace
            .documents
            .update(uri, params.text_document.version, &content);
        if let Some(c) = typed {
            doc.queries.on_keystroke(c);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = &params.text_document.uri;
        info!(uri = %uri, "did_close");
        self.workspace.documents.close(uri);
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let engine = Arc::clone(&*self.engine.read().await);
        let response = handle_completion(Arc::clone(&self.workspace), engine, params).await;
        Ok(response)
    }
}
