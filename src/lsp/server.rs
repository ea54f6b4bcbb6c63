//! LSP server implementation using lsp-server (synchronous).
//!
//! This is a simple synchronous LSP server that handles requests one at a time.

use std::error::Error;
use std::path::{Path, PathBuf};

use lsp_server::{Connection, ErrorCode, Message, Notification, Request, RequestId, Response};
use lsp_types::{
    CompletionItem, CompletionList, CompletionOptions, CompletionParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, Hover, HoverContents, HoverParams, HoverProviderCapability,
    InitializeParams, InsertTextFormat, MarkupContent, MarkupKind, Position, Range,
    ServerCapabilities, SetTraceParams, TextDocumentSyncCapability, TextDocumentSyncKind,
    TextDocumentSyncOptions,
    notification::{
        DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, DidSaveTextDocument,
        SetTrace,
    },
    request::{Completion, HoverRequest},
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tweaked_catalog::{Catalog, CatalogError};

use super::completion::CompletionEngine;
use super::documents::DocumentStore;
use super::hover::HoverEngine;
use super::lexical::{self, utf16_column};
use super::symbol_index::{Symbol, SymbolIndex, SymbolKind};
use super::tracing_layer::{LspLayer, LspLayerHandle};

const SERVER_NAME: &str = "tweaked-lsp";

/// Options for [`serve`].
#[derive(Clone, Debug)]
pub struct ServeOptions {
    /// Catalog file to load instead of the embedded one.
    pub catalog: Option<PathBuf>,
    /// `EnvFilter` directive for stderr logging.
    pub log_level: String,
    /// Also forward log events to the client as `window/logMessage`.
    pub log_to_client: bool,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            catalog: None,
            log_level: "info".to_string(),
            log_to_client: false,
        }
    }
}

/// Main LSP server state.
struct LspServer {
    connection: Connection,
    index: SymbolIndex,
    documents: DocumentStore,
    log_handle: Option<LspLayerHandle>,
}

impl LspServer {
    fn new(connection: Connection, index: SymbolIndex, log_handle: Option<LspLayerHandle>) -> Self {
        Self {
            connection,
            index,
            documents: DocumentStore::new(),
            log_handle,
        }
    }

    fn run(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        loop {
            let msg = self.connection.receiver.recv()?;
            if self.process_message(msg)? {
                return Ok(());
            }
        }
    }

    /// Process a single message. Returns `Ok(true)` if shutdown was requested.
    fn process_message(&mut self, msg: Message) -> Result<bool, Box<dyn Error + Send + Sync>> {
        match msg {
            Message::Request(req) => {
                if self.connection.handle_shutdown(&req)? {
                    tracing::info!("Shutdown requested");
                    return Ok(true);
                }
                self.handle_request(req)?;
            }
            Message::Response(_) => {
                // We don't send requests, so we shouldn't get responses
            }
            Message::Notification(notif) => {
                self.handle_notification(notif)?;
            }
        }
        Ok(false)
    }

    fn handle_request(&mut self, req: Request) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(method = %req.method, "Received request");

        let response = if let Some((id, params)) = cast_request::<HoverRequest>(req.clone()) {
            Response::new_ok(id, self.hover(params))
        } else if let Some((id, params)) = cast_request::<Completion>(req.clone()) {
            Response::new_ok(id, self.completion(params))
        } else {
            tracing::debug!(method = %req.method, "Unsupported request");
            Response::new_err(
                req.id,
                ErrorCode::MethodNotFound as i32,
                format!("unsupported request: {}", req.method),
            )
        };
        self.connection.sender.send(Message::Response(response))?;
        Ok(())
    }

    fn handle_notification(
        &mut self,
        notif: Notification,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(params) = cast_notification::<DidOpenTextDocument>(notif.clone()) {
            self.did_open(params);
        } else if let Some(params) = cast_notification::<DidChangeTextDocument>(notif.clone()) {
            self.did_change(params);
        } else if let Some(params) = cast_notification::<DidCloseTextDocument>(notif.clone()) {
            self.did_close(params);
        } else if let Some(params) = cast_notification::<DidSaveTextDocument>(notif.clone()) {
            self.did_save(params);
        } else if let Some(params) = cast_notification::<SetTrace>(notif.clone()) {
            self.set_trace(params);
        } else {
            tracing::debug!(method = %notif.method, "Ignoring notification");
        }
        Ok(())
    }

    fn did_open(&mut self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!(uri = uri.as_str(), "Document opened");
        self.documents.open(&uri, params.text_document.text);
    }

    fn did_change(&mut self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!(uri = uri.as_str(), "Document changed");

        // Full sync: each event carries the whole buffer, the last one wins
        let mut latest = None;
        for change in params.content_changes {
            if change.range.is_some() {
                tracing::warn!(uri = uri.as_str(), "Ignoring ranged change under full sync");
                continue;
            }
            latest = Some(change.text);
        }
        if let Some(text) = latest {
            self.documents.replace(&uri, text);
        }
    }

    fn did_close(&mut self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!(uri = uri.as_str(), "Document closed");
        self.documents.close(&uri);
    }

    fn did_save(&mut self, params: DidSaveTextDocumentParams) {
        tracing::info!(uri = params.text_document.uri.as_str(), "Document saved");
    }

    fn set_trace(&mut self, params: SetTraceParams) {
        tracing::info!(value = ?params.value, "SetTrace called");
        if let Some(handle) = &self.log_handle {
            handle.set_trace(params.value);
        }
    }

    fn hover(&self, params: HoverParams) -> Option<Hover> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        tracing::debug!(
            line = position.line,
            character = position.character,
            "Hover request"
        );

        let text = self.documents.get(uri)?;
        let context = lexical::resolve(&text, position.line, position.character)?;
        let value = HoverEngine::new(&self.index).hover(context.token)?;

        tracing::debug!(token = context.token, "Found hover");

        let range = Range {
            start: Position {
                line: position.line,
                character: utf16_column(context.line_text, context.token_span.start),
            },
            end: Position {
                line: position.line,
                character: utf16_column(context.line_text, context.token_span.end),
            },
        };

        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: Some(range),
        })
    }

    fn completion(&self, params: CompletionParams) -> CompletionList {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        tracing::debug!(
            line = position.line,
            character = position.character,
            "Completion request"
        );

        let symbols = self
            .documents
            .get(uri)
            .and_then(|text| {
                let context = lexical::resolve(&text, position.line, position.character)?;
                Some(CompletionEngine::new(&self.index).complete(context.text_before_cursor))
            })
            .unwrap_or_default();

        let items: Vec<CompletionItem> = symbols.into_iter().map(completion_item).collect();

        tracing::debug!(count = items.len(), "Completion items");

        CompletionList {
            is_incomplete: false,
            items,
        }
    }
}

fn completion_item(symbol: Symbol) -> CompletionItem {
    let insert_text_format = match symbol.kind {
        SymbolKind::Function => InsertTextFormat::SNIPPET,
        SymbolKind::Module => InsertTextFormat::PLAIN_TEXT,
    };
    CompletionItem {
        detail: Some(symbol.detail().to_string()),
        kind: Some(symbol.kind.into()),
        label: symbol.label,
        documentation: Some(symbol.documentation.into()),
        sort_text: Some(symbol.sort_key),
        insert_text: Some(symbol.insert_template),
        insert_text_format: Some(insert_text_format),
        ..Default::default()
    }
}

/// Get the server capabilities.
fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                ..Default::default()
            },
        )),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![".".to_string(), ":".to_string()]),
            resolve_provider: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Initialize the LSP server with the given connection.
///
/// This performs the LSP initialize handshake and returns a ready-to-run server.
fn initialize_server(
    connection: Connection,
    index: SymbolIndex,
    log_handle: Option<LspLayerHandle>,
) -> Result<LspServer, Box<dyn Error + Send + Sync>> {
    let (id, init_params) = connection.initialize_start()?;
    let params: InitializeParams = serde_json::from_value(init_params)?;
    if let Some(client) = &params.client_info {
        tracing::info!(client = %client.name, "Initialize called");
    }

    let capabilities = serde_json::to_value(server_capabilities())?;
    let result = serde_json::json!({
        "capabilities": capabilities,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    });
    connection.initialize_finish(id, result)?;

    if let Some(handle) = &log_handle {
        handle.mark_initialized();
    }
    tracing::info!(symbols = index.len(), "Server initialized");
    Ok(LspServer::new(connection, index, log_handle))
}

/// Load the catalog from `path`, or the embedded catalog when `None`.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog, CatalogError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading catalog");
            Catalog::from_path(path)
        }
        None => Catalog::embedded(),
    }
}

/// Install the stderr subscriber, plus the client-forwarding layer if requested.
fn init_tracing(
    connection: &Connection,
    options: &ServeOptions,
) -> Result<Option<LspLayerHandle>, Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_new(&options.log_level)?;
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let (lsp_layer, handle) = if options.log_to_client {
        let (layer, handle) = LspLayer::new(connection);
        (Some(layer), Some(handle))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(lsp_layer)
        .try_init()?;
    Ok(handle)
}

/// Start the LSP server on stdio.
///
/// The catalog is loaded before the handshake; a catalog error aborts startup.
pub fn serve(options: &ServeOptions) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (connection, io_threads) = Connection::stdio();
    let log_handle = init_tracing(&connection, options)?;

    let catalog = load_catalog(options.catalog.as_deref())?;
    let index = SymbolIndex::build(&catalog);

    let mut server = initialize_server(connection, index, log_handle)?;
    let result = server.run();

    // Every sender must be gone before the writer thread can finish
    if let Some(handle) = &server.log_handle {
        handle.disconnect();
    }
    drop(server);
    result?;
    io_threads.join()?;
    Ok(())
}

/// Cast a request to a specific type.
fn cast_request<R: lsp_types::request::Request>(req: Request) -> Option<(RequestId, R::Params)> {
    if req.method == R::METHOD {
        let params = serde_json::from_value(req.params).ok()?;
        Some((req.id, params))
    } else {
        None
    }
}

/// Cast a notification to a specific type.
fn cast_notification<N: lsp_types::notification::Notification>(
    notif: Notification,
) -> Option<N::Params> {
    if notif.method == N::METHOD {
        serde_json::from_value(notif.params).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI32, Ordering};

    use lsp_types::{
        CompletionItemKind, CompletionResponse, InitializeResult, TextDocumentContentChangeEvent,
        TextDocumentIdentifier, TextDocumentItem, TextDocumentPositionParams, TraceValue, Uri,
        VersionedTextDocumentIdentifier, request::Request as _,
    };

    use super::*;
    use crate::lsp::fixtures::sample_index;

    static REQUEST_ID: AtomicI32 = AtomicI32::new(1);

    fn next_request_id() -> RequestId {
        RequestId::from(REQUEST_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Test harness that creates a server and client connection pair.
    struct TestHarness {
        server: LspServer,
        client: Connection,
        initialize_result: InitializeResult,
    }

    impl TestHarness {
        fn new() -> Self {
            use lsp_types::request::Initialize;

            let (server_conn, client_conn) = Connection::memory();

            // Send initialize request from client
            let init_request = Request::new(
                RequestId::from(0),
                Initialize::METHOD.to_string(),
                InitializeParams::default(),
            );
            client_conn
                .sender
                .send(Message::Request(init_request))
                .unwrap();

            // initialize_finish waits for the initialized notification
            let initialized = Notification::new("initialized".to_string(), serde_json::json!({}));
            client_conn
                .sender
                .send(Message::Notification(initialized))
                .unwrap();

            let server = initialize_server(server_conn, sample_index(), None).unwrap();

            let initialize_result = match client_conn.receiver.recv().unwrap() {
                Message::Response(resp) => serde_json::from_value(resp.result.unwrap()).unwrap(),
                other => panic!("Expected initialize response, got {:?}", other),
            };

            Self {
                server,
                client: client_conn,
                initialize_result,
            }
        }

        /// Send a notification and process it on the server side.
        fn notify<N: lsp_types::notification::Notification>(&mut self, params: N::Params)
        where
            N::Params: serde::Serialize,
        {
            let notif = Notification::new(N::METHOD.to_string(), params);
            self.client
                .sender
                .send(Message::Notification(notif))
                .unwrap();

            let msg = self.server.connection.receiver.recv().unwrap();
            self.server.process_message(msg).unwrap();
        }

        fn open_document(&mut self, uri: &Uri, text: &str) {
            self.notify::<DidOpenTextDocument>(DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: uri.clone(),
                    language_id: "lua".to_string(),
                    version: 1,
                    text: text.to_string(),
                },
            });
        }

        fn change_document(&mut self, uri: &Uri, version: i32, text: &str) {
            self.notify::<DidChangeTextDocument>(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier {
                    uri: uri.clone(),
                    version,
                },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: text.to_string(),
                }],
            });
        }

        /// Send a raw request and get the raw response.
        fn raw_request(&mut self, req: Request) -> Response {
            let id = req.id.clone();
            self.client.sender.send(Message::Request(req)).unwrap();

            let msg = self.server.connection.receiver.recv().unwrap();
            self.server.process_message(msg).unwrap();

            match self.client.receiver.recv().unwrap() {
                Message::Response(resp) => {
                    assert_eq!(resp.id, id);
                    resp
                }
                other => panic!("Expected response message, got {:?}", other),
            }
        }

        /// Send a request and get the response.
        fn request<R: lsp_types::request::Request>(&mut self, params: R::Params) -> R::Result
        where
            R::Params: serde::Serialize,
            R::Result: serde::de::DeserializeOwned,
        {
            let req = Request::new(next_request_id(), R::METHOD.to_string(), params);
            let resp = self.raw_request(req);
            assert!(resp.error.is_none(), "Request failed: {:?}", resp.error);
            serde_json::from_value(resp.result.unwrap()).unwrap()
        }

        fn completion_labels(&mut self, uri: &Uri, line: u32, character: u32) -> Vec<String> {
            let params = CompletionParams {
                text_document_position: position_params(uri, line, character),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
                context: None,
            };
            match self.request::<Completion>(params) {
                Some(CompletionResponse::List(list)) => {
                    list.items.into_iter().map(|item| item.label).collect()
                }
                Some(CompletionResponse::Array(items)) => {
                    items.into_iter().map(|item| item.label).collect()
                }
                None => panic!("Completion should always respond with a list"),
            }
        }

        fn hover(&mut self, uri: &Uri, line: u32, character: u32) -> Option<Hover> {
            self.request::<HoverRequest>(HoverParams {
                text_document_position_params: position_params(uri, line, character),
                work_done_progress_params: Default::default(),
            })
        }
    }

    fn position_params(uri: &Uri, line: u32, character: u32) -> TextDocumentPositionParams {
        TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            position: Position { line, character },
        }
    }

    fn test_uri(name: &str) -> Uri {
        format!("file:///test/{}.lua", name).parse().unwrap()
    }

    fn hover_text(hover: Hover) -> String {
        match hover.contents {
            HoverContents::Markup(markup) => markup.value,
            other => panic!("Expected markup hover, got {:?}", other),
        }
    }

    #[test]
    fn test_initialize_advertises_capabilities() {
        let harness = TestHarness::new();
        let result = &harness.initialize_result;

        let server_info = result.server_info.as_ref().unwrap();
        assert_eq!(server_info.name, SERVER_NAME);

        let completion = result.capabilities.completion_provider.as_ref().unwrap();
        assert_eq!(
            completion.trigger_characters,
            Some(vec![".".to_string(), ":".to_string()])
        );
        assert_eq!(completion.resolve_provider, Some(false));
        assert_eq!(
            result.capabilities.hover_provider,
            Some(HoverProviderCapability::Simple(true))
        );
        match &result.capabilities.text_document_sync {
            Some(TextDocumentSyncCapability::Options(options)) => {
                assert_eq!(options.change, Some(TextDocumentSyncKind::FULL));
                assert_eq!(options.open_close, Some(true));
            }
            other => panic!("Unexpected sync capability: {:?}", other),
        }
    }

    #[test]
    fn test_completion_via_message() {
        let mut harness = TestHarness::new();
        let uri = test_uri("completion_msg");
        harness.open_document(&uri, "local x = 1\nterm.");

        let labels = harness.completion_labels(&uri, 1, 5);
        assert_eq!(labels, ["print", "clear", "setCursorPos"]);
    }

    #[test]
    fn test_completion_item_fields() {
        let mut harness = TestHarness::new();
        let uri = test_uri("completion_fields");
        harness.open_document(&uri, "term.set");

        let params = CompletionParams {
            text_document_position: position_params(&uri, 0, 8),
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: None,
        };
        let Some(CompletionResponse::List(list)) = harness.request::<Completion>(params) else {
            panic!("Expected completion list");
        };
        assert!(!list.is_incomplete);
        assert_eq!(list.items.len(), 1);

        let item = &list.items[0];
        assert_eq!(item.label, "setCursorPos");
        assert_eq!(item.kind, Some(CompletionItemKind::FUNCTION));
        assert_eq!(
            item.detail.as_deref(),
            Some("term.setCursorPos(x: number, y: number)")
        );
        assert_eq!(item.insert_text.as_deref(), Some("setCursorPos(${1:x}, ${2:y})$0"));
        assert_eq!(item.insert_text_format, Some(InsertTextFormat::SNIPPET));
        assert_eq!(item.sort_text.as_deref(), Some("!setCursorPos"));
        assert!(matches!(
            item.documentation,
            Some(lsp_types::Documentation::MarkupContent(_))
        ));
    }

    #[test]
    fn test_root_completion_lists_modules_and_globals() {
        let mut harness = TestHarness::new();
        let uri = test_uri("root_completion");
        harness.open_document(&uri, "te");

        let params = CompletionParams {
            text_document_position: position_params(&uri, 0, 2),
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: None,
        };
        let Some(CompletionResponse::List(list)) = harness.request::<Completion>(params) else {
            panic!("Expected completion list");
        };
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].label, "term");
        assert_eq!(list.items[0].kind, Some(CompletionItemKind::MODULE));
        assert_eq!(list.items[0].detail.as_deref(), Some("module"));
    }

    #[test]
    fn test_completion_unknown_document_is_empty() {
        let mut harness = TestHarness::new();
        let labels = harness.completion_labels(&test_uri("missing"), 0, 0);
        assert!(labels.is_empty());
    }

    #[test]
    fn test_completion_line_out_of_range_is_empty() {
        let mut harness = TestHarness::new();
        let uri = test_uri("short");
        harness.open_document(&uri, "term.");
        assert!(harness.completion_labels(&uri, 3, 0).is_empty());
    }

    #[test]
    fn test_completion_clamps_character() {
        let mut harness = TestHarness::new();
        let uri = test_uri("clamp");
        harness.open_document(&uri, "term.cl");
        assert_eq!(harness.completion_labels(&uri, 0, 99), ["clear"]);
    }

    #[test]
    fn test_hover_via_message() {
        let mut harness = TestHarness::new();
        let uri = test_uri("hover_msg");
        let source = "sleep(1)\n  term.setCursorPos(1, 1)";
        harness.open_document(&uri, source);

        let hover = harness.hover(&uri, 1, 10).expect("Hover should find docs");
        assert_eq!(
            hover.range,
            Some(Range {
                start: Position {
                    line: 1,
                    character: 2
                },
                end: Position {
                    line: 1,
                    character: 19
                },
            })
        );
        let text = hover_text(hover);
        assert!(text.starts_with("```lua\nterm.setCursorPos(x: number, y: number)\n```\n\nMoves"));
    }

    #[test]
    fn test_hover_prefers_global() {
        let mut harness = TestHarness::new();
        let uri = test_uri("hover_global");
        harness.open_document(&uri, "print(\"hi\")");

        let text = hover_text(harness.hover(&uri, 0, 2).unwrap());
        assert!(text.starts_with("```lua\nprint(...: any): number\n```"));
    }

    #[test]
    fn test_hover_no_match_is_null() {
        let mut harness = TestHarness::new();
        let uri = test_uri("hover_none");
        harness.open_document(&uri, "local value = 1");

        assert!(harness.hover(&uri, 0, 8).is_none());
        assert!(harness.hover(&uri, 5, 0).is_none());
        assert!(harness.hover(&test_uri("unopened"), 0, 0).is_none());
    }

    #[test]
    fn test_did_change_via_message() {
        let mut harness = TestHarness::new();
        let uri = test_uri("change_msg");
        harness.open_document(&uri, "sl");
        assert_eq!(harness.completion_labels(&uri, 0, 2), ["sleep"]);

        harness.change_document(&uri, 2, "monitor.");
        assert_eq!(
            harness.completion_labels(&uri, 0, 8),
            ["clear", "setTextScale"]
        );

        // Re-applying the same text changes nothing
        harness.change_document(&uri, 3, "monitor.");
        assert_eq!(
            harness.completion_labels(&uri, 0, 8),
            ["clear", "setTextScale"]
        );
    }

    #[test]
    fn test_ranged_change_is_ignored() {
        let mut harness = TestHarness::new();
        let uri = test_uri("ranged");
        harness.open_document(&uri, "sl");

        harness.notify::<DidChangeTextDocument>(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.clone(),
                version: 2,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: Some(Range::default()),
                range_length: None,
                text: "term.".to_string(),
            }],
        });

        assert_eq!(harness.completion_labels(&uri, 0, 2), ["sleep"]);
    }

    #[test]
    fn test_did_close_via_message() {
        let mut harness = TestHarness::new();
        let uri = test_uri("close_msg");
        harness.open_document(&uri, "term.");

        harness.notify::<DidCloseTextDocument>(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        });
        assert!(harness.server.documents.get(&uri).is_none());
        assert!(harness.completion_labels(&uri, 0, 5).is_empty());

        // Closing again is harmless
        harness.notify::<DidCloseTextDocument>(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri },
        });
        assert!(harness.server.documents.is_empty());
    }

    #[test]
    fn test_set_trace_is_accepted() {
        let mut harness = TestHarness::new();
        harness.notify::<SetTrace>(SetTraceParams {
            value: TraceValue::Off,
        });
        assert!(harness.client.receiver.try_recv().is_err());
    }

    #[test]
    fn test_unknown_request_is_method_not_found() {
        let mut harness = TestHarness::new();
        let req = Request::new(
            next_request_id(),
            "textDocument/definition".to_string(),
            serde_json::json!({}),
        );
        let resp = harness.raw_request(req);
        let error = resp.error.expect("Should be an error response");
        assert_eq!(error.code, ErrorCode::MethodNotFound as i32);
    }

    #[test]
    fn test_shutdown_stops_loop() {
        let mut harness = TestHarness::new();
        let req = Request::new(next_request_id(), "shutdown".to_string(), serde_json::Value::Null);
        harness.client.sender.send(Message::Request(req)).unwrap();
        // handle_shutdown waits for the exit notification
        let exit = Notification::new("exit".to_string(), serde_json::Value::Null);
        harness
            .client
            .sender
            .send(Message::Notification(exit))
            .unwrap();

        let msg = harness.server.connection.receiver.recv().unwrap();
        assert!(harness.server.process_message(msg).unwrap());
    }
}
