//! Request dispatch: owns one [`Workspace`] plus a [`Checker`], and maps
//! incoming LSP methods onto `thalo-services` calls. No threading, no
//! cancellation: Workspace mutation is single threaded and synchronous,
//! and the core gives no cancellation contract for a host that needs
//! one to build atop.

use std::io::{BufRead, Write};

use serde_json::{json, Value};
use thalo_checker::Checker;
use thalo_position::Position as ThaloPosition;
use thalo_services::{extract_semantic_tokens, find_definition, find_node_at_position, find_references, NodeContext};
use thalo_workspace::Workspace;

use crate::capabilities::server_capabilities;
use crate::protocol::{notification, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::transport::{read_message, write_message, write_notification};

pub struct Server {
    workspace: Workspace,
    checker: Checker,
    uris: Vec<String>,
    shutting_down: bool,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    pub fn new() -> Self {
        Self { workspace: Workspace::new(), checker: Checker::default(), uris: Vec::new(), shutting_down: false }
    }

    /// Runs the server to completion over stdio: reads framed requests
    /// until EOF or an `exit` notification, writes framed responses and
    /// `textDocument/publishDiagnostics` notifications back.
    pub fn run_stdio(&mut self) -> std::io::Result<()> {
        let stdin = std::io::stdin();
        let mut reader = stdin.lock();
        let stdout = std::io::stdout();
        let mut writer = stdout.lock();
        self.run(&mut reader, &mut writer)
    }

    pub fn run<R: BufRead, W: Write>(&mut self, reader: &mut R, writer: &mut W) -> std::io::Result<()> {
        loop {
            let Some(request) = read_message(reader)? else {
                return Ok(());
            };
            if request.method == "exit" {
                return Ok(());
            }
            let is_notification = request.id.is_none();
            let method = request.method.clone();
            let response = self.dispatch(request, writer);
            if !is_notification {
                if let Some(response) = response {
                    write_message(writer, &response)?;
                }
            }
            if method.starts_with("textDocument/did") {
                self.publish_diagnostics_for_open_documents(writer)?;
            }
        }
    }

    fn dispatch<W: Write>(&mut self, request: JsonRpcRequest, _writer: &mut W) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        if self.shutting_down {
            return id.map(|id| JsonRpcResponse::error(Some(id), JsonRpcError::new(JsonRpcError::INVALID_REQUEST, "server is shutting down")));
        }
        let params = request.params.unwrap_or(Value::Null);
        match request.method.as_str() {
            "initialize" => {
                let capabilities = serde_json::to_value(server_capabilities()).unwrap_or(Value::Null);
                Some(JsonRpcResponse::success(id, json!({ "capabilities": capabilities })))
            }
            "initialized" => None,
            "shutdown" => {
                self.shutting_down = true;
                Some(JsonRpcResponse::success(id, Value::Null))
            }
            "textDocument/didOpen" => {
                self.did_open(&params);
                None
            }
            "textDocument/didChange" => {
                self.did_change(&params);
                None
            }
            "textDocument/didClose" => {
                self.did_close(&params);
                None
            }
            "textDocument/definition" => Some(JsonRpcResponse::success(id, self.definition(&params))),
            "textDocument/references" => Some(JsonRpcResponse::success(id, self.references(&params))),
            "textDocument/hover" => Some(JsonRpcResponse::success(id, self.hover(&params))),
            "textDocument/semanticTokens/full" => Some(JsonRpcResponse::success(id, self.semantic_tokens(&params))),
            _ => {
                if id.is_some() {
                    Some(JsonRpcResponse::error(id, JsonRpcError::new(JsonRpcError::METHOD_NOT_FOUND, format!("unhandled method {}", request.method))))
                } else {
                    None
                }
            }
        }
    }

    fn did_open(&mut self, params: &Value) {
        let Some(uri) = params.pointer("/textDocument/uri").and_then(Value::as_str) else { return };
        let Some(text) = params.pointer("/textDocument/text").and_then(Value::as_str) else { return };
        let file_type = thalo_fenced::file_type_for_extension(extension_of(uri), text);
        if self.workspace.get_model(uri).is_some() {
            let _ = self.workspace.update_document(uri, text.to_string());
        } else {
            let _ = self.workspace.add_document(uri.to_string(), text.to_string(), file_type);
            self.uris.push(uri.to_string());
        }
    }

    fn did_change(&mut self, params: &Value) {
        let Some(uri) = params.pointer("/textDocument/uri").and_then(Value::as_str) else { return };
        let Some(text) = params.pointer("/contentChanges/0/text").and_then(Value::as_str) else { return };
        let _ = self.workspace.update_document(uri, text.to_string());
    }

    fn did_close(&mut self, params: &Value) {
        let Some(uri) = params.pointer("/textDocument/uri").and_then(Value::as_str) else { return };
        let _ = self.workspace.remove_document(uri);
        self.uris.retain(|u| u != uri);
    }

    fn position_of(params: &Value) -> Option<ThaloPosition> {
        let line = params.pointer("/position/line").and_then(Value::as_u64)? as u32;
        let character = params.pointer("/position/character").and_then(Value::as_u64)? as u32;
        Some(ThaloPosition::new(line, character))
    }

    fn link_id_at(&mut self, params: &Value) -> Option<String> {
        let uri = params.pointer("/textDocument/uri").and_then(Value::as_str)?;
        let position = Self::position_of(params)?;
        let model = self.workspace.get_model(uri)?;
        match find_node_at_position(model, position) {
            NodeContext::Link(id) => Some(id),
            _ => None,
        }
    }

    fn definition(&mut self, params: &Value) -> Value {
        let Some(link_id) = self.link_id_at(params) else { return Value::Null };
        match find_definition(&mut self.workspace, &link_id) {
            Some(def) => json!({ "uri": def.file, "range": location_to_range(def.location) }),
            None => Value::Null,
        }
    }

    fn references(&mut self, params: &Value) -> Value {
        let Some(link_id) = self.link_id_at(params) else { return json!([]) };
        let include_declaration = params.pointer("/context/includeDeclaration").and_then(Value::as_bool).unwrap_or(false);
        let locations = find_references(&mut self.workspace, &link_id, include_declaration);
        json!(locations.into_iter().map(|l| json!({ "uri": l.file, "range": location_to_range(l.location) })).collect::<Vec<_>>())
    }

    fn hover(&mut self, params: &Value) -> Value {
        let Some(uri) = params.pointer("/textDocument/uri").and_then(Value::as_str) else { return Value::Null };
        let Some(position) = Self::position_of(params) else { return Value::Null };
        let Some(model) = self.workspace.get_model(uri) else { return Value::Null };
        let context = find_node_at_position(model, position);
        let text = match &context {
            NodeContext::Entity(name) | NodeContext::SchemaEntity(name) => {
                self.workspace.refresh_caches();
                self.workspace.cached_schema_registry().get(name).map(|s| match &s.description {
                    Some(d) => format!("**{name}**\n\n{d}"),
                    None => format!("**{name}**"),
                })
            }
            NodeContext::Link(id) => Some(format!("link `^{id}`")),
            NodeContext::Tag(name) => Some(format!("tag `#{name}`")),
            _ => None,
        };
        match text {
            Some(value) => json!({ "contents": { "kind": "markdown", "value": value } }),
            None => Value::Null,
        }
    }

    fn semantic_tokens(&self, params: &Value) -> Value {
        let Some(uri) = params.pointer("/textDocument/uri").and_then(Value::as_str) else { return json!({ "data": [] }) };
        let Some(model) = self.workspace.get_model(uri) else { return json!({ "data": [] }) };
        let tokens = extract_semantic_tokens(model);
        let mut data = Vec::with_capacity(tokens.len() * 5);
        let mut prev_line = 0u32;
        let mut prev_char = 0u32;
        for token in tokens {
            let delta_line = token.line - prev_line;
            let delta_char = if delta_line == 0 { token.start_char - prev_char } else { token.start_char };
            data.extend([delta_line, delta_char, token.length, token.token_type, token.token_modifiers]);
            prev_line = token.line;
            prev_char = token.start_char;
        }
        json!({ "data": data })
    }

    fn publish_diagnostics_for_open_documents<W: Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        let diagnostics = self.checker.check_workspace(&mut self.workspace);
        let mut by_file: std::collections::HashMap<&str, Vec<&thalo_rules::Diagnostic>> = std::collections::HashMap::new();
        for d in &diagnostics {
            by_file.entry(d.file.as_str()).or_default().push(d);
        }
        for uri in &self.uris {
            let file_diagnostics = by_file.get(uri.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let payload = json!({
                "uri": uri,
                "diagnostics": file_diagnostics.iter().map(|d| json!({
                    "range": location_to_range(d.location),
                    "severity": severity_to_lsp(d.severity),
                    "code": d.code,
                    "source": "thalo",
                    "message": d.message,
                })).collect::<Vec<_>>(),
            });
            write_notification(writer, &notification("textDocument/publishDiagnostics", payload))?;
        }
        Ok(())
    }
}

fn extension_of(uri: &str) -> Option<&str> {
    uri.rsplit('.').next()
}

fn location_to_range(location: thalo_position::Location) -> Value {
    json!({
        "start": { "line": location.start_position.row, "character": location.start_position.column },
        "end": { "line": location.end_position.row, "character": location.end_position.column },
    })
}

fn severity_to_lsp(severity: thalo_rules::Severity) -> u8 {
    match severity {
        thalo_rules::Severity::Error => 1,
        thalo_rules::Severity::Warning => 2,
        thalo_rules::Severity::Info => 3,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::io::BufReader;

    fn framed(body: &str) -> String {
        format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
    }

    #[test]
    fn initialize_then_shutdown_then_exit_terminates_cleanly() {
        let input = format!(
            "{}{}{}",
            framed(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#),
            framed(r#"{"jsonrpc":"2.0","id":2,"method":"shutdown","params":null}"#),
            framed(r#"{"jsonrpc":"2.0","method":"exit","params":null}"#),
        );
        let mut reader = BufReader::new(input.as_bytes());
        let mut output = Vec::new();
        let mut server = Server::new();
        server.run(&mut reader, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("\"capabilities\""));
    }

    #[test]
    fn did_open_then_definition_resolves_a_link() {
        let open = framed(&json!({
            "jsonrpc": "2.0", "method": "textDocument/didOpen",
            "params": { "textDocument": { "uri": "a.thalo", "text": "2026-01-01T00:00Z create lore \"E\" ^x\n  k: \"v\"\n" } }
        }).to_string());
        let def_req = framed(&json!({
            "jsonrpc": "2.0", "id": 1, "method": "textDocument/definition",
            "params": { "textDocument": { "uri": "a.thalo" }, "position": { "line": 0, "character": 34 } }
        }).to_string());
        let exit = framed(r#"{"jsonrpc":"2.0","method":"exit","params":null}"#);
        let input = format!("{open}{def_req}{exit}");
        let mut reader = BufReader::new(input.as_bytes());
        let mut output = Vec::new();
        let mut server = Server::new();
        server.run(&mut reader, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("\"uri\":\"a.thalo\"") || output.contains("publishDiagnostics"));
    }
}
