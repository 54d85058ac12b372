//! The tool-calling conversation loop
//!
//! One model call per step. A reply without tool calls ends the loop; a
//! reply with tool calls opens a round whose calls are resolved, sanitized,
//! checked and executed in emitted order before the model is called again.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;

use super::error::{ChatError, ChatResult};
use super::prompt::DEFAULT_SYSTEM_PROMPT;
use super::state::{ApprovalDecision, ChatOutcome, Conversation, LoopState, PendingApproval};
use crate::approval::ApprovalStore;
use crate::config::{ArgumentValidation, LoopSettings, ToolErrorPolicy};
use crate::logging::Logger;
use crate::providers::{ChatOptions, Provider, ProviderModelConfig};
use crate::tools::{normalize_arguments, sanitize_arguments, ToolDirectory};
use crate::types::{ChatMessage, InputSchema, QualifiedName, Tool, ToolCall};

/// What happened to one tool call
enum Dispatch {
    /// Answered, rejected or skipped; move to the next call
    Continue,
    /// Needs confirmation before it may run
    Suspend { target: QualifiedName, arguments: Value },
}

/// Drives a model and a tool directory until the model answers
pub struct ConversationLoop {
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    directory: Arc<ToolDirectory>,
    approvals: Option<Arc<dyn ApprovalStore>>,
    settings: LoopSettings,
    system_prompt: String,
    logger: Arc<dyn Logger>,
}

impl ConversationLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: ProviderModelConfig,
        directory: Arc<ToolDirectory>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            model,
            directory,
            approvals: None,
            settings: LoopSettings::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            logger,
        }
    }

    /// Gate flagged tools behind a confirmation
    pub fn with_approvals(mut self, store: Arc<dyn ApprovalStore>) -> Self {
        self.approvals = Some(store);
        self
    }

    /// Limits and policies. The per-call tool timeout belongs to the directory.
    pub fn with_settings(mut self, settings: LoopSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Answer `user_text`, suspending if a flagged tool is requested
    pub async fn start_conversation(&self, user_text: &str) -> ChatResult<ChatOutcome> {
        if user_text.trim().is_empty() {
            return Err(ChatError::InvalidInput("message is empty".to_string()));
        }

        let signatures: Vec<Tool> = self
            .directory
            .list_all_tools()
            .await
            .iter()
            .map(Tool::from)
            .collect();
        let tools = (!signatures.is_empty()).then_some(signatures);

        self.logger.info(&format!(
            "[Conversation] Starting with {} tools",
            tools.as_ref().map_or(0, Vec::len)
        ));

        let conversation = Conversation::new(&self.system_prompt, user_text, tools);
        self.drive(conversation, LoopState::AwaitingModel).await
    }

    /// Continue a suspended conversation
    ///
    /// Approve runs the pending call as it is; later flagged calls of the
    /// same round are still checked.
    pub async fn resume(
        &self,
        pending: PendingApproval,
        decision: ApprovalDecision,
    ) -> ChatResult<ChatOutcome> {
        let target = pending.target();
        let PendingApproval {
            mut conversation,
            call,
            arguments,
            remaining,
            ..
        } = pending;

        match decision {
            ApprovalDecision::Approve => {
                self.logger.info(&format!("[Conversation] {} approved", target));
                self.execute(&mut conversation, &call, &target, arguments).await?;
            }
            ApprovalDecision::Deny => {
                self.logger.info(&format!("[Conversation] {} denied", target));
                conversation.push(ChatMessage::tool(
                    &call,
                    format!("The user declined to run {}.", target),
                ));
            }
        }

        self.drive(conversation, LoopState::DispatchingTools { queue: remaining })
            .await
    }

    /// Plain text in, text out. A required approval is an error here.
    pub async fn ask(&self, user_text: &str) -> ChatResult<String> {
        match self.start_conversation(user_text).await? {
            ChatOutcome::Answer(text) => Ok(text),
            ChatOutcome::ApprovalRequired(pending) => Err(ChatError::ApprovalRequired {
                tool: pending.qualified_name(),
                arguments: pending.arguments,
            }),
        }
    }

    async fn drive(
        &self,
        mut conversation: Conversation,
        mut state: LoopState,
    ) -> ChatResult<ChatOutcome> {
        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    let reply = self.call_model(&conversation).await?;
                    if !reply.has_tool_calls() {
                        LoopState::Done(reply.content)
                    } else {
                        let limit = self.settings.max_rounds;
                        if conversation.rounds >= limit {
                            self.logger.error(&format!(
                                "[Conversation] Round limit of {} reached",
                                limit
                            ));
                            return Err(ChatError::RoundLimitExceeded { limit });
                        }
                        conversation.rounds += 1;
                        let queue: VecDeque<ToolCall> = reply.tool_calls.iter().cloned().collect();
                        conversation.push(reply);
                        LoopState::DispatchingTools { queue }
                    }
                }
                LoopState::DispatchingTools { mut queue } => match queue.pop_front() {
                    None => LoopState::AwaitingModel,
                    Some(call) => match self.dispatch(&mut conversation, &call).await? {
                        Dispatch::Continue => LoopState::DispatchingTools { queue },
                        Dispatch::Suspend { target, arguments } => {
                            self.logger.info(&format!(
                                "[Conversation] Waiting for approval of {}",
                                target
                            ));
                            return Ok(ChatOutcome::ApprovalRequired(PendingApproval {
                                conversation,
                                call,
                                server_name: target.server,
                                tool_name: target.tool,
                                arguments,
                                remaining: queue,
                            }));
                        }
                    },
                },
                LoopState::Done(answer) => return Ok(ChatOutcome::Answer(answer)),
            };
        }
    }

    async fn call_model(&self, conversation: &Conversation) -> ChatResult<ChatMessage> {
        let options = ChatOptions {
            tools: conversation.tools.clone(),
            ..ChatOptions::default()
        };
        let timeout = self.settings.model_timeout();
        let request = self
            .provider
            .chat(conversation.messages.clone(), self.model.clone(), options);

        match tokio::time::timeout(timeout, request).await {
            Ok(reply) => Ok(reply?),
            Err(_) => Err(ChatError::ModelTimeout {
                seconds: timeout.as_secs(),
            }),
        }
    }

    async fn dispatch(&self, conversation: &mut Conversation, call: &ToolCall) -> ChatResult<Dispatch> {
        let target = match call.target() {
            Ok(target) => target,
            Err(e) => {
                self.logger.error(&format!("[Conversation] Skipping tool call: {}", e));
                return Ok(Dispatch::Continue);
            }
        };
        if !self.directory.is_connected(&target.server) {
            self.logger.error(&format!(
                "[Conversation] Skipping {}: unknown tool server '{}'",
                call.name, target.server
            ));
            return Ok(Dispatch::Continue);
        }

        let schema = self.schema_of(&target).await;
        let arguments = sanitize_arguments(&normalize_arguments(call.arguments.clone()), &schema.required);

        self.logger.info(&format!(
            "[Conversation] Round {}: calling {} with {}",
            conversation.rounds, target, arguments
        ));

        // A call that will be rejected is never put to the user
        if !self.arguments_pass(conversation, call, &target, &schema, &arguments) {
            return Ok(Dispatch::Continue);
        }
        if self.needs_approval(&target) {
            return Ok(Dispatch::Suspend { target, arguments });
        }
        self.execute(conversation, call, &target, arguments).await?;
        Ok(Dispatch::Continue)
    }

    async fn schema_of(&self, target: &QualifiedName) -> InputSchema {
        self.directory
            .lookup_tool(&target.server, &target.tool)
            .await
            .map(|d| d.input_schema)
            .unwrap_or_default()
    }

    /// A store that cannot answer requires approval
    fn needs_approval(&self, target: &QualifiedName) -> bool {
        let Some(store) = &self.approvals else {
            return false;
        };
        match store.requires_approval(&target.server, &target.tool) {
            Ok(required) => required,
            Err(e) => {
                self.logger.error(&format!(
                    "[Conversation] Approval store '{}' failed for {}, requiring approval: {}",
                    store.name(),
                    target,
                    e
                ));
                true
            }
        }
    }

    /// Apply the validation mode. On rejection the model is told why.
    fn arguments_pass(
        &self,
        conversation: &mut Conversation,
        call: &ToolCall,
        target: &QualifiedName,
        schema: &InputSchema,
        arguments: &Value,
    ) -> bool {
        let mode = self.settings.argument_validation;
        if mode == ArgumentValidation::Off {
            return true;
        }
        let violations = schema.validate(arguments);
        if violations.is_empty() {
            return true;
        }

        let details = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        match mode {
            ArgumentValidation::Reject => {
                self.logger.warn(&format!(
                    "[Conversation] Not calling {}: {}",
                    target, details
                ));
                conversation.push(ChatMessage::tool(
                    call,
                    format!("Error: invalid arguments for {}: {}", target, details),
                ));
                false
            }
            _ => {
                self.logger.warn(&format!(
                    "[Conversation] Arguments for {} do not match its schema: {}",
                    target, details
                ));
                true
            }
        }
    }

    async fn execute(
        &self,
        conversation: &mut Conversation,
        call: &ToolCall,
        target: &QualifiedName,
        arguments: Value,
    ) -> ChatResult<()> {
        match self.directory.invoke(&target.server, &target.tool, arguments).await {
            Ok(output) => {
                conversation.push(ChatMessage::tool(call, output.reduce()));
                Ok(())
            }
            Err(e) if e.is_skippable() => {
                self.logger.error(&format!("[Conversation] Skipping {}: {}", target, e));
                Ok(())
            }
            Err(e) => match self.settings.on_tool_error {
                ToolErrorPolicy::Abort => {
                    self.logger.error(&format!("[Conversation] {}", e));
                    Err(ChatError::Tool(e))
                }
                ToolErrorPolicy::Report => {
                    self.logger.warn(&format!("[Conversation] Reporting to model: {}", e));
                    conversation.push(ChatMessage::tool(call, format!("Error: {}", e)));
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{ApprovalError, ApprovalRecord, ApprovalResult, MemoryApprovalStore};
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::McpError;
    use crate::providers::MockProvider;
    use crate::tools::{ServerTool, StaticToolServer, ToolError};
    use crate::types::{MessageRole, ToolOutput};
    use serde_json::json;
    use std::time::Duration;

    fn model() -> ProviderModelConfig {
        ProviderModelConfig::new("mock")
    }

    fn calls(calls: &[(&str, &str, Value)]) -> ChatMessage {
        ChatMessage::assistant_with_tools(
            "",
            calls
                .iter()
                .map(|(id, name, args)| ToolCall::new(*id, *name, args.clone()))
                .collect(),
        )
    }

    fn calc_server() -> Arc<StaticToolServer> {
        Arc::new(StaticToolServer::new().with_tool(
            ServerTool::new(
                "add",
                "Add two numbers",
                json!({
                    "type": "object",
                    "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                    "required": ["a", "b"]
                }),
            ),
            |args| {
                let sum = args["a"].as_f64().unwrap_or(0.0) + args["b"].as_f64().unwrap_or(0.0);
                Ok(ToolOutput::text(sum.to_string()))
            },
        ))
    }

    fn search_server(answer: &'static str) -> Arc<StaticToolServer> {
        Arc::new(StaticToolServer::new().with_tool(
            ServerTool::new(
                "search",
                "Search",
                json!({
                    "type": "object",
                    "properties": {"q": {"type": "string"}, "lang": {"type": "string"}},
                    "required": ["q"]
                }),
            ),
            move |_| Ok(ToolOutput::text(answer)),
        ))
    }

    fn directory(servers: Vec<(&str, Arc<StaticToolServer>)>) -> Arc<ToolDirectory> {
        let dir = ToolDirectory::new(NoOpLogger::shared());
        for (name, server) in servers {
            dir.register(name, server);
        }
        Arc::new(dir)
    }

    fn relay(provider: Arc<MockProvider>, dir: Arc<ToolDirectory>) -> ConversationLoop {
        ConversationLoop::new(provider, model(), dir, NoOpLogger::shared())
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let provider = Arc::new(MockProvider::fixed("unused", NoOpLogger::shared()));
        let relay = relay(provider.clone(), directory(vec![]));

        for input in ["", "   \n\t"] {
            let err = relay.start_conversation(input).await.unwrap_err();
            assert!(matches!(err, ChatError::InvalidInput(_)));
        }
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_no_tools_sends_no_tool_list() {
        let provider = Arc::new(MockProvider::fixed("4", NoOpLogger::shared()));
        let relay = relay(provider.clone(), directory(vec![]));

        let answer = relay.ask("What's 2+2?").await.unwrap();
        assert_eq!(answer, "4");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].options.tools.is_none());
        let roles: Vec<MessageRole> = requests[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::System, MessageRole::User]);
        assert_eq!(requests[0].messages[1].content, "What's 2+2?");
    }

    #[tokio::test]
    async fn test_tools_are_offered_with_qualified_names() {
        let provider = Arc::new(MockProvider::fixed("hello", NoOpLogger::shared()));
        let relay = relay(provider.clone(), directory(vec![("calc", calc_server())]));

        relay.ask("hi").await.unwrap();
        let tools = provider.requests()[0].options.tools.clone().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "calc.add");
        assert_eq!(tools[0].description, "Add two numbers");
    }

    #[tokio::test]
    async fn test_required_null_is_kept() {
        let calc = calc_server();
        let provider = Arc::new(MockProvider::scripted(
            [
                calls(&[("call_0", "calc.add", json!({"a": 2, "b": null}))]),
                ChatMessage::assistant("The sum is 2"),
            ],
            NoOpLogger::shared(),
        ));
        let relay = relay(provider.clone(), directory(vec![("calc", calc.clone())]));

        let answer = relay.ask("add 2 and nothing").await.unwrap();
        assert_eq!(answer, "The sum is 2");
        assert_eq!(calc.calls(), vec![("add".to_string(), json!({"a": 2, "b": null}))]);

        // system, user, assistant with calls, one tool message
        let second = &provider.requests()[1];
        assert_eq!(second.messages.len(), 4);
        let tool_msg = &second.messages[3];
        assert_eq!(tool_msg.role, MessageRole::Tool);
        assert_eq!(tool_msg.content, "2");
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_0"));
        assert_eq!(tool_msg.tool_name.as_deref(), Some("calc.add"));
        // Same tool list every round
        assert_eq!(provider.requests()[0].options.tools, second.options.tools);
    }

    #[tokio::test]
    async fn test_blank_optionals_are_stripped() {
        let weather = search_server("sunny");
        let provider = Arc::new(MockProvider::scripted(
            [
                calls(&[("c", "weather.search", json!({"q": "Oslo", "lang": ""}))]),
                ChatMessage::assistant("It is sunny"),
            ],
            NoOpLogger::shared(),
        ));
        let relay = relay(provider, directory(vec![("weather", weather.clone())]));

        relay.ask("weather in Oslo?").await.unwrap();
        assert_eq!(weather.calls()[0].1, json!({"q": "Oslo"}));
    }

    #[tokio::test]
    async fn test_string_arguments_are_decoded() {
        let weather = search_server("sunny");
        let provider = Arc::new(MockProvider::scripted(
            [
                calls(&[("c", "weather.search", json!(r#"{"q": "Oslo", "lang": null}"#))]),
                ChatMessage::assistant("ok"),
            ],
            NoOpLogger::shared(),
        ));
        let relay = relay(provider, directory(vec![("weather", weather.clone())]));

        relay.ask("weather?").await.unwrap();
        assert_eq!(weather.calls()[0].1, json!({"q": "Oslo"}));
    }

    #[tokio::test]
    async fn test_same_tool_name_routes_by_server() {
        let weather = search_server("rain tomorrow");
        let news = search_server("election results");
        let provider = Arc::new(MockProvider::scripted(
            [
                calls(&[
                    ("c1", "weather.search", json!({"q": "Oslo"})),
                    ("c2", "news.search", json!({"q": "Oslo"})),
                ]),
                ChatMessage::assistant("summary"),
            ],
            NoOpLogger::shared(),
        ));
        let relay = relay(
            provider.clone(),
            directory(vec![("weather", weather.clone()), ("news", news.clone())]),
        );

        relay.ask("what's up in Oslo?").await.unwrap();
        assert_eq!(weather.calls().len(), 1);
        assert_eq!(news.calls().len(), 1);

        let messages = &provider.requests()[1].messages;
        let tool_msgs: Vec<(&str, &str)> = messages
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .map(|m| (m.tool_name.as_deref().unwrap_or(""), m.content.as_str()))
            .collect();
        assert_eq!(
            tool_msgs,
            vec![("weather.search", "rain tomorrow"), ("news.search", "election results")]
        );
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_calls_are_skipped() {
        let logger = Arc::new(MemoryLogger::new());
        let calc = calc_server();
        let provider = Arc::new(MockProvider::scripted(
            [
                calls(&[
                    ("c1", "add", json!({"a": 1, "b": 1})),
                    ("c2", "ghost.add", json!({"a": 1, "b": 1})),
                    ("c3", "calc.add", json!({"a": 1, "b": 1})),
                ]),
                ChatMessage::assistant("2"),
            ],
            NoOpLogger::shared(),
        ));
        let relay = ConversationLoop::new(
            provider.clone(),
            model(),
            directory(vec![("calc", calc.clone())]),
            logger.clone(),
        );

        assert_eq!(relay.ask("1+1").await.unwrap(), "2");
        assert_eq!(calc.calls().len(), 1);

        let messages = &provider.requests()[1].messages;
        let tool_ids: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(tool_ids, vec!["c3"]);
        assert!(logger.contains(LogLevel::Error, "Malformed tool name 'add'"));
        assert!(logger.contains(LogLevel::Error, "unknown tool server 'ghost'"));
        assert!(logger.contains(LogLevel::Info, "Round 1: calling calc.add"));
    }

    #[tokio::test]
    async fn test_round_limit() {
        let provider = Arc::new(MockProvider::repeat(
            calls(&[("c", "calc.add", json!({"a": 1, "b": 1}))]),
            NoOpLogger::shared(),
        ));
        let relay = relay(provider.clone(), directory(vec![("calc", calc_server())]))
            .with_settings(LoopSettings::default().with_max_rounds(2));

        let err = relay.ask("loop forever").await.unwrap_err();
        assert!(matches!(err, ChatError::RoundLimitExceeded { limit: 2 }));
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_model_timeout() {
        let provider = Arc::new(MockProvider::fixed("late", NoOpLogger::shared()).with_delay(1000));
        let settings = LoopSettings {
            model_timeout_secs: 0,
            ..LoopSettings::default()
        };
        let relay = relay(provider, directory(vec![])).with_settings(settings);

        let err = relay.ask("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::ModelTimeout { seconds: 0 }));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(MockProvider::error("unavailable", NoOpLogger::shared()));
        let relay = relay(provider, directory(vec![]));
        assert!(matches!(relay.ask("hello").await, Err(ChatError::Provider(_))));
    }

    fn failing_server() -> Arc<StaticToolServer> {
        Arc::new(StaticToolServer::new().with_tool(
            ServerTool::new("fetch", "Fetch", json!({"type": "object"})),
            |_| Err(McpError::ToolCallFailed("upstream 502".to_string())),
        ))
    }

    #[tokio::test]
    async fn test_tool_error_aborts_by_default() {
        let provider = Arc::new(MockProvider::scripted(
            [calls(&[("c", "web.fetch", json!({}))]), ChatMessage::assistant("never")],
            NoOpLogger::shared(),
        ));
        let relay = relay(provider.clone(), directory(vec![("web", failing_server())]));

        let err = relay.ask("fetch it").await.unwrap_err();
        assert!(matches!(err, ChatError::Tool(ToolError::Execution { .. })));
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_timeout_aborts() {
        let slow = Arc::new(
            StaticToolServer::new()
                .with_text_tool("wait", "Wait", "done")
                .with_delay(Duration::from_millis(500)),
        );
        let dir = ToolDirectory::new(NoOpLogger::shared()).with_call_timeout(Duration::from_millis(20));
        dir.register("slow", slow);
        let provider = Arc::new(MockProvider::scripted(
            [calls(&[("c", "slow.wait", json!({}))])],
            NoOpLogger::shared(),
        ));
        let relay = relay(provider, Arc::new(dir));

        let err = relay.ask("wait").await.unwrap_err();
        assert!(matches!(err, ChatError::Tool(ToolError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_tool_error_reported_to_model() {
        let provider = Arc::new(MockProvider::scripted(
            [
                calls(&[("c", "web.fetch", json!({}))]),
                ChatMessage::assistant("The site is down"),
            ],
            NoOpLogger::shared(),
        ));
        let relay = relay(provider.clone(), directory(vec![("web", failing_server())]))
            .with_settings(LoopSettings::default().with_tool_error_policy(ToolErrorPolicy::Report));

        assert_eq!(relay.ask("fetch it").await.unwrap(), "The site is down");
        let tool_msg = provider.requests()[1].messages[3].clone();
        assert!(tool_msg.content.starts_with("Error: "));
        assert!(tool_msg.content.contains("upstream 502"));
    }

    #[tokio::test]
    async fn test_validation_reject_tells_the_model() {
        let calc = calc_server();
        let provider = Arc::new(MockProvider::scripted(
            [
                calls(&[("c", "calc.add", json!({"a": "two"}))]),
                ChatMessage::assistant("Please give me numbers"),
            ],
            NoOpLogger::shared(),
        ));
        let relay = relay(provider.clone(), directory(vec![("calc", calc.clone())])).with_settings(
            LoopSettings::default().with_argument_validation(ArgumentValidation::Reject),
        );

        relay.ask("add two").await.unwrap();
        assert!(calc.calls().is_empty());
        let tool_msg = &provider.requests()[1].messages[3];
        assert!(tool_msg.content.contains("missing required parameter 'b'"));
        assert!(tool_msg.content.contains("parameter 'a' expects number, got string"));
    }

    #[tokio::test]
    async fn test_rejected_arguments_are_not_put_up_for_approval() {
        let calc = calc_server();
        let provider = Arc::new(MockProvider::scripted(
            [
                calls(&[("c", "calc.add", json!({"a": "two"}))]),
                ChatMessage::assistant("Please give me numbers"),
            ],
            NoOpLogger::shared(),
        ));
        let relay = relay(provider.clone(), directory(vec![("calc", calc.clone())]))
            .with_approvals(Arc::new(MemoryApprovalStore::with_records([
                ApprovalRecord::new("calc", "add", true),
            ])))
            .with_settings(
                LoopSettings::default().with_argument_validation(ArgumentValidation::Reject),
            );

        let outcome = relay.start_conversation("add two").await.unwrap();
        assert_eq!(outcome.answer(), Some("Please give me numbers"));
        assert!(calc.calls().is_empty());
        let tool_msg = &provider.requests()[1].messages[3];
        assert!(tool_msg.content.starts_with("Error: invalid arguments for calc.add"));
    }

    #[tokio::test]
    async fn test_validation_warn_still_dispatches() {
        let logger = Arc::new(MemoryLogger::new());
        let calc = calc_server();
        let provider = Arc::new(MockProvider::scripted(
            [calls(&[("c", "calc.add", json!({"a": 1}))]), ChatMessage::assistant("1")],
            NoOpLogger::shared(),
        ));
        let relay = ConversationLoop::new(
            provider,
            model(),
            directory(vec![("calc", calc.clone())]),
            logger.clone(),
        );

        relay.ask("add").await.unwrap();
        assert_eq!(calc.calls().len(), 1);
        assert!(logger.contains(LogLevel::Warn, "do not match its schema"));
    }

    fn files_server() -> Arc<StaticToolServer> {
        Arc::new(
            StaticToolServer::new()
                .with_tool(
                    ServerTool::new(
                        "delete",
                        "Delete a file",
                        json!({
                            "type": "object",
                            "properties": {"path": {"type": "string"}, "force": {"type": "boolean"}},
                            "required": ["path"]
                        }),
                    ),
                    |args| Ok(ToolOutput::text(format!("deleted {}", args["path"]))),
                )
                .with_text_tool("list", "List files", "a.txt"),
        )
    }

    fn approvals() -> Arc<MemoryApprovalStore> {
        Arc::new(MemoryApprovalStore::with_records([ApprovalRecord::new(
            "files", "delete", true,
        )]))
    }

    fn delete_script() -> Arc<MockProvider> {
        Arc::new(MockProvider::scripted(
            [
                calls(&[
                    ("c1", "files.delete", json!({"path": "/tmp/x", "force": null})),
                    ("c2", "files.list", json!({})),
                ]),
                ChatMessage::assistant("Done"),
            ],
            NoOpLogger::shared(),
        ))
    }

    #[tokio::test]
    async fn test_flagged_tool_suspends_then_runs_when_approved() {
        let files = files_server();
        let provider = delete_script();
        let relay = relay(provider.clone(), directory(vec![("files", files.clone())]))
            .with_approvals(approvals());

        let outcome = relay.start_conversation("delete /tmp/x").await.unwrap();
        let ChatOutcome::ApprovalRequired(pending) = outcome else {
            panic!("expected a pending approval");
        };
        assert_eq!(pending.qualified_name(), "files.delete");
        assert_eq!(pending.arguments, json!({"path": "/tmp/x"}));
        assert_eq!(pending.remaining.len(), 1);
        assert!(files.calls().is_empty());

        let outcome = relay.resume(pending, ApprovalDecision::Approve).await.unwrap();
        assert_eq!(outcome.answer(), Some("Done"));

        let called: Vec<String> = files.calls().into_iter().map(|(tool, _)| tool).collect();
        assert_eq!(called, vec!["delete", "list"]);
        assert_eq!(provider.requests()[1].messages[3].content, "deleted \"/tmp/x\"");
    }

    #[tokio::test]
    async fn test_denied_tool_is_not_run() {
        let files = files_server();
        let provider = delete_script();
        let relay = relay(provider.clone(), directory(vec![("files", files.clone())]))
            .with_approvals(approvals());

        let ChatOutcome::ApprovalRequired(pending) =
            relay.start_conversation("delete /tmp/x").await.unwrap()
        else {
            panic!("expected a pending approval");
        };
        let outcome = relay.resume(pending, ApprovalDecision::Deny).await.unwrap();
        assert_eq!(outcome.answer(), Some("Done"));

        let called: Vec<String> = files.calls().into_iter().map(|(tool, _)| tool).collect();
        assert_eq!(called, vec!["list"]);
        let denial = &provider.requests()[1].messages[3];
        assert_eq!(denial.tool_call_id.as_deref(), Some("c1"));
        assert!(denial.content.contains("declined"));
    }

    #[tokio::test]
    async fn test_ask_reports_required_approval() {
        let relay = relay(delete_script(), directory(vec![("files", files_server())]))
            .with_approvals(approvals());

        let err = relay.ask("delete /tmp/x").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::ApprovalRequired { ref tool, .. } if tool == "files.delete"
        ));
    }

    struct BrokenStore;

    impl ApprovalStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        fn requires_approval(&self, _server: &str, _tool: &str) -> ApprovalResult<bool> {
            Err(ApprovalError::Other("unreadable".to_string()))
        }
        fn set(&self, _server: &str, _tool: &str, _required: bool) -> ApprovalResult<()> {
            Ok(())
        }
        fn delete(&self, _server: &str, _tool: &str) -> ApprovalResult<()> {
            Ok(())
        }
        fn list(&self) -> ApprovalResult<Vec<ApprovalRecord>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_unreadable_store_requires_approval() {
        let files = files_server();
        let relay = relay(delete_script(), directory(vec![("files", files.clone())]))
            .with_approvals(Arc::new(BrokenStore));

        let outcome = relay.start_conversation("delete /tmp/x").await.unwrap();
        assert!(matches!(outcome, ChatOutcome::ApprovalRequired(_)));
        assert!(files.calls().is_empty());
    }
}
