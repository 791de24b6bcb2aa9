//! Tool executor for dispatching function calls.

use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{BotError, Result};
use crate::types::{FunctionCall, FunctionResponse};

use super::definitions::ToolName;
use super::web_fetch::ContentFetcher;

/// Arguments for the `fetchWebsiteContent` tool
#[derive(Debug, Deserialize)]
struct FetchWebsiteArgs {
    url: String,
}

/// A function call whose tool and arguments have been checked, ready to run.
#[derive(Debug)]
enum Invocation {
    FetchWebsiteContent(FetchWebsiteArgs),
}

/// Executor for the bot's function-calling tools
#[derive(Clone)]
pub struct ToolExecutor {
    fetcher: Arc<dyn ContentFetcher>,
}

impl ToolExecutor {
    pub fn new(fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self { fetcher }
    }

    /// Execute a function call and wrap its result for the model
    pub async fn execute(&self, call: &FunctionCall) -> Result<FunctionResponse> {
        let invocation = plan(call)?;
        self.run(invocation).await
    }

    /// Execute every call of one model turn, in order.
    ///
    /// All calls are validated first, so an unknown tool or bad argument anywhere in the
    /// batch fails before any tool runs.
    pub async fn execute_all(&self, calls: &[FunctionCall]) -> Result<Vec<FunctionResponse>> {
        let invocations = calls.iter().map(plan).collect::<Result<Vec<_>>>()?;

        let mut results = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            results.push(self.run(invocation).await?);
        }
        Ok(results)
    }

    async fn run(&self, invocation: Invocation) -> Result<FunctionResponse> {
        match invocation {
            Invocation::FetchWebsiteContent(args) => self.fetch_website_content(args).await,
        }
    }

    async fn fetch_website_content(&self, args: FetchWebsiteArgs) -> Result<FunctionResponse> {
        let data = self.fetcher.fetch(&args.url).await?;
        info!("Fetched {} bytes from {}", data.len(), args.url);

        let mut response = Map::new();
        response.insert(
            "content".to_string(),
            Value::String(String::from_utf8_lossy(&data).into_owned()),
        );

        Ok(FunctionResponse {
            name: ToolName::FetchWebsiteContent.as_str().to_string(),
            response,
        })
    }
}

fn plan(call: &FunctionCall) -> Result<Invocation> {
    debug!("Planning tool '{}' with args: {:?}", call.name, call.args);

    let tool = ToolName::from_str(&call.name).map_err(|_| {
        warn!("Unknown tool requested: {}", call.name);
        BotError::UnknownTool(call.name.clone())
    })?;

    match tool {
        ToolName::FetchWebsiteContent => {
            let args: FetchWebsiteArgs = serde_json::from_value(Value::Object(call.args.clone()))
                .map_err(|e| {
                    warn!("Bad fetchWebsiteContent arguments: {e}");
                    BotError::ArgumentType {
                        tool: ToolName::FetchWebsiteContent.as_str(),
                        argument: "url",
                    }
                })?;
            Ok(Invocation::FetchWebsiteContent(args))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tools::MockContentFetcher;

    fn call(name: &str, args: Value) -> FunctionCall {
        let Value::Object(args) = args else {
            panic!("args must be an object");
        };
        FunctionCall {
            name: name.to_string(),
            args,
        }
    }

    #[tokio::test]
    async fn wraps_fetched_page_as_named_response() {
        let mut fetcher = MockContentFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url: &str| url == "http://example.test")
            .times(1)
            .returning(|_| Ok(b"PAGE".to_vec()));

        let executor = ToolExecutor::new(Arc::new(fetcher));
        let response = executor
            .execute(&call(
                "fetchWebsiteContent",
                json!({"url": "http://example.test"}),
            ))
            .await
            .expect("tool result");

        assert_eq!(response.name, "fetchWebsiteContent");
        assert_eq!(response.response["content"], "PAGE");
    }

    #[tokio::test]
    async fn missing_url_is_argument_error() {
        let mut fetcher = MockContentFetcher::new();
        fetcher.expect_fetch().never();

        let executor = ToolExecutor::new(Arc::new(fetcher));
        let err = executor
            .execute(&call("fetchWebsiteContent", json!({})))
            .await
            .expect_err("missing url");
        assert!(matches!(err, BotError::ArgumentType { argument: "url", .. }));
    }

    #[tokio::test]
    async fn non_string_url_is_argument_error() {
        let mut fetcher = MockContentFetcher::new();
        fetcher.expect_fetch().never();

        let executor = ToolExecutor::new(Arc::new(fetcher));
        let err = executor
            .execute(&call("fetchWebsiteContent", json!({"url": 7})))
            .await
            .expect_err("numeric url");
        assert!(matches!(err, BotError::ArgumentType { .. }));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_without_fetching() {
        let mut fetcher = MockContentFetcher::new();
        fetcher.expect_fetch().never();

        let executor = ToolExecutor::new(Arc::new(fetcher));
        let err = executor
            .execute(&call("doStuff", json!({"url": "http://example.test"})))
            .await
            .expect_err("unknown tool");
        assert!(matches!(err, BotError::UnknownTool(name) if name == "doStuff"));
    }

    #[tokio::test]
    async fn fetched_bytes_are_decoded_lossily() {
        let mut fetcher = MockContentFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(vec![b'o', b'k', 0xff]));

        let executor = ToolExecutor::new(Arc::new(fetcher));
        let response = executor
            .execute(&call("fetchWebsiteContent", json!({"url": "http://a.test"})))
            .await
            .expect("tool result");
        assert_eq!(response.response["content"], "ok\u{fffd}");
    }

    #[tokio::test]
    async fn unknown_tool_later_in_batch_prevents_every_fetch() {
        let mut fetcher = MockContentFetcher::new();
        fetcher.expect_fetch().never();

        let executor = ToolExecutor::new(Arc::new(fetcher));
        let err = executor
            .execute_all(&[
                call("fetchWebsiteContent", json!({"url": "http://a.test"})),
                call("doStuff", json!({})),
            ])
            .await
            .expect_err("unknown tool");
        assert!(matches!(err, BotError::UnknownTool(name) if name == "doStuff"));
    }

    #[tokio::test]
    async fn bad_argument_later_in_batch_prevents_every_fetch() {
        let mut fetcher = MockContentFetcher::new();
        fetcher.expect_fetch().never();

        let executor = ToolExecutor::new(Arc::new(fetcher));
        let err = executor
            .execute_all(&[
                call("fetchWebsiteContent", json!({"url": "http://a.test"})),
                call("fetchWebsiteContent", json!({"url": false})),
            ])
            .await
            .expect_err("bad argument");
        assert!(matches!(err, BotError::ArgumentType { .. }));
    }

    #[tokio::test]
    async fn batch_runs_calls_in_order() {
        let mut seq = mockall::Sequence::new();
        let mut fetcher = MockContentFetcher::new();
        for (url, body) in [("http://a.test", "A"), ("http://b.test", "B")] {
            fetcher
                .expect_fetch()
                .withf(move |requested: &str| requested == url)
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(body.as_bytes().to_vec()));
        }

        let executor = ToolExecutor::new(Arc::new(fetcher));
        let responses = executor
            .execute_all(&[
                call("fetchWebsiteContent", json!({"url": "http://a.test"})),
                call("fetchWebsiteContent", json!({"url": "http://b.test"})),
            ])
            .await
            .expect("tool results");
        let contents: Vec<_> = responses.iter().map(|r| &r.response["content"]).collect();
        assert_eq!(contents, [&json!("A"), &json!("B")]);
    }
}
