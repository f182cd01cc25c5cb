//! Local development host serving a couple of sample operations.

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use opcodec_core::{ApiResponse, Body, HttpMethod, Operation, ValidationField};
use opcodec_server::network::shutdown_signal;
use opcodec_server::{
    handler_fn, ApiRequest, Failure, Middleware, NetworkConfig, NetworkModule, OperationRouter,
    OperationServer, ServerConfig, Validator, Validators,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dev-server")]
#[command(about = "Serve sample operations through the opcodec pipeline", long_about = None)]
struct Cli {
    #[arg(long, env = "OPCODEC_HOST", default_value = "127.0.0.1")]
    host: String,
    #[arg(long, env = "OPCODEC_PORT", default_value_t = 3000)]
    port: u16,
    /// Emit logs as JSON lines
    #[arg(long, env = "OPCODEC_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut router = OperationRouter::new();
    router.register(echo_server())?;
    router.register(greeting_server())?;

    let mut module = NetworkModule::new(NetworkConfig {
        host: cli.host,
        port: cli.port,
        ..NetworkConfig::default()
    });
    let port = module.start().await?;
    info!(port, "dev server ready");

    module.serve(router, shutdown_signal()).await
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Adds `x-powered-by` to every response.
struct PoweredBy;

#[async_trait]
impl Middleware for PoweredBy {
    async fn response(&self, response: ApiResponse, _failure: Option<&Failure>) -> ApiResponse {
        response.with_header("x-powered-by", "opcodec")
    }
}

/// `POST /echo/{name}` returns the decoded request body.
fn echo_server() -> OperationServer {
    let operation = Operation::new(HttpMethod::Post, "/echo/{name}")
        .with_id("echo")
        .with_request_body(
            true,
            ["application/json", "application/x-www-form-urlencoded", "text/plain"],
        )
        .with_success_codes([200]);
    OperationServer::new(
        operation,
        handler_fn(|request: ApiRequest| async move {
            Ok::<_, Failure>(ApiResponse::json(
                200,
                json!({
                    "name": request.path_param("name"),
                    "mediaType": request.media_type,
                    "body": request.body.as_ref().map(Body::to_value),
                }),
            ))
        }),
    )
    .with_middleware(PoweredBy)
    .with_config(ServerConfig {
        log_rejections: true,
        ..ServerConfig::default()
    })
}

/// `GET /greetings/{name}?shout=true|false` returns a text greeting.
fn greeting_server() -> OperationServer {
    let shout_is_boolean = Validator::predicate(
        |query| {
            matches!(
                query.get("shout").and_then(|value| value.as_str()),
                None | Some("true" | "false")
            )
        },
        |_| json!([{"path": "shout", "message": "must be true or false"}]),
    );
    OperationServer::new(
        Operation::new(HttpMethod::Get, "/greetings/{name}").with_id("greet"),
        handler_fn(|request: ApiRequest| async move {
            let name = request.path_param("name").unwrap_or("stranger");
            let greeting = format!("Hello, {name}!");
            let greeting = if request.query_param("shout") == Some("true") {
                greeting.to_uppercase()
            } else {
                greeting
            };
            Ok::<_, Failure>(ApiResponse::text(200, greeting))
        }),
    )
    .with_validators(Validators::new().with(ValidationField::QueryString, shout_is_boolean))
    .with_middleware(PoweredBy)
}
