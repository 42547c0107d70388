//! Minimal tsu-endpoint demo — one endpoint behind an auth-style middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/anything
//!   curl -i -H 'cookie: user=bob' http://localhost:3000/feed.txt

use serde_json::json;
use tsu_endpoint::middleware::Next;
use tsu_endpoint::{
    BoxError, Context, Cookie, Endpoint, EndpointOutput, Environment, LegacyOutput, Server,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let endpoint = Endpoint::new(greet).with_middleware(who);
    let env = Environment::new().server_rendering(true);

    Server::bind("0.0.0.0:3000")
        .serve(endpoint, env)
        .await
        .expect("server error");
}

// Puts the caller's name into locals and remembers it in a cookie.
async fn who(ctx: Context, next: Next) -> Result<EndpointOutput, BoxError> {
    let user = ctx.cookies().get("user").unwrap_or("guest").to_owned();
    ctx.set_locals(json!({ "user": user }))?;
    ctx.cookies().set(Cookie::new("user", user).with_path("/"));
    next.run().await
}

// Still returns the deprecated plain-object shape; the server logs a warning
// and serves it as text/plain.
async fn greet(ctx: Context) -> Result<LegacyOutput, BoxError> {
    let user = ctx
        .locals()
        .and_then(|l| l.get("user").and_then(|u| u.as_str()).map(str::to_owned))
        .unwrap_or_default();
    let addr = ctx.client_address()?;
    Ok(LegacyOutput::new(format!("hello {user} from {addr}\n")))
}
