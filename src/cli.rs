//! Command-line argument definitions for the linkboard binaries.

use clap::Parser;

/// Arguments for `linkboard-proxy`.
#[derive(Parser, Debug)]
#[command(
    name = "linkboard-proxy",
    about = "Credential-hiding passthrough for the linkboard remote store"
)]
pub struct ProxyArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8787", env = "LINKBOARD_PROXY_ADDR")]
    pub listen: String,

    /// Upstream remote base URL requests are forwarded to
    #[arg(long, env = "LINKBOARD_UPSTREAM_URL")]
    pub upstream_url: Option<String>,

    /// Service credential injected into forwarded requests
    #[arg(long, env = "LINKBOARD_SERVICE_KEY")]
    pub service_key: Option<String>,
}
