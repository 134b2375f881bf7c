use std::{sync::OnceLock, time::Duration};

use tracing::debug;

use crate::Result;

const USER_AGENT: &str = concat!("streamwatch/", env!("CARGO_PKG_VERSION"));

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Build the client shared by the feed, metadata, chat and sentiment
/// collaborators.
pub fn build_http_client(request_timeout: Duration) -> Result<reqwest::Client> {
    install_rustls_provider();

    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10));

    if request_timeout > Duration::ZERO {
        builder = builder.timeout(request_timeout);
    }

    Ok(builder.build()?)
}
