mod hosted;
mod local;
mod utils;

use std::sync::Arc;

use async_trait::async_trait;
use fabler_common::{bail, Conf, Report};

pub use hosted::HostedBackend;
pub use local::LocalBackend;

/// A text generation capability. Implementations turn a finished prompt into
/// raw story text and nothing else, so either backend can sit behind the
/// prompt and sanitization logic untouched.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, Report>;
}

/// Builds the backend named by the configuration.
///
/// The hosted backend refuses to construct without a credential, so a missing
/// key halts startup before any request is served.
pub fn from_conf(conf: &Conf) -> Result<Arc<dyn StoryBackend>, Report> {
    match conf.backend.as_str() {
        "hosted" => Ok(Arc::new(HostedBackend::from_conf(conf)?)),
        "local" => Ok(Arc::new(LocalBackend::from_conf(conf)?)),
        other => bail!("unknown backend `{}`, expected `hosted` or `local`", other),
    }
}
