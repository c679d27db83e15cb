pub mod download;
pub mod models;

pub use color_eyre::{
    eyre::{bail, eyre as err, Context, Report},
    install,
};

#[twelf::config]
pub struct Conf {
    /// Which text generation backend to use, `hosted` or `local`
    pub backend: String,

    /// Credential for the hosted text generation endpoint
    pub api_key: Option<String>,

    /// Model identifier passed to the hosted endpoint
    pub api_model: Option<String>,

    /// Base URL of the hosted text generation endpoint
    pub api_base: Option<String>,

    /// Path to a quantized model checkpoint in GGUF format
    pub model_path: Option<String>,

    /// Path to the tokenizer definition matching the local model
    pub tokenizer_path: Option<String>,

    /// Inference device for the local backend, `auto` or `cpu`
    pub device: Option<String>,
}
