use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use candle_core::{quantized::gguf_file, Device, Tensor};
use candle_transformers::{generation::LogitsProcessor, models::quantized_llama::ModelWeights};
use fabler_common::{bail, err, Conf, Context as _, Report};
use once_cell::sync::OnceCell;
use tokenizers::Tokenizer;

use crate::StoryBackend;

const MAX_NEW_TOKENS: usize = 1200;
const TEMPERATURE: f64 = 0.8;
const TOP_P: f64 = 0.95;
const SEED: u64 = 299792458;
const EOS_TOKEN: &str = "</s>";

/// In-process inference over a quantized transformer checkpoint.
///
/// The pipeline loads on first use and lives for the rest of the process, so
/// repeated generations reuse the same weights. There is no invalidation.
pub struct LocalBackend {
    model_path: String,
    tokenizer_path: String,
    device: String,
    pipeline: OnceCell<Arc<Mutex<Pipeline>>>,
}

impl LocalBackend {
    pub fn from_conf(conf: &Conf) -> Result<Self, Report> {
        let model_path = conf.model_path.clone().ok_or_else(|| {
            err!("the local backend needs `model_path` pointing at a GGUF checkpoint")
        })?;
        let tokenizer_path = conf.tokenizer_path.clone().ok_or_else(|| {
            err!("the local backend needs `tokenizer_path` pointing at a tokenizer.json")
        })?;

        Ok(Self {
            model_path,
            tokenizer_path,
            device: conf.device.clone().unwrap_or_else(|| "auto".to_string()),
            pipeline: OnceCell::new(),
        })
    }

    fn pipeline(&self) -> Result<Arc<Mutex<Pipeline>>, Report> {
        self.pipeline
            .get_or_try_init(|| {
                Pipeline::load(&self.model_path, &self.tokenizer_path, &self.device)
                    .map(|pipeline| Arc::new(Mutex::new(pipeline)))
            })
            .map(Arc::clone)
    }
}

#[async_trait]
impl StoryBackend for LocalBackend {
    #[tracing::instrument(skip_all, err)]
    async fn generate(&self, prompt: &str) -> Result<String, Report> {
        let pipeline = self.pipeline()?;
        let prompt = prompt.to_string();

        let text = tokio::task::spawn_blocking(move || {
            let mut pipeline = pipeline
                .lock()
                .map_err(|_| err!("inference pipeline poisoned"))?;

            pipeline.run(&prompt, MAX_NEW_TOKENS)
        })
        .await
        .map_err(Report::from)??;

        // small models tend to drop capitals after sentence breaks
        Ok(fabler_sanitize::repair_capitalization(&text))
    }
}

struct Pipeline {
    weights: ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
}

impl Pipeline {
    #[tracing::instrument(err, skip_all, fields(model = %model_path))]
    fn load(model_path: &str, tokenizer_path: &str, device: &str) -> Result<Self, Report> {
        let device = select_device(device)?;

        tracing::info!("loading model checkpoint");

        let mut file = std::fs::File::open(model_path)
            .with_context(|| format!("unable to open `{}`", model_path))?;
        let content = gguf_file::Content::read(&mut file)
            .with_context(|| format!("unable to read `{}`", model_path))?;
        let weights = ModelWeights::from_gguf(content, &mut file, &device)?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|error| err!("unable to load tokenizer: {}", error))?;

        tracing::info!("model ready");

        Ok(Self {
            weights,
            tokenizer,
            device,
        })
    }

    #[tracing::instrument(err, skip_all)]
    fn run(&mut self, prompt: &str, max_new_tokens: usize) -> Result<String, Report> {
        let encoded = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|error| err!("unable to encode prompt: {}", error))?;
        let prompt_tokens = encoded.get_ids().to_vec();
        let eos = self.tokenizer.token_to_id(EOS_TOKEN);

        let mut logits_processor = LogitsProcessor::new(SEED, Some(TEMPERATURE), Some(TOP_P));

        let input = Tensor::new(prompt_tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        let logits = self.weights.forward(&input, 0)?.squeeze(0)?;
        let mut next = logits_processor.sample(&logits)?;

        let mut generated = Vec::with_capacity(max_new_tokens);

        for index in 0..max_new_tokens {
            if Some(next) == eos {
                break;
            }

            generated.push(next);

            let input = Tensor::new(&[next], &self.device)?.unsqueeze(0)?;
            let logits = self
                .weights
                .forward(&input, prompt_tokens.len() + index)?
                .squeeze(0)?;
            next = logits_processor.sample(&logits)?;
        }

        tracing::info!(tokens = generated.len(), "generation finished");

        let text = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|error| err!("unable to decode story: {}", error))?;

        Ok(text)
    }
}

fn select_device(device: &str) -> Result<Device, Report> {
    match device {
        "auto" => Ok(Device::cuda_if_available(0)?),
        "cpu" => Ok(Device::Cpu),
        other => bail!("unknown device `{}`, expected `auto` or `cpu`", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_device_is_always_available() {
        assert!(matches!(select_device("cpu"), Ok(Device::Cpu)));
    }

    #[test]
    fn unknown_devices_are_refused() {
        assert!(select_device("tpu").is_err());
    }
}
