use std::path::Path;

use fabler_backend::StoryBackend;
use fabler_common::{
    bail, download, err,
    models::{GeneratedStory, StoryRequest},
    Conf, Context as _, Report,
};

#[tracing::instrument(skip(conf, premise), err)]
pub async fn run(
    conf: &Conf,
    premise: &str,
    style: &str,
    length: &str,
    output: Option<&Path>,
) -> Result<(), Report> {
    if premise.trim().is_empty() {
        bail!("the premise must not be empty");
    }

    let request = StoryRequest {
        premise: premise.trim().to_string(),
        style: style.to_string(),
        length: length.to_string(),
    };

    let backend = fabler_backend::from_conf(conf)?;

    let story = generate(backend.as_ref(), &request).await?;

    tracing::info!(
        words = story.word_count,
        characters = story.char_count,
        "story ready"
    );

    match output {
        Some(path) => {
            tokio::fs::write(path, download::document(&request, &story))
                .await
                .with_context(|| format!("unable to write story to `{}`", path.display()))?;

            tracing::info!(path = %path.display(), "story written");
        }
        None => println!("{}", story.text),
    }

    Ok(())
}

/// The one-shot request flow shared by every surface: build the prompt, call
/// the backend once, clean the response, derive the metrics. No retries, the
/// user re-triggers generation by hand.
#[tracing::instrument(skip(backend, request), fields(style = %request.style, length = %request.length), err)]
pub async fn generate(
    backend: &dyn StoryBackend,
    request: &StoryRequest,
) -> Result<GeneratedStory, Report> {
    let prompt = fabler_prompt::build_prompt(&request.premise, &request.style, &request.length);

    let raw = backend.generate(&prompt).await?;

    let text = fabler_sanitize::sanitize(&raw).map_err(|rejection| err!("{}", rejection))?;

    Ok(GeneratedStory::new(text))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct CannedBackend {
        response: String,
    }

    #[async_trait]
    impl StoryBackend for CannedBackend {
        async fn generate(&self, _prompt: &str) -> Result<String, Report> {
            Ok(self.response.clone())
        }
    }

    fn request() -> StoryRequest {
        StoryRequest {
            premise: "A chef discovers their spices control emotions".to_string(),
            style: "fantasy".to_string(),
            length: "short".to_string(),
        }
    }

    #[tokio::test]
    async fn preambles_are_stripped_before_the_story_is_returned() {
        let backend = CannedBackend {
            response: format!(
                "Here's a story: The kitchen hummed with a quiet magic. {}",
                "Every jar on the shelf glowed when the chef reached for it. ".repeat(3)
            ),
        };

        let story = generate(&backend, &request()).await.unwrap();

        assert!(!story.text.starts_with("Here's a story:"));
        assert!(story.text.starts_with("The kitchen hummed"));
        assert!(story.word_count > 0);
    }

    #[tokio::test]
    async fn short_responses_surface_as_errors() {
        let backend = CannedBackend {
            response: "too short".to_string(),
        };

        let error = generate(&backend, &request()).await.unwrap_err();

        assert!(error.to_string().contains("too short"));
    }

    #[tokio::test]
    async fn empty_responses_surface_as_errors() {
        let backend = CannedBackend {
            response: String::new(),
        };

        let error = generate(&backend, &request()).await.unwrap_err();

        assert!(error.to_string().contains("empty response"));
    }
}
