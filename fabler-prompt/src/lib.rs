//! Prompt construction for the story backends.
//!
//! Pure lookups over fixed tables, no state and no failure paths. Unknown
//! styles and lengths fall back to generic fragments instead of erroring.

/// Tone fragment used when the style is not one of the eight known genres.
pub const FALLBACK_STYLE_DESCRIPTION: &str = "engaging";

/// Word count hint used when the length tag is unknown.
pub const FALLBACK_LENGTH_HINT: &str = "500 words";

/// Canned quick-start premises, paired with the style they read best in.
pub const EXAMPLE_PREMISES: [(&str, &str); 4] = [
    ("A detective finds a door that leads to yesterday", "mysterious"),
    ("A chef discovers their spices control emotions", "fantasy"),
    (
        "Two astronauts are stranded on a beautiful alien planet",
        "sci-fi",
    ),
    ("A librarian can hear books whispering their secrets", "fantasy"),
];

pub fn style_description(style: &str) -> Option<&'static str> {
    match style {
        "adventurous" => Some("filled with action, excitement, danger, and thrilling moments"),
        "mysterious" => Some("with suspense, intrigue, hidden secrets, and unexpected revelations"),
        "romantic" => {
            Some("focusing on love, relationships, emotional connections, and heartfelt moments")
        }
        "sci-fi" => Some(
            "with futuristic technology, space travel, scientific concepts, and advanced civilizations",
        ),
        "fantasy" => {
            Some("with magic, mythical creatures, enchanted worlds, and supernatural elements")
        }
        "horror" => Some("with scary, frightening, suspenseful, and spine-chilling elements"),
        "comedy" => Some("humorous, funny, witty, and entertaining with comedic situations"),
        "drama" => {
            Some("emotionally intense with realistic characters, conflicts, and human struggles")
        }
        _ => None,
    }
}

pub fn length_hint(length: &str) -> Option<&'static str> {
    match length {
        "short" => Some("400-600 words"),
        "medium" => Some("700-900 words"),
        "long" => Some("1000-1300 words"),
        _ => None,
    }
}

/// Builds the full instructional prompt around the premise and the two
/// looked-up fragments. Deterministic given its inputs.
pub fn build_prompt(premise: &str, style: &str, length: &str) -> String {
    let description = style_description(style).unwrap_or(FALLBACK_STYLE_DESCRIPTION);
    let hint = length_hint(length).unwrap_or(FALLBACK_LENGTH_HINT);

    format!(
        "You are a professional storyteller. Write a complete, engaging story based on this premise: {premise}\n\
         \n\
         STORY REQUIREMENTS:\n\
         - Style: {style} ({description})\n\
         - Length: {hint}\n\
         - Format: Complete narrative story\n\
         - Structure: Clear beginning, middle, and end\n\
         - Characters: Well-developed with distinct personalities\n\
         - Setting: Vivid and immersive descriptions\n\
         - Plot: Compelling with conflict and resolution\n\
         \n\
         CRITICAL INSTRUCTIONS:\n\
         - Write ONLY the story content\n\
         - Do NOT include meta-commentary, explanations, or analysis\n\
         - Do NOT use numbered lists or bullet points\n\
         - Do NOT break the story into sections or chapters\n\
         - Create a flowing, continuous narrative\n\
         - Start the story immediately with action or dialogue\n\
         - End with a satisfying conclusion\n\
         \n\
         Begin writing the story now:"
    )
}

#[cfg(test)]
mod tests {
    use fabler_common::models::{Length, Style};

    use super::*;

    #[test]
    fn every_known_style_lands_in_the_prompt() {
        for style in Style::ALL {
            let prompt = build_prompt("a lighthouse keeper", style.as_str(), "short");

            assert!(prompt.contains("a lighthouse keeper"));
            assert!(prompt.contains(style.as_str()));
            assert!(prompt.contains(style_description(style.as_str()).unwrap()));
        }
    }

    #[test]
    fn every_known_length_lands_in_the_prompt() {
        for length in Length::ALL {
            let prompt = build_prompt("a lighthouse keeper", "drama", length.as_str());

            assert!(prompt.contains(length_hint(length.as_str()).unwrap()));
        }
    }

    #[test]
    fn unknown_style_falls_back_without_erroring() {
        let prompt = build_prompt("a lighthouse keeper", "noir", "short");

        assert!(prompt.contains("(engaging)"));
        assert!(prompt.contains("a lighthouse keeper"));
    }

    #[test]
    fn unknown_length_falls_back_without_erroring() {
        let prompt = build_prompt("a lighthouse keeper", "drama", "novella");

        assert!(prompt.contains("500 words"));
    }

    #[test]
    fn example_premises_use_known_styles() {
        for (premise, style) in EXAMPLE_PREMISES {
            assert!(!premise.is_empty());
            assert!(style_description(style).is_some());
        }
    }
}
