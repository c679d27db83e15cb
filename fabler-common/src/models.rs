/// A single story request, alive for exactly one generation.
#[derive(Clone, Debug)]
pub struct StoryRequest {
    pub premise: String,
    pub style: String,
    pub length: String,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Style {
    #[serde(rename = "adventurous")]
    Adventurous,
    #[serde(rename = "mysterious")]
    Mysterious,
    #[serde(rename = "romantic")]
    Romantic,
    #[serde(rename = "sci-fi")]
    SciFi,
    #[serde(rename = "fantasy")]
    Fantasy,
    #[serde(rename = "horror")]
    Horror,
    #[serde(rename = "comedy")]
    Comedy,
    #[serde(rename = "drama")]
    Drama,
}

impl Style {
    pub const ALL: [Style; 8] = [
        Style::Adventurous,
        Style::Mysterious,
        Style::Romantic,
        Style::SciFi,
        Style::Fantasy,
        Style::Horror,
        Style::Comedy,
        Style::Drama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Adventurous => "adventurous",
            Style::Mysterious => "mysterious",
            Style::Romantic => "romantic",
            Style::SciFi => "sci-fi",
            Style::Fantasy => "fantasy",
            Style::Horror => "horror",
            Style::Comedy => "comedy",
            Style::Drama => "drama",
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Length {
    #[serde(rename = "short")]
    Short,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "long")]
    Long,
}

impl Length {
    pub const ALL: [Length; 3] = [Length::Short, Length::Medium, Length::Long];

    pub fn as_str(&self) -> &'static str {
        match self {
            Length::Short => "short",
            Length::Medium => "medium",
            Length::Long => "long",
        }
    }
}

/// A generated story with its derived metrics, recomputed on construction and
/// never stored anywhere.
#[derive(Clone, Debug)]
pub struct GeneratedStory {
    pub text: String,
    pub word_count: usize,
    pub char_count: usize,
}

impl GeneratedStory {
    pub fn new(text: String) -> Self {
        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();

        Self {
            text,
            word_count,
            char_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_derive_from_text() {
        let story = GeneratedStory::new("The door opened onto yesterday.".to_string());

        assert_eq!(story.word_count, 5);
        assert_eq!(story.char_count, 31);
    }

    #[test]
    fn style_names_round_trip_through_serde() {
        for style in Style::ALL {
            let json = serde_json::to_string(&style).unwrap();

            assert_eq!(json, format!("\"{}\"", style.as_str()));
        }
    }
}
