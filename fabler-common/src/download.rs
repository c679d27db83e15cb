use crate::models::{GeneratedStory, StoryRequest};

/// Builds the plain text document behind the download button, a fixed header
/// followed by the story body.
pub fn document(request: &StoryRequest, story: &GeneratedStory) -> String {
    format!(
        "Title: {} Story\nPremise: {}\nStyle: {}\nLength: {}\n\n{}",
        title_case(&request.style),
        request.premise,
        request.style,
        request.length,
        story.text,
    )
}

pub fn file_name(request: &StoryRequest) -> String {
    format!("story_{}_{}.txt", request.style, request.length)
}

fn title_case(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> StoryRequest {
        StoryRequest {
            premise: "A detective finds a door that leads to yesterday".to_string(),
            style: "mysterious".to_string(),
            length: "short".to_string(),
        }
    }

    #[test]
    fn document_carries_the_fixed_header() {
        let story = GeneratedStory::new("The door was already open.".to_string());
        let document = document(&request(), &story);

        assert!(document.starts_with("Title: Mysterious Story\n"));
        assert!(document.contains("Premise: A detective finds a door that leads to yesterday\n"));
        assert!(document.contains("Style: mysterious\n"));
        assert!(document.contains("Length: short\n\n"));
        assert!(document.ends_with("The door was already open."));
    }

    #[test]
    fn file_name_includes_style_and_length() {
        assert_eq!(file_name(&request()), "story_mysterious_short.txt");
    }
}
