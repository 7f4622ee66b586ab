//! Script synthesis from style templates, caller scripts or model drafts.

use tracing::debug;

use sforge_models::{GenerationRequest, Script, ScriptOrigin, ScriptSource, Style};

use crate::error::PipelineResult;
use crate::script_model::ModelDraft;

/// Longest title kept, in characters.
pub const MAX_TITLE_CHARS: usize = 60;
/// Fewest beats in a topic script.
pub const MIN_BEATS: usize = 3;
/// Seconds of narration one beat roughly fills.
pub const SECS_PER_BEAT: u32 = 12;
/// Keyword hashtags taken from a caller-supplied script.
pub const MAX_KEYWORD_TAGS: usize = 2;

const PLACEHOLDER: &str = "{topic}";

/// Fixed wording for one style.
#[derive(Debug)]
pub struct StyleTemplate {
    pub title_pattern: &'static str,
    pub beats: &'static [&'static str],
    pub cta: &'static str,
    pub tags: &'static [&'static str],
}

static VIRAL: StyleTemplate = StyleTemplate {
    title_pattern: "{topic} - You Need To See This!",
    beats: &[
        "Stop scrolling, because {topic} is not what you think.",
        "Most people have no idea how much {topic} shapes their everyday life.",
        "Here is the part nobody talks about.",
        "The real story behind {topic} starts with one simple idea.",
        "Once you see it, you cannot unsee it.",
        "And the experts are still arguing about what comes next.",
        "That is why {topic} is blowing up right now.",
        "Remember this the next time someone brings up {topic}.",
    ],
    cta: "Follow for more and share this with a friend!",
    tags: &["#viral", "#fyp", "#foryou"],
};

static EDUCATIONAL: StyleTemplate = StyleTemplate {
    title_pattern: "{topic} Explained in 60 Seconds",
    beats: &[
        "Let's break down {topic} in under a minute.",
        "First, what is {topic} actually?",
        "At its core, it comes down to a few key ideas.",
        "Point one: {topic} builds on principles that have been studied for years.",
        "Point two: small changes can lead to surprisingly large effects.",
        "Point three: the details matter more than most people expect.",
        "Put together, these ideas explain why {topic} matters.",
        "Now you know more about {topic} than most people.",
    ],
    cta: "Save this video and follow to learn something new every day.",
    tags: &["#education", "#didyouknow", "#learnontiktok"],
};

static STORY: StyleTemplate = StyleTemplate {
    title_pattern: "The Story of {topic}",
    beats: &[
        "This is the story of {topic}.",
        "It started quietly, the way most big things do.",
        "At first, nobody paid much attention to {topic}.",
        "Then something changed, and everyone started to notice.",
        "The people closest to it faced a choice they never expected.",
        "What happened next surprised even them.",
        "And that is how {topic} became a story worth telling.",
        "But the ending is not written yet.",
    ],
    cta: "Follow to hear the next chapter.",
    tags: &["#story", "#storytime", "#fyp"],
};

impl StyleTemplate {
    pub fn for_style(style: Style) -> &'static StyleTemplate {
        match style {
            Style::Viral => &VIRAL,
            Style::Educational => &EDUCATIONAL,
            Style::Story => &STORY,
        }
    }

    /// Title from the pattern, capped.
    pub fn title_for(&self, subject: &str) -> String {
        cap_chars(&self.title_pattern.replace(PLACEHOLDER, subject), MAX_TITLE_CHARS)
    }

    /// Beat count for a duration hint.
    pub fn beat_count(&self, duration_hint: u32) -> usize {
        let wanted = (duration_hint / SECS_PER_BEAT) as usize;
        wanted.max(MIN_BEATS).min(self.beats.len())
    }
}

/// Builds the script for a run from a topic or a caller-supplied body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptSynthesizer;

impl ScriptSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the source from the request and synthesize.
    pub fn from_request(&self, request: &GenerationRequest) -> PipelineResult<Script> {
        let source = request.source()?;
        Ok(self.synthesize(&source, request.style, request.title(), request.duration))
    }

    pub fn synthesize(
        &self,
        source: &ScriptSource,
        style: Style,
        title: Option<&str>,
        duration_hint: u32,
    ) -> Script {
        let template = StyleTemplate::for_style(style);

        let (title, body, lead_tags, origin) = match source {
            ScriptSource::Topic(topic) => {
                let topic = topic.trim();
                let beats = template.beat_count(duration_hint);
                let body = template.beats[..beats]
                    .iter()
                    .map(|beat| beat.replace(PLACEHOLDER, topic))
                    .collect::<Vec<_>>()
                    .join(" ");
                let title = title
                    .map(|t| cap_chars(t, MAX_TITLE_CHARS))
                    .unwrap_or_else(|| template.title_for(&title_case(topic)));
                let tags = topic_tag(topic).into_iter().collect();
                (title, body, tags, ScriptOrigin::Topic)
            }
            ScriptSource::Script(body) => {
                let title = title
                    .map(|t| cap_chars(t, MAX_TITLE_CHARS))
                    .or_else(|| derive_title(body))
                    .unwrap_or_else(|| template.title_for("Untitled"));
                (title, body.clone(), keyword_tags(body), ScriptOrigin::User)
            }
        };

        let hashtags = dedup(
            lead_tags
                .into_iter()
                .chain(template.tags.iter().map(|t| t.to_string())),
        );
        let hook = first_sentence(&body).to_string();

        debug!(
            style = style.as_str(),
            words = body.split_whitespace().count(),
            "Synthesized script: {}",
            title
        );

        Script {
            title,
            body,
            hook,
            hashtags,
            cta: template.cta.to_string(),
            style,
            origin,
        }
    }
}

impl ScriptSynthesizer {
    /// Script from a model draft for `topic`. Fields the model left out come
    /// from the style template; the body is kept as written.
    pub fn from_draft(
        &self,
        draft: ModelDraft,
        topic: &str,
        style: Style,
        title: Option<&str>,
    ) -> Script {
        let template = StyleTemplate::for_style(style);
        let topic = topic.trim();

        let title = title
            .map(|t| cap_chars(t, MAX_TITLE_CHARS))
            .or_else(|| {
                draft
                    .title
                    .as_deref()
                    .map(|t| cap_chars(t.trim_matches(['"', '\'']), MAX_TITLE_CHARS))
                    .filter(|t| !t.is_empty())
            })
            .unwrap_or_else(|| template.title_for(&title_case(topic)));

        let body = draft.script.trim().to_string();
        let hook = draft
            .hook
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| first_sentence(&body).to_string());
        let cta = draft
            .cta
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| template.cta.to_string());
        let hashtags = dedup(
            topic_tag(topic)
                .into_iter()
                .chain(draft.hashtags.iter().filter_map(|t| normalize_tag(t)))
                .chain(template.tags.iter().map(|t| t.to_string())),
        );

        Script {
            title,
            body,
            hook,
            hashtags,
            cta,
            style,
            origin: ScriptOrigin::Model,
        }
    }
}

/// Trim and cap on a char boundary.
fn cap_chars(text: &str, max: usize) -> String {
    let capped: String = text.trim().chars().take(max).collect();
    capped.trim_end().to_string()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text up to and including the first sentence terminator.
fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map(|(_, n)| n.is_whitespace()).unwrap_or(true);
            if at_boundary {
                return &text[..i + c.len_utf8()];
            }
        }
    }
    text
}

fn derive_title(body: &str) -> Option<String> {
    let sentence = first_sentence(body).trim_end_matches(['.', '!', '?']);
    let title = cap_chars(sentence, MAX_TITLE_CHARS);
    (!title.is_empty()).then_some(title)
}

fn topic_tag(topic: &str) -> Option<String> {
    let slug: String = topic
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    (!slug.is_empty()).then(|| format!("#{}", slug))
}

/// `#` plus the lowercased alphanumerics of a model-supplied tag.
fn normalize_tag(tag: &str) -> Option<String> {
    let slug: String = tag
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    (!slug.is_empty()).then(|| format!("#{}", slug))
}

/// The longest distinct words of at least five characters.
fn keyword_tags(body: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for raw in body.split_whitespace() {
        let word: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        if word.chars().count() >= 5 && !words.contains(&word) {
            words.push(word);
        }
    }
    // stable: ties keep first-occurrence order
    words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    words
        .into_iter()
        .take(MAX_KEYWORD_TAGS)
        .map(|w| format!("#{}", w))
        .collect()
}

fn dedup(tags: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use sforge_models::ErrorKind;

    fn topic(text: &str) -> ScriptSource {
        ScriptSource::Topic(text.into())
    }

    #[test]
    fn test_topic_script_uses_style_template() {
        let script = ScriptSynthesizer::new().synthesize(&topic("black holes"), Style::Viral, None, 60);

        assert_eq!(script.title, "Black Holes - You Need To See This!");
        assert_eq!(script.origin, ScriptOrigin::Topic);
        assert_eq!(script.hashtags, vec!["#blackholes", "#viral", "#fyp", "#foryou"]);
        assert_eq!(script.cta, VIRAL.cta);
        assert!(script.body.contains("black holes"));
        assert!(!script.body.contains(PLACEHOLDER));
        assert_eq!(script.hook, "Stop scrolling, because black holes is not what you think.");
    }

    #[test]
    fn test_duration_hint_sizes_beats() {
        let template = StyleTemplate::for_style(Style::Educational);
        assert_eq!(template.beat_count(5), MIN_BEATS);
        assert_eq!(template.beat_count(60), 5);
        assert_eq!(template.beat_count(300), template.beats.len());

        let short = ScriptSynthesizer::new().synthesize(&topic("AI"), Style::Educational, None, 10);
        let long = ScriptSynthesizer::new().synthesize(&topic("AI"), Style::Educational, None, 120);
        assert!(long.word_count() > short.word_count());
    }

    #[test]
    fn test_user_script_kept_verbatim() {
        let body = "Octopuses have three hearts! Two pump blood to the gills.";
        let script =
            ScriptSynthesizer::new().synthesize(&ScriptSource::Script(body.into()), Style::Story, None, 60);

        assert_eq!(script.body, body);
        assert_eq!(script.title, "Octopuses have three hearts");
        assert_eq!(script.hook, "Octopuses have three hearts!");
        assert_eq!(script.origin, ScriptOrigin::User);
        assert_eq!(
            script.hashtags,
            vec!["#octopuses", "#hearts", "#story", "#storytime", "#fyp"]
        );
    }

    #[test]
    fn test_explicit_title_wins_and_is_capped() {
        let long_title = "x".repeat(80);
        let script = ScriptSynthesizer::new().synthesize(
            &ScriptSource::Script("Hello there.".into()),
            Style::Viral,
            Some(&long_title),
            60,
        );
        assert_eq!(script.title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_untitled_fallback() {
        let script =
            ScriptSynthesizer::new().synthesize(&ScriptSource::Script("...".into()), Style::Story, None, 60);
        assert_eq!(script.title, "The Story of Untitled");
    }

    #[test]
    fn test_hashtags_deduplicated() {
        let script = ScriptSynthesizer::new().synthesize(&topic("viral"), Style::Viral, None, 60);
        assert_eq!(script.hashtags, vec!["#viral", "#fyp", "#foryou"]);
    }

    #[test]
    fn test_missing_source_is_input_error() {
        let mut request = GenerationRequest::for_topic(" ");
        request.script = None;
        let err: PipelineError = ScriptSynthesizer::new().from_request(&request).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InputError);
    }

    fn draft(title: Option<&str>) -> ModelDraft {
        ModelDraft {
            title: title.map(String::from),
            script: "Only 5% of the ocean has been mapped. The rest is darker than you think.".into(),
            hook: None,
            hashtags: vec!["DeepSea".into(), "#ocean".into(), "#".into()],
            cta: Some("  ".into()),
        }
    }

    #[test]
    fn test_model_draft_fills_gaps_from_template() {
        let script = ScriptSynthesizer::new().from_draft(
            draft(Some("\"The Ocean Nobody Has Seen\"")),
            "ocean",
            Style::Educational,
            None,
        );
        assert_eq!(script.origin, ScriptOrigin::Model);
        assert_eq!(script.title, "The Ocean Nobody Has Seen");
        assert_eq!(script.hook, "Only 5% of the ocean has been mapped.");
        assert_eq!(script.cta, EDUCATIONAL.cta);
        assert_eq!(
            script.hashtags,
            vec!["#ocean", "#deepsea", "#education", "#didyouknow", "#learnontiktok"]
        );
    }

    #[test]
    fn test_model_draft_title_precedence() {
        let synth = ScriptSynthesizer::new();
        let explicit = synth.from_draft(draft(Some("Model title")), "ocean", Style::Viral, Some("Mine"));
        assert_eq!(explicit.title, "Mine");

        let long = "y".repeat(90);
        let capped = synth.from_draft(draft(Some(&long)), "ocean", Style::Viral, None);
        assert_eq!(capped.title.chars().count(), MAX_TITLE_CHARS);

        let untitled = synth.from_draft(draft(None), "deep ocean", Style::Story, None);
        assert_eq!(untitled.title, "The Story of Deep Ocean");
    }

    #[test]
    fn test_first_sentence_ignores_decimal_points() {
        assert_eq!(first_sentence("Pi is 3.14 roughly. Yes."), "Pi is 3.14 roughly.");
        assert_eq!(first_sentence("no terminator"), "no terminator");
    }
}
