pub mod types;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use types::{AnswerOption, Extraction, OptionHandle, Question};

/// Question probes, most specific first. Layout versions of the quiz page
/// disagree on markup, so each is tried in turn.
const QUESTION_PROBES: &[&str] = &[
    "[data-functional-selector=\"block-title\"]",
    "[data-functional-selector=\"question-title\"]",
    "[class*=\"question-title\"]",
    "[class*=\"QuestionTitle\"]",
    "h1",
    "h2",
];

/// Answer probes, most specific first. A probe needs at least two hits.
const ANSWER_PROBES: &[&str] = &[
    "[data-functional-selector^=\"answer-\"]",
    "[data-functional-selector^=\"question-choice-text\"]",
    "[class*=\"answer-button\"]",
    "[class*=\"AnswerButton\"]",
    "[class*=\"choice\"]",
    "button",
];

/// Lobby and status text that shows up in heading slots between questions.
const BOILERPLATE: &[&str] = &[
    "players",
    "player count",
    "waiting for",
    "lobby",
    "game pin",
    "join at",
    "get ready",
    "loading",
];

const ARTIFACT_CHARS: &[char] = &['|', '@', '#', '$', '%', '^', '&', '*'];

pub const MAX_OPTIONS: usize = 6;
const MIN_QUESTION_CHARS: usize = 4;

/// Parse a snapshot and run both probes over it.
pub fn probe(html: &str) -> Extraction {
    let document = Html::parse_document(html);
    Extraction {
        question: extract_question(&document),
        answers: extract_answers(&document),
    }
}

/// First plausible question text from the ordered probes.
pub fn extract_question(document: &Html) -> Option<Question> {
    for probe in QUESTION_PROBES {
        let Ok(selector) = Selector::parse(probe) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = clean_question_text(&text_content(element));
            if is_plausible_question(&text) {
                debug!(probe, question = %text, "question probe hit");
                return Some(Question::new(text));
            }
        }
    }
    None
}

/// Options from the first probe yielding two or more non-empty matches.
/// Fewer than two is "no answers yet", never a partial set.
pub fn extract_answers(document: &Html) -> Vec<AnswerOption> {
    for probe in ANSWER_PROBES {
        let Ok(selector) = Selector::parse(probe) else {
            continue;
        };
        let mut options = Vec::new();
        // Index into the probe's full match list; that list is the handle's arena.
        for (index, element) in document.select(&selector).enumerate() {
            let text = clean_option_text(&text_content(element));
            if text.is_empty() {
                continue;
            }
            options.push(AnswerOption {
                text,
                handle: OptionHandle {
                    selector: probe,
                    index,
                },
            });
            if options.len() == MAX_OPTIONS {
                break;
            }
        }
        if options.len() >= 2 {
            debug!(probe, count = options.len(), "answer probe hit");
            return options;
        }
    }
    Vec::new()
}

/// Dereference a handle against a snapshot, returning the element's text.
pub fn option_text_at(html: &str, handle: OptionHandle) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(handle.selector).ok()?;
    let element = document.select(&selector).nth(handle.index)?;
    Some(clean_option_text(&text_content(element)))
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_question_text(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !ARTIFACT_CHARS.contains(c)).collect();
    compact_ws(&stripped)
}

fn is_plausible_question(text: &str) -> bool {
    if text.chars().count() < MIN_QUESTION_CHARS {
        return false;
    }
    let lower = text.to_lowercase();
    !BOILERPLATE.iter().any(|b| lower.contains(b))
}

fn clean_option_text(raw: &str) -> String {
    let compact = compact_ws(raw);
    strip_enumerator(&compact).to_string()
}

/// Drop a leading "A) ", "b. ", "1. " or "2: " label.
fn strip_enumerator(text: &str) -> &str {
    let mut chars = text.char_indices();
    if let (Some((_, label)), Some((_, sep)), Some((rest_at, space))) =
        (chars.next(), chars.next(), chars.next())
    {
        let is_label = matches!(label, 'A'..='F' | 'a'..='f' | '1'..='6');
        if is_label && matches!(sep, ')' | '.' | ':') && space.is_whitespace() {
            let rest = text[rest_at..].trim_start();
            if !rest.is_empty() {
                return rest;
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const KAHOOT_PAGE: &str = r#"
        <html><body>
          <h1>Quiz night</h1>
          <span data-functional-selector="block-title">What is the   capital of France?</span>
          <div>
            <button data-functional-selector="answer-0"><span>A)</span> London</button>
            <button data-functional-selector="answer-1">Paris</button>
            <button data-functional-selector="answer-2">Berlin</button>
            <button data-functional-selector="answer-3">Madrid</button>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_attribute_probe_wins_over_heading() {
        let extraction = probe(KAHOOT_PAGE);
        let question = extraction.question.unwrap();
        assert_eq!(question.text, "What is the capital of France?");
        let texts: Vec<_> = extraction.answers.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["London", "Paris", "Berlin", "Madrid"]);
        assert_eq!(extraction.answers[1].handle.index, 1);
    }

    #[test]
    fn test_falls_back_to_class_and_heading_probes() {
        let html = r#"
            <h2>Which planet is largest?</h2>
            <div class="answer-button red">Mars</div>
            <div class="answer-button blue">Jupiter</div>
        "#;
        let extraction = probe(html);
        assert_eq!(extraction.question.unwrap().text, "Which planet is largest?");
        assert_eq!(extraction.answers.len(), 2);
        assert_eq!(extraction.answers[0].handle.selector, "[class*=\"answer-button\"]");
    }

    #[test]
    fn test_boilerplate_and_short_text_rejected() {
        let html = r#"
            <h1>12 players</h1>
            <h1>Hi</h1>
            <h2>Waiting for host</h2>
        "#;
        assert!(probe(html).question.is_none());
    }

    #[test]
    fn test_single_option_is_not_actionable() {
        let html = r#"
            <h1>Is the sky blue?</h1>
            <button data-functional-selector="answer-0">Yes</button>
        "#;
        let extraction = probe(html);
        assert!(extraction.question.is_some());
        assert!(extraction.answers.is_empty());
    }

    #[test]
    fn test_empty_option_keeps_arena_index() {
        let html = r#"
            <button data-functional-selector="answer-0"> </button>
            <button data-functional-selector="answer-1">Venus</button>
            <button data-functional-selector="answer-2">Saturn</button>
        "#;
        let answers = probe(html).answers;
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].handle.index, 1);
        assert_eq!(option_text_at(html, answers[1].handle).as_deref(), Some("Saturn"));
    }

    #[test]
    fn test_question_artifacts_removed() {
        assert_eq!(
            clean_question_text("  Who | wrote\n Hamlet?* "),
            "Who wrote Hamlet?"
        );
    }

    #[test]
    fn test_strip_enumerator() {
        assert_eq!(strip_enumerator("A) Paris"), "Paris");
        assert_eq!(strip_enumerator("2. Rome"), "Rome");
        assert_eq!(strip_enumerator("Apple"), "Apple");
        assert_eq!(strip_enumerator("A."), "A.");
    }
}
