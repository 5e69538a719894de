use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::page::types::OptionHandle;
use crate::resolve::{ResolutionResult, ResolutionSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// Fire-and-forget user feedback.
pub trait Reporter: Send + Sync {
    fn report(&self, message: &str, severity: Severity);
}

/// Page-native activation of one option.
pub trait Selector: Send + Sync {
    fn select(&self, handle: OptionHandle);
}

#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub auto_act: bool,
    pub threshold: f32,
}

/// What the executor did with a result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Answer reported, auto-act disabled.
    Reported,
    Selected { index: usize },
    Suppressed { confidence: f32, threshold: f32 },
    NoResolution,
}

pub struct ActionExecutor {
    reporter: Arc<dyn Reporter>,
    selector: Arc<dyn Selector>,
    /// Pause before selecting, to keep a human pace.
    delay: Duration,
}

impl ActionExecutor {
    pub fn new(reporter: Arc<dyn Reporter>, selector: Arc<dyn Selector>, delay: Duration) -> Self {
        Self {
            reporter,
            selector,
            delay,
        }
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    /// Report the result and, if policy allows, select it.
    pub async fn act(&self, result: &ResolutionResult, policy: Policy) -> Outcome {
        let Some(answer) = &result.answer else {
            self.reporter
                .report("No answer could be resolved for this question", Severity::Warning);
            return Outcome::NoResolution;
        };

        self.reporter.report(
            &format!(
                "Answer: {} (confidence {:.2}, via {})",
                answer.text,
                result.confidence,
                source_label(result.source)
            ),
            Severity::Info,
        );

        if !policy.auto_act {
            return Outcome::Reported;
        }

        if result.confidence < policy.threshold {
            self.reporter.report(
                &format!(
                    "Auto-select suppressed: confidence {:.2} is below threshold {:.2}",
                    result.confidence, policy.threshold
                ),
                Severity::Warning,
            );
            return Outcome::Suppressed {
                confidence: result.confidence,
                threshold: policy.threshold,
            };
        }

        if !self.delay.is_zero() {
            debug!(delay_ms = self.delay.as_millis() as u64, "pausing before select");
            tokio::time::sleep(self.delay).await;
        }
        self.selector.select(answer.handle);
        self.reporter
            .report(&format!("Selected: {}", answer.text), Severity::Success);
        Outcome::Selected {
            index: answer.handle.index,
        }
    }
}

fn source_label(source: ResolutionSource) -> &'static str {
    match source {
        ResolutionSource::Knowledge => "knowledge base",
        ResolutionSource::Search => "search",
        ResolutionSource::None => "none",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::types::AnswerOption;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        reports: Mutex<Vec<(String, Severity)>>,
        selected: Mutex<Vec<OptionHandle>>,
    }

    impl Reporter for Recorder {
        fn report(&self, message: &str, severity: Severity) {
            self.reports.lock().unwrap().push((message.to_string(), severity));
        }
    }

    impl Selector for Recorder {
        fn select(&self, handle: OptionHandle) {
            self.selected.lock().unwrap().push(handle);
        }
    }

    fn executor() -> (ActionExecutor, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let executor = ActionExecutor::new(recorder.clone(), recorder.clone(), Duration::ZERO);
        (executor, recorder)
    }

    fn result(confidence: f32) -> ResolutionResult {
        ResolutionResult {
            answer: Some(AnswerOption {
                text: "four".to_string(),
                handle: OptionHandle {
                    selector: "button",
                    index: 1,
                },
            }),
            confidence,
            source: ResolutionSource::Knowledge,
        }
    }

    const AUTO: Policy = Policy {
        auto_act: true,
        threshold: 0.7,
    };

    #[tokio::test]
    async fn test_below_threshold_is_suppressed() {
        let (executor, recorder) = executor();
        let outcome = executor.act(&result(0.69), AUTO).await;

        assert!(matches!(outcome, Outcome::Suppressed { .. }));
        assert!(recorder.selected.lock().unwrap().is_empty());
        let reports = recorder.reports.lock().unwrap();
        assert!(reports.iter().any(|(m, s)| m.contains("suppressed") && *s == Severity::Warning));
        assert!(reports[0].0.contains("four"));
    }

    #[tokio::test]
    async fn test_at_threshold_selects_once() {
        let (executor, recorder) = executor();
        let outcome = executor.act(&result(0.70), AUTO).await;

        assert_eq!(outcome, Outcome::Selected { index: 1 });
        let selected = recorder.selected.lock().unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].index, 1);
    }

    #[tokio::test]
    async fn test_report_only_when_auto_act_disabled() {
        let (executor, recorder) = executor();
        let policy = Policy {
            auto_act: false,
            threshold: 0.1,
        };
        let outcome = executor.act(&result(0.99), policy).await;

        assert_eq!(outcome, Outcome::Reported);
        assert!(recorder.selected.lock().unwrap().is_empty());
        assert_eq!(recorder.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_resolution_reported_not_acted() {
        let (executor, recorder) = executor();
        let outcome = executor.act(&ResolutionResult::none(), AUTO).await;

        assert_eq!(outcome, Outcome::NoResolution);
        assert!(recorder.selected.lock().unwrap().is_empty());
        assert_eq!(recorder.reports.lock().unwrap()[0].1, Severity::Warning);
    }
}
