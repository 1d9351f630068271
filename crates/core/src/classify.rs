//! Turns extracted page feedback into typed messages and an overall verdict.

use serde::{Deserialize, Serialize};

/// Severity of one feedback message, derived from the element's CSS classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
	Success,
	Error,
	Warning,
	Info,
}

/// One piece of page-rendered feedback in extraction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackMessage {
	pub text: String,
	#[serde(rename = "type")]
	pub kind: MessageKind,
}

/// The submission verdict plus the full ordered message sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
	pub success: bool,
	pub messages: Vec<FeedbackMessage>,
}

impl SubmissionOutcome {
	/// A failed outcome with no messages, used when a submission step faults
	/// before any feedback can be read.
	pub fn failed() -> Self {
		Self {
			success: false,
			messages: Vec::new(),
		}
	}
}

/// Raw text and class attribute of one feedback element, as read off the page.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeedback {
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub classes: String,
}

/// CSS class markers distinguishing message kinds on the target site.
#[derive(Debug, Clone)]
pub struct FeedbackClasses {
	pub error: String,
	pub warning: String,
	pub status: String,
}

/// Classifies extracted feedback elements into a [`SubmissionOutcome`].
///
/// Text is trimmed and empty results dropped; kind precedence is
/// error, then warning, then status (success), else info. The verdict is
/// "any success wins": one success message makes the whole submission
/// successful even alongside errors for other entrants on the page.
pub fn classify(raw: Vec<RawFeedback>, classes: &FeedbackClasses) -> SubmissionOutcome {
	let messages: Vec<FeedbackMessage> = raw
		.into_iter()
		.filter_map(|element| {
			let text = element.text.trim();
			if text.is_empty() {
				return None;
			}
			let kind = if element.classes.contains(&classes.error) {
				MessageKind::Error
			} else if element.classes.contains(&classes.warning) {
				MessageKind::Warning
			} else if element.classes.contains(&classes.status) {
				MessageKind::Success
			} else {
				MessageKind::Info
			};
			Some(FeedbackMessage {
				text: text.to_string(),
				kind,
			})
		})
		.collect();

	SubmissionOutcome {
		success: messages.iter().any(|m| m.kind == MessageKind::Success),
		messages,
	}
}
