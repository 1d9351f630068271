//! Target-site profile: URLs, selectors, class markers, and timing.
//!
//! The default profile matches the library summer-game site the automation
//! was written for. Tests substitute their own profile; nothing else in the
//! crate hard-codes site structure.

use std::time::Duration;

use crate::classify::FeedbackClasses;

/// Everything the controller needs to know about the driven site's markup.
#[derive(Debug, Clone)]
pub struct Site {
	pub login_url: String,
	/// Path segment whose presence in the post-submit URL marks a failed
	/// login. A weak signal, kept as the site offers nothing better.
	pub login_path_segment: String,
	pub submission_url: String,
	pub username_selector: String,
	pub password_selector: String,
	pub login_submit_selector: String,
	pub code_input_selector: String,
	/// Submit-click candidates tried in order until one succeeds.
	pub submit_click_candidates: Vec<String>,
	/// Selector matching each element of the feedback region.
	pub feedback_selector: String,
	pub feedback_classes: FeedbackClasses,
	pub element_timeout: Duration,
	pub user_agent: String,
}

impl Default for Site {
	fn default() -> Self {
		Self {
			login_url: "https://aadl.org/user/login".to_string(),
			login_path_segment: "/user/login".to_string(),
			submission_url: "https://aadl.org/summergame/player/0/gamecode".to_string(),
			username_selector: r#"input[name="name"]"#.to_string(),
			password_selector: r#"input[name="pass"]"#.to_string(),
			login_submit_selector: r#"input[type="submit"]"#.to_string(),
			code_input_selector: r#"input[id="edit-code-text"]"#.to_string(),
			submit_click_candidates: vec![
				r#"input[id="edit-submit"][type="submit"]"#.to_string(),
				r#"input[value="Submit"]"#.to_string(),
			],
			feedback_selector: ".messages__wrapper .messages".to_string(),
			feedback_classes: FeedbackClasses {
				error: "messages--error".to_string(),
				warning: "messages--warning".to_string(),
				status: "messages--status".to_string(),
			},
			element_timeout: Duration::from_secs(10),
			user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
			             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
				.to_string(),
		}
	}
}
