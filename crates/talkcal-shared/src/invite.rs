//! Invite text written into the event description when a meeting is added.
//!
//! The default text is a single join sentence. Dial-in numbers, when
//! configured, add a phone block. Deployments can replace either part with
//! a template using `{BASE_URL}`, `{MEETING_ID}`, `{DIALIN_ID}` and one
//! `{<country>}` placeholder per dial-in country.

use serde::{Deserialize, Serialize};

use crate::error::InviteError;
use crate::types::{Branding, MeetingId};

/// Dial-in numbers grouped by country, in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DialInNumbers(pub Vec<(String, Vec<String>)>);

impl DialInNumbers {
    /// Parse `[["US", ["+1 555 0100"]], ["France", ["+33 1 00"]]]`.
    pub fn from_json(raw: &str) -> Result<Self, InviteError> {
        let entries: Vec<(String, Vec<String>)> =
            serde_json::from_str(raw).map_err(|e| InviteError::InvalidNumbers(e.to_string()))?;

        if let Some((country, _)) = entries.iter().find(|(_, numbers)| numbers.is_empty()) {
            return Err(InviteError::InvalidNumbers(format!(
                "country {country} has no numbers"
            )));
        }

        Ok(Self(entries))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn lines(&self) -> impl Iterator<Item = (&str, String)> {
        self.0
            .iter()
            .map(|(country, numbers)| (country.as_str(), numbers.join(",")))
    }
}

/// Builder for the description invite text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InviteTemplate {
    /// Replaces the default join sentence.
    pub text_template: Option<String>,
    /// Replaces the default dial-in block. Only used when numbers exist.
    pub numbers_template: Option<String>,
    pub numbers: DialInNumbers,
}

impl InviteTemplate {
    pub fn with_templates(
        text_template: Option<String>,
        numbers_template: Option<String>,
        numbers: DialInNumbers,
    ) -> Result<Self, InviteError> {
        let blank = |t: &Option<String>| t.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&text_template) || blank(&numbers_template) {
            return Err(InviteError::EmptyTemplate);
        }

        Ok(Self {
            text_template,
            numbers_template,
            numbers,
        })
    }

    /// Render the full invite for `id`.
    pub fn render(&self, branding: &Branding, id: &MeetingId, dial_in_id: Option<&str>) -> String {
        let join_url = branding.join_url(id);
        let mut has_template = false;

        let mut text = match &self.text_template {
            Some(template) => {
                has_template = true;
                template.clone()
            }
            None => format!(
                "Click the following link to join the meeting from your computer: {join_url}"
            ),
        };

        if !self.numbers.is_empty() {
            match &self.numbers_template {
                Some(template) => {
                    has_template = true;
                    text.push_str(template);
                    for (country, numbers) in self.numbers.lines() {
                        let placeholder = format!("{{{country}}}");
                        text = text.replacen(&placeholder, &format!("{country}: {numbers}"), 1);
                    }
                }
                None => {
                    text.push_str("\n\n=====");
                    text.push_str("\n\nJust want to dial in on your phone? ");
                    text.push_str(" \n\nCall one of the following numbers: ");
                    for (country, numbers) in self.numbers.lines() {
                        text.push_str(&format!("\n{country}: {numbers}"));
                    }
                    text.push_str(&format!(
                        "\n\nSay your conference name: '{id}' and you will be connected!"
                    ));
                }
            }
        }

        if has_template {
            text = text
                .replace("{BASE_URL}", &branding.base_url())
                .replace("{MEETING_ID}", id.as_str());
            if let Some(dial_in_id) = dial_in_id {
                text = text.replace("{DIALIN_ID}", dial_in_id);
            }
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> DialInNumbers {
        DialInNumbers::from_json(r#"[["US", ["+1 555 0100", "+1 555 0101"]], ["France", ["+33 1 00"]]]"#)
            .expect("valid numbers")
    }

    #[test]
    fn test_default_invite() {
        let invite = InviteTemplate::default();
        let text = invite.render(&Branding::default(), &MeetingId::new("QuietOtters"), None);
        assert_eq!(
            text,
            "Click the following link to join the meeting from your computer: \
             https://talk.brave.com/QuietOtters"
        );
    }

    #[test]
    fn test_default_dial_in_block() {
        let invite = InviteTemplate {
            numbers: numbers(),
            ..Default::default()
        };
        let text = invite.render(&Branding::default(), &MeetingId::new("QuietOtters"), None);

        assert!(text.contains("https://talk.brave.com/QuietOtters"));
        assert!(text.contains("\n\n====="));
        assert!(text.contains("\nUS: +1 555 0100,+1 555 0101"));
        assert!(text.contains("\nFrance: +33 1 00"));
        assert!(text.ends_with("Say your conference name: 'QuietOtters' and you will be connected!"));
    }

    #[test]
    fn test_custom_templates() {
        let invite = InviteTemplate::with_templates(
            Some("Join at {BASE_URL}{MEETING_ID}".to_string()),
            Some(" | {US} | pin {DIALIN_ID}".to_string()),
            numbers(),
        )
        .expect("templates are valid");

        let text = invite.render(&Branding::default(), &MeetingId::new("abc"), Some("4242"));
        assert_eq!(
            text,
            "Join at https://talk.brave.com/abc | US: +1 555 0100,+1 555 0101 | pin 4242"
        );
    }

    #[test]
    fn test_numbers_template_ignored_without_numbers() {
        let invite = InviteTemplate::with_templates(
            None,
            Some(" {US}".to_string()),
            DialInNumbers::default(),
        )
        .expect("templates are valid");

        let text = invite.render(&Branding::default(), &MeetingId::new("abc"), None);
        assert!(!text.contains("{US}"));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(DialInNumbers::from_json("{not json").is_err());
        assert!(DialInNumbers::from_json(r#"[["US", []]]"#).is_err());
    }

    #[test]
    fn test_blank_template_rejected() {
        let result = InviteTemplate::with_templates(Some("  ".to_string()), None, numbers());
        assert!(matches!(result, Err(InviteError::EmptyTemplate)));
    }
}
