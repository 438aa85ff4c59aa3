//! Built-in email templates.
//!
//! Each template renders a subject, a plain-text body and an HTML body from
//! a JSON payload. Payload keys are camelCase (`activationToken`, `userID`).

use serde_json::Value;

use crate::mailer::MailError;

/// Identifier of a built-in template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Sent right after registration, carries the first activation token.
    UserWelcome,
    /// Sent when a user asks for a fresh activation token.
    TokenActivation,
}

/// A fully rendered message, ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

impl Template {
    pub fn id(self) -> &'static str {
        match self {
            Template::UserWelcome => "user_welcome",
            Template::TokenActivation => "token_activation",
        }
    }

    /// Render against `payload`. Every template requires `activationToken`.
    pub fn render(self, payload: &Value) -> Result<RenderedMail, MailError> {
        let token = required_str(self, payload, "activationToken")?;
        let activation_json = format!("{{\"token\": \"{token}\"}}");

        let rendered = match self {
            Template::UserWelcome => {
                let user_id = payload
                    .get("userID")
                    .map(|v| v.to_string())
                    .ok_or(MailError::MissingField {
                        template: self.id(),
                        field: "userID",
                    })?;

                RenderedMail {
                    subject: "Welcome to Marquee!".to_string(),
                    plain_body: format!(
                        "Hi,\n\n\
                         Thanks for signing up for a Marquee account. We're excited to have you on board!\n\n\
                         For future reference, your user ID number is {user_id}.\n\n\
                         Please send a request to the `PUT /v1/users/activated` endpoint with the \
                         following JSON body to activate your account:\n\n\
                         {activation_json}\n\n\
                         Please note that this is a one-time use token and it will expire in 3 days.\n\n\
                         Thanks,\n\nThe Marquee Team\n"
                    ),
                    html_body: format!(
                        "<!doctype html>\n<html>\n<body>\n\
                         <p>Hi,</p>\n\
                         <p>Thanks for signing up for a Marquee account. We're excited to have you on board!</p>\n\
                         <p>For future reference, your user ID number is {user_id}.</p>\n\
                         <p>Please send a request to the <code>PUT /v1/users/activated</code> endpoint \
                         with the following JSON body to activate your account:</p>\n\
                         <pre><code>{activation_json}</code></pre>\n\
                         <p>Please note that this is a one-time use token and it will expire in 3 days.</p>\n\
                         <p>Thanks,</p>\n<p>The Marquee Team</p>\n\
                         </body>\n</html>\n"
                    ),
                }
            }
            Template::TokenActivation => RenderedMail {
                subject: "Activate your Marquee account".to_string(),
                plain_body: format!(
                    "Hi,\n\n\
                     Please send a `PUT /v1/users/activated` request with the following JSON body \
                     to activate your account:\n\n\
                     {activation_json}\n\n\
                     Please note that this is a one-time use token and it will expire in 3 days.\n\n\
                     Thanks,\n\nThe Marquee Team\n"
                ),
                html_body: format!(
                    "<!doctype html>\n<html>\n<body>\n\
                     <p>Hi,</p>\n\
                     <p>Please send a <code>PUT /v1/users/activated</code> request with the \
                     following JSON body to activate your account:</p>\n\
                     <pre><code>{activation_json}</code></pre>\n\
                     <p>Please note that this is a one-time use token and it will expire in 3 days.</p>\n\
                     <p>Thanks,</p>\n<p>The Marquee Team</p>\n\
                     </body>\n</html>\n"
                ),
            },
        };

        Ok(rendered)
    }
}

fn required_str<'a>(
    template: Template,
    payload: &'a Value,
    field: &'static str,
) -> Result<&'a str, MailError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or(MailError::MissingField {
            template: template.id(),
            field,
        })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_match_mail_identifiers() {
        assert_eq!(Template::UserWelcome.id(), "user_welcome");
        assert_eq!(Template::TokenActivation.id(), "token_activation");
    }

    #[test]
    fn welcome_includes_token_and_user_id() {
        let payload = json!({ "activationToken": "ABCDEFGHIJKLMNOPQRSTUVWXYZ", "userID": 42 });
        let mail = Template::UserWelcome.render(&payload).unwrap();

        assert_eq!(mail.subject, "Welcome to Marquee!");
        assert!(mail.plain_body.contains("ABCDEFGHIJKLMNOPQRSTUVWXYZ"));
        assert!(mail.plain_body.contains("user ID number is 42"));
        assert!(mail.html_body.contains("ABCDEFGHIJKLMNOPQRSTUVWXYZ"));
        assert!(mail.html_body.starts_with("<!doctype html>"));
    }

    #[test]
    fn activation_needs_only_the_token() {
        let payload = json!({ "activationToken": "ABCDEFGHIJKLMNOPQRSTUVWXYZ" });
        let mail = Template::TokenActivation.render(&payload).unwrap();
        assert!(mail.plain_body.contains("{\"token\": \"ABCDEFGHIJKLMNOPQRSTUVWXYZ\"}"));
    }

    #[test]
    fn missing_fields_are_reported() {
        assert_matches!(
            Template::TokenActivation.render(&json!({})),
            Err(MailError::MissingField { field: "activationToken", .. })
        );
        assert_matches!(
            Template::UserWelcome.render(&json!({ "activationToken": "X" })),
            Err(MailError::MissingField { field: "userID", .. })
        );
    }
}
