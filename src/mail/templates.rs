use askama::Template;
use url::Url;

use super::{EmailError, EmailMessage};

const RESET_PATH: &str = "reset-password";
const RESET_SUBJECT: &str = "Reset your password";

#[derive(Template)]
#[template(path = "email/password_reset.html")]
pub struct PasswordResetEmail<'a> {
    pub recipient_name: &'a str,
    pub product_name: &'a str,
    pub reset_link: &'a str,
    pub valid_minutes: i64,
}

impl PasswordResetEmail<'_> {
    pub fn into_message(self, to: &str) -> Result<EmailMessage, EmailError> {
        Ok(EmailMessage {
            to: to.to_string(),
            subject: RESET_SUBJECT.to_string(),
            html: self.render()?,
        })
    }
}

/// `{frontend}/reset-password?code=..&email=..` with both values query-encoded.
pub fn reset_link(frontend_url: &str, code: &str, email: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(frontend_url)?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
        segments.pop_if_empty().push(RESET_PATH);
    }
    url.query_pairs_mut()
        .append_pair("code", code)
        .append_pair("email", email);
    Ok(url.into())
}
