use actix_web::{http::header, HttpRequest};

use crate::entities::fingerprint::{ClientEnvironment, EnvironmentProbe};

/// Reads the client environment from request headers, letting attributes the
/// browser reported itself (screen, timezone, canvas) fill in what headers can't say.
pub struct RequestProbe<'a> {
    req: &'a HttpRequest,
    reported: ClientEnvironment,
}

impl<'a> RequestProbe<'a> {
    pub fn new(req: &'a HttpRequest, reported: Option<ClientEnvironment>) -> Self {
        RequestProbe { req, reported: reported.unwrap_or_default() }
    }

    fn header(&self, name: impl header::AsHeaderName) -> Option<String> {
        self.req
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim_matches('"').to_string())
    }
}

impl EnvironmentProbe for RequestProbe<'_> {
    fn probe(&self) -> ClientEnvironment {
        let reported = self.reported.clone();
        ClientEnvironment {
            user_agent: self.header(header::USER_AGENT).unwrap_or(reported.user_agent),
            language: self
                .header(header::ACCEPT_LANGUAGE)
                .and_then(|l| l.split(',').next().map(|s| s.trim().to_string()))
                .unwrap_or(reported.language),
            platform: self.header("sec-ch-ua-platform").unwrap_or(reported.platform),
            screen_resolution: reported.screen_resolution,
            timezone: reported.timezone,
            canvas: reported.canvas,
        }
    }
}
