mod test_utils;

use actix_web::test::TestRequest;
use portfolio_contact::{
    entities::fingerprint::{ClientEnvironment, EnvironmentProbe, NoopProbe, SessionFingerprint, StaticProbe},
    utils::request_probe::RequestProbe,
};
use test_utils::*;

#[test]
fn fingerprint_is_stable_hex_of_fixed_length() {
    let first = fingerprint();
    let second = fingerprint();

    assert_eq!(first, second);
    assert_eq!(first.as_str().len(), 32);
    assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn any_attribute_changes_the_fingerprint() {
    let env = ClientEnvironment { timezone: "UTC".into(), ..ClientEnvironment::default() };

    assert_ne!(
        SessionFingerprint::from_probe(&StaticProbe(env)),
        SessionFingerprint::from_probe(&NoopProbe)
    );
}

#[test]
fn request_headers_win_over_reported_attributes() {
    let req = TestRequest::default()
        .insert_header(("User-Agent", "Mozilla/5.0 (Macintosh)"))
        .insert_header(("Accept-Language", "de-DE,de;q=0.9,en;q=0.8"))
        .insert_header(("sec-ch-ua-platform", "\"macOS\""))
        .to_http_request();
    let reported = ClientEnvironment {
        user_agent: "spoofed".into(),
        screen_resolution: "2560x1440".into(),
        timezone: "Europe/Berlin".into(),
        ..ClientEnvironment::default()
    };

    let env = RequestProbe::new(&req, Some(reported)).probe();

    assert_eq!(env.user_agent, "Mozilla/5.0 (Macintosh)");
    assert_eq!(env.language, "de-DE");
    assert_eq!(env.platform, "macOS");
    assert_eq!(env.screen_resolution, "2560x1440");
    assert_eq!(env.timezone, "Europe/Berlin");
}

#[test]
fn reported_attributes_fill_missing_headers() {
    let req = TestRequest::default().to_http_request();
    let reported = ClientEnvironment { language: "fr-FR".into(), ..ClientEnvironment::default() };

    let env = RequestProbe::new(&req, Some(reported)).probe();

    assert_eq!(env.language, "fr-FR");
    assert_eq!(env.user_agent, "");
}
