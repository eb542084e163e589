//! End-to-end tests of the WebFinger state machine through `Service::serve`
//!
//! The scenario table follows RFC 7033 §4.2: path routing, method and
//! parameter checks, relation filtering, the https redirect, `Accept`
//! handling and unknown accounts.

mod common;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use common::{default_headers, headers_of, plus_header, DummyResolver};
use http::Method;
use webfinger_service::error::error_from;
use webfinger_service::resolver::{Resolver, UserNotFound};
use webfinger_service::resource::{Link, Rel, Resource};
use webfinger_service::{HandlerRequest, HandlerResponse, Service, WebFingerError};

const ALL_LINKS: &str = r#"{"links":[{"href":"x","ref":"x"},{"href":"y","ref":"y"},{"href":"z","ref":"z"}]}"#;

struct Scenario {
    description: &'static str,
    request: HandlerRequest,
    status: u16,
    headers: BTreeMap<String, String>,
    body: &'static str,
}

fn tls(method: Method, query: &str) -> HandlerRequest {
    target(method, "https", "/.well-known/webfinger", query).with_tls(true)
}

fn target(method: Method, scheme: &str, path: &str, query: &str) -> HandlerRequest {
    let mut url = format!("{scheme}://localhost{path}");
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }
    HandlerRequest::new(method, &url)
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            description: "GET root URL returns 404 with no headers",
            request: target(Method::GET, "https", "/", "").with_tls(true),
            status: 404,
            headers: BTreeMap::new(),
            body: "",
        },
        Scenario {
            description: "POST root URL returns 404 with no headers",
            request: target(Method::POST, "https", "/", "").with_tls(true),
            status: 404,
            headers: BTreeMap::new(),
            body: "",
        },
        Scenario {
            description: "GET /.well-known returns 404 with no headers",
            request: target(Method::GET, "https", "/.well-known", "").with_tls(true),
            status: 404,
            headers: BTreeMap::new(),
            body: "",
        },
        Scenario {
            description: "POST /.well-known returns 404 with no headers",
            request: target(Method::POST, "https", "/.well-known", "").with_tls(true),
            status: 404,
            headers: BTreeMap::new(),
            body: "",
        },
        Scenario {
            description: "GET resource returns the JRD with default headers",
            request: tls(Method::GET, "resource=acct:hello@domain"),
            status: 200,
            headers: default_headers(),
            body: ALL_LINKS,
        },
        Scenario {
            description: "POST to the WebFinger path is not allowed",
            request: tls(Method::POST, ""),
            status: 405,
            headers: default_headers(),
            body: "",
        },
        Scenario {
            description: "Repeated resource parameters are a bad request",
            request: tls(
                Method::GET,
                "resource=acct:hello@domain&resource=acct:hello2@domain",
            ),
            status: 400,
            headers: default_headers(),
            body: "",
        },
        Scenario {
            description: "rel parameters filter the links",
            request: tls(Method::GET, "resource=acct:hello@domain&rel=x&rel=y"),
            status: 200,
            headers: default_headers(),
            body: r#"{"links":[{"href":"x","ref":"x"},{"href":"y","ref":"y"}]}"#,
        },
        Scenario {
            description: "Plain HTTP is redirected to https",
            request: target(
                Method::GET,
                "http",
                "/.well-known/webfinger",
                "resource=acct:hello@domain",
            ),
            status: 303,
            headers: plus_header(
                default_headers(),
                "Location",
                "https://localhost/.well-known/webfinger?resource=acct:hello@domain",
            ),
            body: "",
        },
        Scenario {
            description: "Accept header is ignored",
            request: tls(Method::GET, "resource=acct:hello@domain")
                .with_header("Accept", "application/json"),
            status: 200,
            headers: default_headers(),
            body: ALL_LINKS,
        },
        Scenario {
            description: "Unknown user returns 404",
            request: tls(Method::GET, "resource=acct:missinguser@domain"),
            status: 404,
            headers: default_headers(),
            body: "",
        },
        Scenario {
            description: "Missing resource is a bad request",
            request: tls(Method::GET, ""),
            status: 400,
            headers: default_headers(),
            body: "",
        },
        Scenario {
            description: "Non-URI resource is a bad request",
            request: tls(Method::GET, "resource=hello-world"),
            status: 400,
            headers: default_headers(),
            body: "",
        },
        Scenario {
            description: "http resource URI is a bad request",
            request: tls(Method::GET, "resource=http://hello-world"),
            status: 400,
            headers: default_headers(),
            body: "",
        },
    ]
}

#[test]
fn test_protocol_scenarios() {
    let service = Service::new(Arc::new(DummyResolver));
    let mut failures = Vec::new();

    for sc in scenarios() {
        let res = service.serve(sc.request);
        let body = res.body_text();
        let ok = res.status == sc.status
            && headers_of(&res) == sc.headers
            && body.trim() == sc.body;
        if !ok {
            failures.push(format!(
                "{}\n\tgot      {} {:?} {:?}\n\texpected {} {:?} {:?}",
                sc.description,
                res.status,
                headers_of(&res),
                body.trim(),
                sc.status,
                sc.headers,
                sc.body
            ));
        }
    }

    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn test_body_ends_with_newline() {
    let service = Service::new(Arc::new(DummyResolver));
    let res = service.serve(tls(Method::GET, "resource=acct:hello@domain"));
    assert_eq!(res.body_text(), format!("{ALL_LINKS}\n"));
}

#[test]
fn test_resolver_sees_rels_in_order_with_duplicates() {
    struct Recording(Mutex<Vec<Vec<String>>>);

    impl Resolver for Recording {
        fn find_user(&self, _: &str, _: &str, rels: &[Rel]) -> anyhow::Result<Resource> {
            self.0
                .lock()
                .unwrap()
                .push(rels.iter().map(|r| r.as_str().to_owned()).collect());
            Ok(Resource::default())
        }

        fn dummy_user(&self, _: &str, _: &str, _: &[Rel]) -> anyhow::Result<Resource> {
            Err(UserNotFound.into())
        }
    }

    let resolver = Arc::new(Recording(Mutex::new(Vec::new())));
    let service = Service::new(Arc::clone(&resolver) as Arc<dyn Resolver>);
    let res = service.serve(tls(Method::GET, "resource=acct:a@b&rel=y&rel=x&rel=y"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text().trim(), r#"{"links":[]}"#);
    assert_eq!(*resolver.0.lock().unwrap(), vec![vec!["y", "x", "y"]]);
}

/// Unknown users get a dummy resource indistinguishable from a real one
struct Masking;

impl Resolver for Masking {
    fn find_user(&self, username: &str, hostname: &str, _: &[Rel]) -> anyhow::Result<Resource> {
        if username == "real" {
            return Ok(profile(username, hostname));
        }
        Err(anyhow::Error::new(UserNotFound).context("directory lookup"))
    }

    fn dummy_user(&self, username: &str, hostname: &str, _: &[Rel]) -> anyhow::Result<Resource> {
        Ok(profile(username, hostname))
    }
}

fn profile(username: &str, hostname: &str) -> Resource {
    Resource {
        subject: Some(format!("acct:{username}@{hostname}")),
        links: vec![
            Link::new("profile", format!("https://{hostname}/@{username}")).with_type("text/html"),
            Link::new("avatar", format!("https://{hostname}/@{username}.png")),
        ],
        ..Resource::default()
    }
}

#[test]
fn test_dummy_user_masks_unknown_accounts() {
    let service = Service::new(Arc::new(Masking));
    let real = service.serve(tls(Method::GET, "resource=acct:real@example.com&rel=profile"));
    let fake = service.serve(tls(Method::GET, "resource=acct:fake@example.com&rel=profile"));

    assert_eq!(real.status, 200);
    assert_eq!(fake.status, 200);
    assert_eq!(headers_of(&real), headers_of(&fake));

    let real: serde_json::Value = serde_json::from_slice(&real.body).unwrap();
    let fake: serde_json::Value = serde_json::from_slice(&fake.body).unwrap();
    assert_eq!(real["links"].as_array().unwrap().len(), 1);
    assert_eq!(fake["links"].as_array().unwrap().len(), 1);
    assert_eq!(fake["subject"], "acct:fake@example.com");
    assert_eq!(fake["links"][0]["type"], "text/html");
}

struct Broken {
    fail_dummy_only: bool,
}

impl Resolver for Broken {
    fn find_user(&self, _: &str, _: &str, _: &[Rel]) -> anyhow::Result<Resource> {
        if self.fail_dummy_only {
            Err(UserNotFound.into())
        } else {
            Err(anyhow::anyhow!("database unavailable"))
        }
    }

    fn dummy_user(&self, _: &str, _: &str, _: &[Rel]) -> anyhow::Result<Resource> {
        Err(anyhow::anyhow!("dummy generator unavailable"))
    }
}

fn capturing_error_handler(service: &mut Service) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    service.error_handler = Arc::new(move |req: &HandlerRequest, res: &mut HandlerResponse| {
        if let Some(err) = error_from(req) {
            sink.lock().unwrap().push(err.to_string());
        }
        res.status = 500;
    });
    seen
}

#[test]
fn test_resolver_failure_goes_to_error_handler() {
    let mut service = Service::new(Arc::new(Broken {
        fail_dummy_only: false,
    }));
    let seen = capturing_error_handler(&mut service);

    let res = service.serve(tls(Method::GET, "resource=acct:a@b"));
    assert_eq!(res.status, 500);
    assert!(res.body.is_empty());
    assert_eq!(headers_of(&res), default_headers());
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("database unavailable"), "{}", seen[0]);
}

#[test]
fn test_dummy_failure_goes_to_error_handler() {
    let mut service = Service::new(Arc::new(Broken {
        fail_dummy_only: true,
    }));
    let seen = capturing_error_handler(&mut service);

    let res = service.serve(tls(Method::GET, "resource=acct:a@b"));
    assert_eq!(res.status, 500);
    assert!(seen.lock().unwrap()[0].contains("dummy generator unavailable"));
}

#[test]
fn test_malformed_handler_receives_cause() {
    let mut service = Service::new(Arc::new(DummyResolver));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    service.malformed_request_handler =
        Arc::new(move |req: &HandlerRequest, res: &mut HandlerResponse| {
            let kind = match error_from(req) {
                Some(WebFingerError::NotAnAccount) => "not-an-account",
                Some(WebFingerError::NoDomain) => "no-domain",
                Some(WebFingerError::MalformedResource) => "malformed",
                _ => "other",
            };
            sink.lock().unwrap().push(kind);
            res.status = 400;
        });

    for query in [
        "resource=http://hello-world",
        "resource=acct:nodomain",
        "",
        "resource=acct:a@b&resource=acct:c@d",
    ] {
        assert_eq!(service.serve(tls(Method::GET, query)).status, 400);
    }
    assert_eq!(
        *seen.lock().unwrap(),
        ["not-an-account", "no-domain", "malformed", "malformed"]
    );
}

#[test]
fn test_not_found_handler_receives_cause() {
    let mut service = Service::new(Arc::new(DummyResolver));
    service.not_found_handler = Arc::new(|req: &HandlerRequest, res: &mut HandlerResponse| {
        res.status = if matches!(error_from(req), Some(WebFingerError::NotFound)) {
            404
        } else {
            410
        };
    });

    // Unknown account: the cause is recorded
    let res = service.serve(tls(Method::GET, "resource=acct:missing@domain"));
    assert_eq!(res.status, 404);

    // Unmatched path: no cause
    let res = service.serve(target(Method::GET, "https", "/nope", "").with_tls(true));
    assert_eq!(res.status, 410);
}

#[test]
fn test_custom_handler_leaves_other_defaults() {
    let mut service = Service::new(Arc::new(DummyResolver));
    service.method_not_supported_handler =
        Arc::new(|_: &HandlerRequest, res: &mut HandlerResponse| {
            res.set_header("allow", "GET".to_string());
            res.status = 405;
        });

    let res = service.serve(tls(Method::PUT, "resource=acct:hello@domain"));
    assert_eq!(res.status, 405);
    assert_eq!(res.get_header("allow"), Some("GET"));

    let res = service.serve(tls(Method::GET, ""));
    assert_eq!(res.status, 400);
    assert_eq!(res.get_header("allow"), None);
}

#[test]
fn test_plain_http_allowed_without_no_tls_handler() {
    let mut service = Service::new(Arc::new(DummyResolver));
    service.no_tls_handler = None;
    let res = service.serve(target(
        Method::GET,
        "http",
        "/.well-known/webfinger",
        "resource=acct:hello@domain",
    ));
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text().trim(), ALL_LINKS);
}

#[test]
fn test_redirect_checked_before_method() {
    let service = Service::new(Arc::new(DummyResolver));
    let res = service.serve(target(Method::POST, "http", "/.well-known/webfinger", ""));
    assert_eq!(res.status, 303);
    assert_eq!(
        res.get_header("location"),
        Some("https://localhost/.well-known/webfinger")
    );
}

#[test]
fn test_percent_encoded_resource() {
    let service = Service::new(Arc::new(DummyResolver));
    let res = service.serve(tls(
        Method::GET,
        "resource=acct%3Ahello%40domain&rel=x&rel=y",
    ));
    assert_eq!(res.status, 200);
    assert_eq!(
        res.body_text().trim(),
        r#"{"links":[{"href":"x","ref":"x"},{"href":"y","ref":"y"}]}"#
    );
}
