#![allow(dead_code)]

use std::collections::BTreeMap;

use webfinger_service::resolver::{Resolver, UserNotFound};
use webfinger_service::resource::{Link, Rel, Resource};
use webfinger_service::HandlerResponse;

/// Resolver with one account, `hello`, on any host
///
/// Asking for exactly `rel=x&rel=y` returns those two links pre-filtered;
/// otherwise the three links `x`, `y`, `z` are returned.
pub struct DummyResolver;

fn link(rel: &str) -> Link {
    Link::new(rel, rel)
}

impl Resolver for DummyResolver {
    fn find_user(&self, username: &str, _hostname: &str, rels: &[Rel]) -> anyhow::Result<Resource> {
        if username != "hello" {
            return Err(UserNotFound.into());
        }
        if rels.len() == 2 && rels[0].as_str() == "x" && rels[1].as_str() == "y" {
            return Ok(Resource::with_links(vec![link("x"), link("y")]));
        }
        Ok(Resource::with_links(vec![link("x"), link("y"), link("z")]))
    }

    fn dummy_user(&self, _username: &str, _hostname: &str, _rels: &[Rel]) -> anyhow::Result<Resource> {
        Err(UserNotFound.into())
    }
}

/// Lowercased header names mapped to values
pub fn headers_of(res: &HandlerResponse) -> BTreeMap<String, String> {
    res.headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .collect()
}

/// The three headers every WebFinger response carries
pub fn default_headers() -> BTreeMap<String, String> {
    [
        ("cache-control", "no-cache"),
        ("pragma", "no-cache"),
        ("content-type", "application/jrd+json"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn plus_header(
    mut headers: BTreeMap<String, String>,
    name: &str,
    value: &str,
) -> BTreeMap<String, String> {
    headers.insert(name.to_ascii_lowercase(), value.to_string());
    headers
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Write a raw request and read until the server goes quiet
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Status, lowercased headers and body of a raw HTTP/1.1 response
    pub fn parse_response(resp: &str) -> (u16, Vec<(String, String)>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        (status, headers, body.to_string())
    }

    pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
