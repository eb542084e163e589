use dashmap::DashMap;
use http::StatusCode;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use tracing::warn;

use crate::dispatcher::HandlerResponse;

/// Distinct header lines interned for the life of the process
pub const MAX_INTERNED_HEADER_LINES: usize = 4096;

/// Longest `name: value` line that is interned
pub const MAX_HEADER_LINE_LEN: usize = 2048;

/// Header slots in a `may_minihttp` response
pub const MAX_RESPONSE_HEADERS: usize = 16;

type HeaderLineVec = SmallVec<[&'static str; MAX_RESPONSE_HEADERS]>;

/// Interned `name: value` header lines
///
/// `may_minihttp` only accepts `&'static str` header lines, so each distinct
/// line is leaked once and shared afterwards. Once `capacity` lines are held,
/// unseen lines are refused rather than leaked.
pub(crate) struct HeaderLines {
    lines: DashMap<String, &'static str>,
    capacity: usize,
}

impl HeaderLines {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: DashMap::new(),
            capacity,
        }
    }

    /// The shared line for `name: value`, or `None` when it cannot be interned
    pub(crate) fn intern(&self, name: &str, value: &str) -> Option<&'static str> {
        let line = format!("{name}: {value}");
        if line.len() > MAX_HEADER_LINE_LEN {
            return None;
        }
        if let Some(existing) = self.lines.get(&line) {
            return Some(*existing);
        }
        // Concurrent inserts may overshoot by one line per writer
        if self.lines.len() >= self.capacity {
            return None;
        }
        Some(
            *self
                .lines
                .entry(line.clone())
                .or_insert_with(|| Box::leak(line.into_boxed_str())),
        )
    }
}

static HEADER_LINES: Lazy<HeaderLines> =
    Lazy::new(|| HeaderLines::with_capacity(MAX_INTERNED_HEADER_LINES));

/// A redirect whose `Location` line could not be interned
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct UnwritableLocation;

pub(crate) fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Header lines to send for `hres`
///
/// Headers with CR or LF, headers that cannot be interned and headers past
/// the slot limit are dropped. A `Location` that cannot be interned fails the
/// whole response.
pub(crate) fn header_lines(
    table: &HeaderLines,
    hres: &HandlerResponse,
) -> Result<HeaderLineVec, UnwritableLocation> {
    let mut lines = HeaderLineVec::new();
    for (name, value) in &hres.headers {
        if value.contains(['\r', '\n']) || name.contains(['\r', '\n', ':']) {
            warn!(header = %name, "Dropping header with invalid characters");
            continue;
        }
        if lines.len() == MAX_RESPONSE_HEADERS {
            warn!(header = %name, "Response header slots exhausted, dropping header");
            continue;
        }
        match table.intern(name, value) {
            Some(line) => lines.push(line),
            None if name.eq_ignore_ascii_case("location") => return Err(UnwritableLocation),
            None => warn!(header = %name, "Header line not internable, dropping header"),
        }
    }
    Ok(lines)
}

/// Write a [`HandlerResponse`] into the `may_minihttp` response
///
/// A redirect whose target cannot be interned is answered with an empty
/// `500` instead.
pub fn write_handler_response(res: &mut Response, hres: HandlerResponse) {
    match header_lines(&HEADER_LINES, &hres) {
        Ok(lines) => {
            res.status_code(usize::from(hres.status), status_reason(hres.status));
            for line in lines {
                res.header(line);
            }
            res.body_vec(hres.body);
        }
        Err(UnwritableLocation) => {
            warn!(status = hres.status, "Redirect target not internable, answering 500");
            res.status_code(500, status_reason(500));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dispatcher::HandlerRequest;
    use crate::resolver::StaticDirectory;
    use crate::Service;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(303), "See Other");
        assert_eq!(status_reason(400), "Bad Request");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(405), "Method Not Allowed");
        assert_eq!(status_reason(500), "Internal Server Error");
        assert_eq!(status_reason(599), "Unknown");
    }

    #[test]
    fn test_header_lines_are_shared() {
        let table = HeaderLines::with_capacity(8);
        let a = table.intern("Cache-Control", "no-cache").unwrap();
        let b = table.intern("Cache-Control", "no-cache").unwrap();
        assert_eq!(a, "Cache-Control: no-cache");
        assert!(std::ptr::eq(a, b));
        assert_eq!(table.lines.len(), 1);
    }

    #[test]
    fn test_overlong_line_refused() {
        let table = HeaderLines::with_capacity(8);
        assert_eq!(table.intern("x-long", &"a".repeat(MAX_HEADER_LINE_LEN)), None);
        assert_eq!(table.lines.len(), 0);
    }

    #[test]
    fn test_distinct_redirects_stop_at_capacity() {
        let table = HeaderLines::with_capacity(MAX_INTERNED_HEADER_LINES);
        let service = Service::new(Arc::new(StaticDirectory::default()));

        let redirect = |i: usize| {
            service.serve(HandlerRequest::get(&format!(
                "http://wf.example/.well-known/webfinger?resource=acct:u{i}@wf.example"
            )))
        };

        let (mut written, mut refused) = (0, 0);
        for i in 0..MAX_INTERNED_HEADER_LINES + 1000 {
            let res = redirect(i);
            assert_eq!(res.status, 303);
            match header_lines(&table, &res) {
                Ok(lines) => {
                    assert_eq!(lines.len(), res.headers.len());
                    written += 1;
                }
                Err(UnwritableLocation) => refused += 1,
            }
        }
        // Three middleware lines share the table with the Location lines
        assert_eq!(written, MAX_INTERNED_HEADER_LINES - 3);
        assert_eq!(refused, 1003);
        assert_eq!(table.lines.len(), MAX_INTERNED_HEADER_LINES);

        // Repeating a refused redirect neither interns nor leaks it
        let last = redirect(MAX_INTERNED_HEADER_LINES + 999);
        assert_eq!(header_lines(&table, &last), Err(UnwritableLocation));
        assert_eq!(header_lines(&table, &last), Err(UnwritableLocation));
        assert_eq!(table.lines.len(), MAX_INTERNED_HEADER_LINES);

        // Earlier redirects and fixed lines keep their shared lines
        let first = redirect(0);
        let again = header_lines(&table, &first).unwrap();
        let once_more = header_lines(&table, &first).unwrap();
        assert!(again.iter().zip(&once_more).all(|(a, b)| std::ptr::eq(*a, *b)));

        let not_found = service.serve(HandlerRequest::get("/other"));
        assert_eq!(header_lines(&table, &not_found).unwrap().len(), 0);
    }

    #[test]
    fn test_unwritable_non_location_header_is_dropped() {
        let table = HeaderLines::with_capacity(1);
        let mut res = HandlerResponse::default();
        res.set_header("cache-control", "no-cache".to_string());
        res.set_header("access-control-allow-origin", "https://a.example".to_string());
        let lines = header_lines(&table, &res).unwrap();
        assert_eq!(lines.as_slice(), ["cache-control: no-cache"]);
    }

    #[test]
    fn test_header_slots_are_bounded() {
        let table = HeaderLines::with_capacity(64);
        let mut res = HandlerResponse::default();
        for i in 0..MAX_RESPONSE_HEADERS + 4 {
            res.set_header(&format!("x-h{i}"), i.to_string());
        }
        assert_eq!(header_lines(&table, &res).unwrap().len(), MAX_RESPONSE_HEADERS);
    }
}
