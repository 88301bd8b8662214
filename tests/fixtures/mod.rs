// Test fixtures - reusable test data
// Provides a fake schedule server and sample dates across test files
#![allow(dead_code)]

use chrono::NaiveDate;

/// Sample dates for testing
pub mod dates {
    use super::*;

    /// Monday, June 3, 2024
    pub fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    /// The seven days starting at `monday()`
    pub fn week() -> Vec<NaiveDate> {
        (0..7).map(|i| monday() + chrono::Duration::days(i)).collect()
    }
}

/// Minimal HTTP server answering with canned JSON replies
pub mod server {
    use std::io::Read;
    use std::sync::mpsc::{self, Receiver};
    use std::thread::{self, JoinHandle};
    use tiny_http::{Header, Response, Server};

    /// What the fake server saw for one request
    #[derive(Debug)]
    pub struct Recorded {
        pub method: String,
        pub url: String,
        pub csrf: Option<String>,
        pub body: String,
    }

    pub struct Reply {
        pub status: u16,
        pub body: &'static str,
        pub set_cookie: Option<&'static str>,
    }

    pub fn reply(status: u16, body: &'static str) -> Reply {
        Reply {
            status,
            body,
            set_cookie: None,
        }
    }

    /// Serve `replies` in order, one per request, then stop.
    pub fn serve(replies: Vec<Reply>) -> (String, Receiver<Recorded>, JoinHandle<()>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            for canned in replies {
                let mut request = server.recv().unwrap();

                let mut body = String::new();
                request.as_reader().read_to_string(&mut body).unwrap();
                let csrf = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("X-CSRFToken"))
                    .map(|h| h.value.as_str().to_string());

                tx.send(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    csrf,
                    body,
                })
                .unwrap();

                let mut response = Response::from_string(canned.body)
                    .with_status_code(canned.status)
                    .with_header("Content-Type: application/json".parse::<Header>().unwrap());
                if let Some(cookie) = canned.set_cookie {
                    response = response
                        .with_header(format!("Set-Cookie: {}", cookie).parse::<Header>().unwrap());
                }
                request.respond(response).unwrap();
            }
        });

        (format!("http://127.0.0.1:{}", port), rx, handle)
    }
}
