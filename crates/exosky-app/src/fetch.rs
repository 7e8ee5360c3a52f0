//! Catalog requests run on worker threads; results come back over a channel
//! and are drained by the event loop once per frame.

use crossbeam_channel::{Receiver, Sender};
use exosky_catalog::{CatalogClient, CatalogError, PlanetRecord};
use exosky_stars::StarRecord;
use std::io;

/// Identifies one star request so superseded results can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u64);

#[derive(Debug)]
pub enum FetchResult {
    Matches {
        query: String,
        result: Result<Vec<String>, CatalogError>,
    },
    Stars {
        id: RequestId,
        planet: String,
        result: Result<Vec<StarRecord>, CatalogError>,
        /// Catalog details for the planet, when the lookup succeeded.
        info: Option<PlanetRecord>,
    },
}

pub struct Fetcher {
    client: CatalogClient,
    tx: Sender<FetchResult>,
    rx: Receiver<FetchResult>,
    next_id: u64,
}

impl Fetcher {
    pub fn new(client: CatalogClient) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            client,
            tx,
            rx,
            next_id: 0,
        }
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    /// Look up planet names matching `query`.
    pub fn search(&self, query: &str) -> io::Result<()> {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let query = query.to_owned();
        spawn("catalog-search", move || {
            let result = client.planet_names(&query);
            let _ = tx.send(FetchResult::Matches { query, result });
        })
    }

    /// Fetch the stars around `planet`, plus its catalog entry. Fails only
    /// when the worker thread cannot be started.
    pub fn stars(&mut self, planet: &str) -> io::Result<RequestId> {
        let id = RequestId(self.next_id);
        self.next_id += 1;

        let client = self.client.clone();
        let tx = self.tx.clone();
        let planet = planet.to_owned();
        spawn("catalog-stars", move || {
            let result = client.stars(&planet);
            let info = match client.search_planets(&planet) {
                Ok(records) => records.into_iter().find(|p| p.pl_name == planet),
                Err(e) => {
                    tracing::debug!("No catalog details for {planet}: {e}");
                    None
                }
            };
            let _ = tx.send(FetchResult::Stars {
                id,
                planet,
                result,
                info,
            });
        })?;
        Ok(id)
    }

    /// Results that arrived since the last call.
    pub fn drain(&self) -> Vec<FetchResult> {
        self.rx.try_iter().collect()
    }
}

fn spawn(name: &str, job: impl FnOnce() + Send + 'static) -> io::Result<()> {
    std::thread::Builder::new()
        .name(name.into())
        .spawn(job)
        .map(drop)
}

/// One-line summary of a planet for notifications.
pub fn describe_planet(planet: &PlanetRecord) -> String {
    let mut parts = vec![planet.pl_name.clone()];
    if let Some(host) = &planet.hostname {
        parts.push(format!("host {host}"));
    }
    if let Some(dist) = planet.sy_dist {
        parts.push(format!("{dist:.1} pc"));
    }
    if let Some(year) = planet.disc_year {
        parts.push(format!("discovered {year}"));
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tiny_http::{Header, Response, Server};

    /// Answer every request by path until the test ends.
    fn serve(routes: &'static [(&'static str, &'static str)]) -> String {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().map(|a| a.port()).unwrap();
        std::thread::spawn(move || {
            while let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(5)) {
                let path = request.url().split('?').next().unwrap_or("").to_string();
                let body = routes
                    .iter()
                    .find(|(route, _)| *route == path)
                    .map(|(_, body)| *body);
                let response = match body {
                    Some(body) => Response::from_string(body).with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap(),
                    ),
                    None => Response::from_string("not found").with_status_code(404),
                };
                request.respond(response).ok();
            }
        });
        format!("http://127.0.0.1:{port}")
    }

    fn wait(fetcher: &Fetcher, count: usize) -> Vec<FetchResult> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut out = Vec::new();
        while out.len() < count {
            out.extend(fetcher.drain());
            assert!(Instant::now() < deadline, "fetch timed out");
            std::thread::sleep(Duration::from_millis(5));
        }
        out
    }

    #[test]
    fn test_star_fetch_with_details() {
        let base = serve(&[
            (
                "/planets/Kepler-22%20b/stars",
                r#"[{"pos":[1,2,3],"lum":5,"radius":1,"temperature":5800,"wavelength":-1,"mass":-1,"age":-1}]"#,
            ),
            (
                "/planets",
                r#"[{"pl_name":"Kepler-22 b","hostname":"Kepler-22","sy_dist":190.0}]"#,
            ),
        ]);
        let mut fetcher = Fetcher::new(CatalogClient::new(&base, Duration::from_secs(5)));
        let id = fetcher.stars("Kepler-22 b").unwrap();

        match wait(&fetcher, 1).remove(0) {
            FetchResult::Stars {
                id: got,
                planet,
                result,
                info,
            } => {
                assert_eq!(got, id);
                assert_eq!(planet, "Kepler-22 b");
                let stars = result.unwrap();
                assert_eq!(stars.len(), 1);
                assert_eq!(stars[0].wavelength, None);
                let info = info.unwrap();
                assert_eq!(describe_planet(&info), "Kepler-22 b, host Kepler-22, 190.0 pc");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_planet_reports_error() {
        let base = serve(&[]);
        let mut fetcher = Fetcher::new(CatalogClient::new(&base, Duration::from_secs(5)));
        fetcher.stars("Nowhere b").unwrap();
        match wait(&fetcher, 1).remove(0) {
            FetchResult::Stars { result, info, .. } => {
                assert!(matches!(result, Err(CatalogError::Status { status: 404, .. })));
                assert!(info.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_search_returns_query_with_names() {
        let base = serve(&[("/planets/names", r#"["Kepler-22 b","Kepler-452 b"]"#)]);
        let fetcher = Fetcher::new(CatalogClient::new(&base, Duration::from_secs(5)));
        fetcher.search("kepler").unwrap();
        match wait(&fetcher, 1).remove(0) {
            FetchResult::Matches { query, result } => {
                assert_eq!(query, "kepler");
                assert_eq!(result.unwrap().len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_request_ids_are_unique() {
        let base = serve(&[]);
        let mut fetcher = Fetcher::new(CatalogClient::new(&base, Duration::from_secs(5)));
        let a = fetcher.stars("a").unwrap();
        let b = fetcher.stars("b").unwrap();
        assert_ne!(a, b);
        wait(&fetcher, 2);
    }
}
