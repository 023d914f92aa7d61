use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::coordinate::{Coordinate, Path};
use super::error::SyncError;

/// Snapshot of both endpoints, taken when a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    pub source: Coordinate,
    pub target: Coordinate,
}

impl PathRequest {
    pub fn new(source: Coordinate, target: Coordinate) -> Self {
        Self { source, target }
    }

    /// Query string understood by the path service:
    /// `sourceLat,sourceLng,targetLat,targetLng`
    pub fn to_query(&self) -> String {
        format!("{},{}", self.source, self.target)
    }

    /// Parse the four comma separated numbers at the start of a query string.
    /// Anything after them (e.g. `&callback=cb`) is ignored.
    pub fn from_query(query: &str) -> Result<Self, SyncError> {
        let caps = query_regex().captures(query).ok_or_else(|| {
            SyncError::MalformedQuery(format!(
                "expected four comma separated numbers, got {:?}",
                query
            ))
        })?;

        let number = |name: &str| -> Result<f64, SyncError> {
            caps[name]
                .parse::<f64>()
                .map_err(|e| SyncError::MalformedQuery(format!("{}: {}", name, e)))
        };

        Ok(Self {
            source: Coordinate::new(number("lat1")?, number("lng1")?)?,
            target: Coordinate::new(number("lat2")?, number("lng2")?)?,
        })
    }
}

fn query_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^
            (?P<lat1>[+-]?[0-9]*\.?[0-9]+) ,
            (?P<lng1>[+-]?[0-9]*\.?[0-9]+) ,
            (?P<lat2>[+-]?[0-9]*\.?[0-9]+) ,
            (?P<lng2>[+-]?[0-9]*\.?[0-9]+)
            (?:&|$)",
        )
        .expect("path query regex is valid")
    })
}

/// Body exchanged with the path service: a flat `[lat0, lng0, lat1, lng1, ...]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePath {
    pub path: Vec<f64>,
}

/// Path returned by the service, in the order it should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResponse {
    pub path: Path,
}

impl PathResponse {
    pub fn new(path: Path) -> Self {
        Self { path }
    }

    /// Decode a response body.
    ///
    /// Accepts plain JSON as well as the `callback({...})` envelope used by
    /// script-tag transports.
    pub fn decode(body: &str) -> Result<Self, SyncError> {
        let json = unwrap_callback(body.trim());

        let wire: WirePath = serde_json::from_str(json)
            .map_err(|e| SyncError::MalformedResponse(e.to_string()))?;

        Self::from_wire(&wire)
    }

    pub fn from_wire(wire: &WirePath) -> Result<Self, SyncError> {
        let numbers = &wire.path;
        if numbers.len() < 4 || numbers.len() % 2 != 0 {
            return Err(SyncError::MalformedResponse(format!(
                "path must hold an even number of values (at least 4), got {}",
                numbers.len()
            )));
        }

        let points = numbers
            .chunks_exact(2)
            .map(|pair| {
                Coordinate::new(pair[0], pair[1])
                    .map_err(|e| SyncError::MalformedResponse(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            path: Path::new(points)?,
        })
    }

    pub fn to_wire(&self) -> WirePath {
        WirePath {
            path: self
                .path
                .points()
                .iter()
                .flat_map(|c| [c.latitude(), c.longitude()])
                .collect(),
        }
    }
}

/// Strip a `name( ... )` wrapper if there is one.
fn unwrap_callback(body: &str) -> &str {
    if body.starts_with('{') {
        return body;
    }

    match (body.find('('), body.rfind(')')) {
        (Some(open), Some(close)) if open < close => body[open + 1..close].trim(),
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_query_encoding() {
        let req = PathRequest::new(coord(48.012653, 7.835194), coord(48.011000, 7.820000));
        assert_eq!(req.to_query(), "48.012653,7.835194,48.011,7.82");
    }

    #[test]
    fn test_query_parsing() {
        let req = PathRequest::from_query("48.012653,7.835194,48.010683,7.81776").unwrap();
        assert_eq!(req.source, coord(48.012653, 7.835194));
        assert_eq!(req.target, coord(48.010683, 7.81776));

        let with_callback = PathRequest::from_query("-33.5,151,-33.6,151.25&callback=cb").unwrap();
        assert_eq!(with_callback.source, coord(-33.5, 151.0));
        assert_eq!(with_callback.target, coord(-33.6, 151.25));
    }

    #[test]
    fn test_query_parsing_rejects_garbage() {
        assert!(matches!(
            PathRequest::from_query("48.0,7.8,48.1"),
            Err(SyncError::MalformedQuery(_))
        ));
        assert!(PathRequest::from_query("").is_err());
        assert!(PathRequest::from_query("a,b,c,d").is_err());
        assert!(matches!(
            PathRequest::from_query("95,7.8,48.1,7.9"),
            Err(SyncError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_decode_plain_json() {
        let resp = PathResponse::decode(r#"{"path": [48.012653, 7.835194, 48.011, 7.82]}"#).unwrap();
        assert_eq!(
            resp.path.points(),
            &[coord(48.012653, 7.835194), coord(48.011, 7.82)]
        );
    }

    #[test]
    fn test_decode_callback_envelope() {
        let body = r#"redrawLineServerCallback({"path": [48.0, 7.8, 48.1, 7.9]})"#;
        let resp = PathResponse::decode(body).unwrap();
        assert_eq!(resp.path.end(), coord(48.1, 7.9));
    }

    #[test]
    fn test_decode_keeps_intermediate_points_in_order() {
        let resp = PathResponse::decode(r#"{"path": [48.0, 7.8, 48.05, 7.85, 48.1, 7.9]}"#).unwrap();
        assert_eq!(
            resp.path.points(),
            &[coord(48.0, 7.8), coord(48.05, 7.85), coord(48.1, 7.9)]
        );
    }

    #[test]
    fn test_decode_malformed() {
        let cases = [
            "",
            "not json",
            r#"{"route": [48.0, 7.8, 48.1, 7.9]}"#,
            r#"{"path": "48.0,7.8,48.1,7.9"}"#,
            r#"{"path": [48.0, 7.8, 48.1]}"#,
            r#"{"path": [48.0, 7.8]}"#,
            r#"{"path": [95.0, 7.8, 48.1, 7.9]}"#,
        ];

        for body in cases {
            assert!(
                matches!(PathResponse::decode(body), Err(SyncError::MalformedResponse(_))),
                "expected MalformedResponse for {:?}",
                body
            );
        }
    }

    #[test]
    fn test_to_wire_is_flat() {
        let resp = PathResponse::new(Path::direct(coord(48.0, 7.8), coord(48.1, 7.9)));
        assert_eq!(resp.to_wire().path, vec![48.0, 7.8, 48.1, 7.9]);
    }
}
