//! Acquisition de points depuis un périphérique série (ou tout flux texte).
//!
//! Protocole ligne à ligne:
//! - `START` : début de transmission, ignoré
//! - `x,y`   : un point
//! - `DONE` ou `STOP` : fin de transmission
//!
//! Les lignes illisibles sont comptées puis ignorées.

use std::io::{self, BufRead, ErrorKind};

use crate::attractor::Point;
use crate::error::Result;
use crate::io::csv::parse_pair;

pub const START: &str = "START";
pub const DONE: &str = "DONE";
pub const STOP: &str = "STOP";

/// Commande envoyée au périphérique pour lancer la transmission.
pub const START_COMMAND: &[u8] = b"START\n";

/// Plafond par défaut du nombre de points acquis.
pub const DEFAULT_MAX_POINTS: usize = 1_000_000;

/// Raison de la fin d'un flux.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// Sentinelle `DONE` ou `STOP` reçue.
    Sentinel,
    /// Fin du flux sans sentinelle.
    EndOfInput,
    /// Nombre maximal de points atteint.
    Limit,
}

/// Itérateur de points lus depuis `reader`.
pub struct DeviceStream<R: BufRead> {
    reader: R,
    line: Vec<u8>,
    max_points: Option<usize>,
    received: usize,
    skipped: usize,
    end: Option<StreamEnd>,
}

impl<R: BufRead> DeviceStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            max_points: None,
            received: 0,
            skipped: 0,
            end: None,
        }
    }

    pub fn with_max_points(mut self, max: usize) -> Self {
        self.max_points = Some(max);
        self
    }

    /// Points acceptés jusqu'ici.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Lignes rejetées (mal formées, non finies ou non UTF-8).
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// `None` tant que le flux n'est pas terminé.
    pub fn end(&self) -> Option<StreamEnd> {
        self.end
    }

    fn next_point(&mut self) -> Result<Option<Point>> {
        loop {
            if let Some(max) = self.max_points {
                if self.received >= max {
                    self.end = Some(StreamEnd::Limit);
                    return Ok(None);
                }
            }

            self.line.clear();
            let n = match self.reader.read_until(b'\n', &mut self.line) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                self.end = Some(StreamEnd::EndOfInput);
                return Ok(None);
            }

            let Ok(text) = std::str::from_utf8(&self.line) else {
                self.skipped += 1;
                log::debug!("skipping non UTF-8 line");
                continue;
            };
            let text = text.trim();
            match text {
                "" => continue,
                START => {
                    log::info!("device started transmission");
                    continue;
                }
                DONE | STOP => {
                    log::info!("device ended transmission ({text})");
                    self.end = Some(StreamEnd::Sentinel);
                    return Ok(None);
                }
                _ => {}
            }

            match parse_pair(text) {
                Some(p) => {
                    self.received += 1;
                    return Ok(Some(p));
                }
                None => {
                    self.skipped += 1;
                    log::debug!("skipping malformed line '{text}'");
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for DeviceStream<R> {
    type Item = Result<Point>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end.is_some() {
            return None;
        }
        self.next_point().transpose()
    }
}

/// Envoie la commande de démarrage au périphérique.
pub fn send_start<W: io::Write>(writer: &mut W) -> Result<()> {
    writer.write_all(START_COMMAND)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn collect(data: &[u8]) -> (Vec<Point>, DeviceStream<Cursor<Vec<u8>>>) {
        let mut stream = DeviceStream::new(Cursor::new(data.to_vec()));
        let points = stream.by_ref().collect::<Result<Vec<_>>>().unwrap();
        (points, stream)
    }

    #[test]
    fn test_protocol() {
        let (points, stream) = collect(b"START\n0.1,0.2\n-1.5,3\nDONE\n9,9\n");
        assert_eq!(points, vec![Point::new(0.1, 0.2), Point::new(-1.5, 3.0)]);
        assert_eq!(stream.end(), Some(StreamEnd::Sentinel));
        assert_eq!(stream.received(), 2);
    }

    #[test]
    fn test_stop_sentinel_and_crlf() {
        let (points, stream) = collect(b"1,1\r\n2,2\r\nSTOP\r\n");
        assert_eq!(points.len(), 2);
        assert_eq!(stream.end(), Some(StreamEnd::Sentinel));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let (points, stream) = collect(b"START\n1,2\ngarbage\n3\n\xff\xfe,1\nnan,1\n4,5\n");
        assert_eq!(points, vec![Point::new(1.0, 2.0), Point::new(4.0, 5.0)]);
        assert_eq!(stream.skipped(), 4);
        assert_eq!(stream.end(), Some(StreamEnd::EndOfInput));
    }

    #[test]
    fn test_max_points() {
        let mut stream = DeviceStream::new(Cursor::new(b"1,1\n2,2\n3,3\n".to_vec())).with_max_points(2);
        let points = stream.by_ref().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(stream.end(), Some(StreamEnd::Limit));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_last_line_without_newline() {
        let (points, _) = collect(b"1,1\n2,2");
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_send_start() {
        let mut out = Vec::new();
        send_start(&mut out).unwrap();
        assert_eq!(out, b"START\n");
    }
}
