//! Fichier de coordonnées à plat: en-tête `x,y` puis une paire par ligne.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

use crate::attractor::Point;
use crate::error::{Error, Result};

pub const HEADER: [&str; 2] = ["x", "y"];

/// Nombre de décimales par défaut.
pub const DEFAULT_PRECISION: usize = 3;

/// Écriture ligne à ligne (utilisable en flux, ex. acquisition depuis un périphérique).
pub struct PointWriter<W: Write> {
    inner: csv::Writer<W>,
    precision: usize,
    rows: usize,
}

impl<W: Write> PointWriter<W> {
    /// Crée l'écrivain et écrit l'en-tête.
    pub fn new(inner: W, precision: usize) -> Result<Self> {
        let mut inner = WriterBuilder::new().from_writer(inner);
        inner.write_record(HEADER)?;
        Ok(Self {
            inner,
            precision,
            rows: 0,
        })
    }

    pub fn write_point(&mut self, p: Point) -> Result<()> {
        let prec = self.precision;
        self.inner
            .write_record([format!("{:.prec$}", p.x), format!("{:.prec$}", p.y)])?;
        self.rows += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Nombre de lignes de données écrites.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(self) -> Result<W> {
        self.inner.into_inner().map_err(|e| Error::Io(e.into_error()))
    }
}

impl PointWriter<File> {
    pub fn create(path: &Path, precision: usize) -> Result<Self> {
        Self::new(File::create(path)?, precision)
    }
}

/// Écrit un point sur `stride` dans `path`. Retourne le nombre de lignes écrites.
pub fn write_points(path: &Path, points: &[Point], precision: usize, stride: usize) -> Result<usize> {
    let mut writer = PointWriter::create(path, precision)?;
    for p in points.iter().step_by(stride.max(1)) {
        writer.write_point(*p)?;
    }
    let rows = writer.rows();
    writer.finish()?;
    log::info!("{rows} points saved to {}", path.display());
    Ok(rows)
}

pub fn read_points(path: &Path) -> Result<Vec<Point>> {
    parse_points(File::open(path)?)
}

/// Lit un fichier de coordonnées. Toute ligne invalide est une erreur.
pub fn parse_points<R: Read>(reader: R) -> Result<Vec<Point>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().map_err(with_line)?;
    let names: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    if names != HEADER {
        let reason = if names.is_empty() {
            "en-tête manquant".to_string()
        } else {
            format!("en-tête '{}' au lieu de 'x,y'", names.join(","))
        };
        return Err(Error::Csv { line: 1, reason });
    }

    let mut points = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record).map_err(with_line)? {
        // Ligne faite d'espaces seulement
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        let point = point_of(&record).ok_or_else(|| Error::Csv {
            line: record.position().map_or(0, |p| p.line() as usize),
            reason: format!("'{}' n'est pas une paire x,y", record.iter().collect::<Vec<_>>().join(",")),
        })?;
        points.push(point);
    }
    Ok(points)
}

fn point_of(record: &StringRecord) -> Option<Point> {
    if record.len() != 2 {
        return None;
    }
    let x = record[0].parse::<f64>().ok()?;
    let y = record[1].parse::<f64>().ok()?;
    let p = Point::new(x, y);
    p.is_finite().then_some(p)
}

/// Les erreurs positionnées (ex. UTF-8 invalide) gardent leur numéro de ligne.
fn with_line(err: csv::Error) -> Error {
    match err.position() {
        Some(pos) => Error::Csv {
            line: pos.line() as usize,
            reason: err.to_string(),
        },
        None => Error::CsvFormat(err),
    }
}

/// Analyse "x,y" (espaces tolérés). `None` si la ligne est invalide ou non finie.
pub fn parse_pair(line: &str) -> Option<Point> {
    let mut fields = line.trim().split(',');
    let x = fields.next()?.trim().parse::<f64>().ok()?;
    let y = fields.next()?.trim().parse::<f64>().ok()?;
    if fields.next().is_some() {
        return None;
    }
    let p = Point::new(x, y);
    p.is_finite().then_some(p)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_roundtrip_within_precision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        let points: Vec<Point> = (0..500)
            .map(|i| {
                let t = i as f64 * 0.0137;
                Point::new(t.sin() * 1.2345678, (t * 1.7).cos() - 0.5)
            })
            .collect();

        for precision in [3, 6] {
            let rows = write_points(&path, &points, precision, 1).unwrap();
            assert_eq!(rows, points.len());
            let back = read_points(&path).unwrap();
            assert_eq!(back.len(), points.len());
            let tol = 0.5 * 10f64.powi(-(precision as i32)) + 1e-12;
            for (a, b) in points.iter().zip(&back) {
                assert!((a.x - b.x).abs() <= tol, "{} vs {}", a.x, b.x);
                assert!((a.y - b.y).abs() <= tol, "{} vs {}", a.y, b.y);
            }
        }
    }

    #[test]
    fn test_stride() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strided.csv");
        let points: Vec<Point> = (0..10).map(|i| Point::new(i as f64, 0.0)).collect();
        assert_eq!(write_points(&path, &points, 1, 3).unwrap(), 4);
        let back = read_points(&path).unwrap();
        let xs: Vec<f64> = back.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn test_writer_format() {
        let mut writer = PointWriter::new(Vec::new(), 3).unwrap();
        writer.write_point(Point::new(1.23456, -0.5)).unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "x,y\n1.235,-0.500\n");
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let data = "x,y\n1,2\n3;4\n";
        let err = parse_points(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::Csv { line: 3, .. }), "{err}");

        let data = "x,y\n1,2\n3,4,5\n";
        assert!(matches!(parse_points(Cursor::new(data)), Err(Error::Csv { line: 3, .. })));
        let data = "x,y\nnan,1\n";
        assert!(matches!(parse_points(Cursor::new(data)), Err(Error::Csv { line: 2, .. })));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let points = parse_points(Cursor::new("x,y\n1,2\n\n   \n3,4\n")).unwrap();
        assert_eq!(points, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }

    #[test]
    fn test_header_required() {
        assert!(matches!(
            parse_points(Cursor::new("")),
            Err(Error::Csv { line: 1, .. })
        ));
        assert!(parse_points(Cursor::new("a,b\n1,2\n")).is_err());
        assert_eq!(parse_points(Cursor::new("x, y\n1, 2\n")).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair(" 0.5 , -1 "), Some(Point::new(0.5, -1.0)));
        assert_eq!(parse_pair("1,2,3"), None);
        assert_eq!(parse_pair("1"), None);
        assert_eq!(parse_pair("nan,1"), None);
        assert_eq!(parse_pair("abc,1"), None);
    }
}
