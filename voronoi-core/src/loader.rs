//! Text site lists: one `x,y` pair per line.

use std::fs;
use std::path::Path;

use crate::Position;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read sites: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: expected `x,y`, got `{content}`")]
    Malformed { line: usize, content: String },

    #[error("Line {line}: non-numeric coordinate in `{content}`")]
    NonNumeric { line: usize, content: String },
}

/// Parse sites from text. Blank lines and `#` comments are skipped; line
/// numbers in errors are 1-based.
pub fn parse_sites(text: &str) -> Result<Vec<Position>, LoadError> {
    let mut sites = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        let [x, y] = fields.as_slice() else {
            return Err(LoadError::Malformed {
                line: i + 1,
                content: line.to_string(),
            });
        };
        let coord = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        match (coord(*x), coord(*y)) {
            (Some(x), Some(y)) => sites.push(Position::new(x, y)),
            _ => {
                return Err(LoadError::NonNumeric {
                    line: i + 1,
                    content: line.to_string(),
                })
            }
        }
    }
    Ok(sites)
}

/// Read and parse a site file.
pub fn load_sites(path: impl AsRef<Path>) -> Result<Vec<Position>, LoadError> {
    let text = fs::read_to_string(path)?;
    parse_sites(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_comments_and_blanks() {
        let text = "# square\n0,0\n\n 10 , 0 \n10,10\r\n# done\n";
        let sites = parse_sites(text).unwrap();
        assert_eq!(
            sites,
            vec![
                Position::new(0.0, 0.0),
                Position::new(10.0, 0.0),
                Position::new(10.0, 10.0)
            ]
        );
    }

    #[test]
    fn test_malformed_line_number() {
        let err = parse_sites("1,2\n3 4\n").unwrap_err();
        match err {
            LoadError::Malformed { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "3 4");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            parse_sites("1,2,3"),
            Err(LoadError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_non_numeric() {
        assert!(matches!(
            parse_sites("1,2\n\nx,4"),
            Err(LoadError::NonNumeric { line: 3, .. })
        ));
        assert!(matches!(
            parse_sites("inf,4"),
            Err(LoadError::NonNumeric { line: 1, .. })
        ));
        assert!(matches!(
            parse_sites("1,NaN"),
            Err(LoadError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_sites("/nonexistent/sites.txt"),
            Err(LoadError::Io(_))
        ));
    }
}
