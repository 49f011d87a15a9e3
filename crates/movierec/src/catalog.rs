//! Movie catalog: `movieId,title,genres` lookup table.
//!
//! Titles are used for reporting only; nothing in training depends on the catalog.
//!
//! ```
//! use movierec::MovieCatalog;
//!
//! let csv = "movieId,title,genres\n1,Toy Story (1995),Adventure|Animation|Children\n";
//! let catalog = MovieCatalog::from_reader(csv.as_bytes()).unwrap();
//! assert_eq!(catalog.title(1), Some("Toy Story (1995)"));
//! assert_eq!(catalog.get(1).unwrap().genres.len(), 3);
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::ParseError;

/// Genre cell used by the MovieLens exports for movies without genres.
const NO_GENRES: &str = "(no genres listed)";

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub movie_id: u32,
    pub title: String,
    pub genres: Vec<String>,
}

/// Read-only movie lookup by id.
#[derive(Debug, Clone, Default)]
pub struct MovieCatalog {
    movies: HashMap<u32, Movie>,
}

impl MovieCatalog {
    /// Load a catalog from a CSV file.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_reader(file)?;
        tracing::debug!(path = %path.display(), movies = catalog.len(), "loaded movie catalog");
        Ok(catalog)
    }

    /// Read a catalog from CSV text with a header row.
    ///
    /// A later row with an id already seen replaces the earlier entry.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ParseError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        if rdr.headers()?.is_empty() {
            return Err(ParseError::MissingHeader);
        }

        let mut movies = HashMap::new();
        for (i, row) in rdr.records().enumerate() {
            let row = row?;
            let line = row.position().map_or(i as u64 + 2, |p| p.line());
            let field = |index: usize, name: &str| {
                row.get(index).ok_or_else(|| ParseError::MissingField {
                    line,
                    field: name.to_string(),
                })
            };

            let raw_id = field(0, "movieId")?;
            let movie_id = raw_id
                .parse::<u32>()
                .map_err(|_| ParseError::invalid(line, "movieId", "unsigned integer", raw_id))?;
            let title = field(1, "title")?.to_string();
            let genres = parse_genres(row.get(2).unwrap_or(""));

            movies.insert(
                movie_id,
                Movie {
                    movie_id,
                    title,
                    genres,
                },
            );
        }
        Ok(Self { movies })
    }

    pub fn get(&self, movie_id: u32) -> Option<&Movie> {
        self.movies.get(&movie_id)
    }

    pub fn title(&self, movie_id: u32) -> Option<&str> {
        self.get(movie_id).map(|m| m.title.as_str())
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

fn parse_genres(raw: &str) -> Vec<String> {
    if raw.is_empty() || raw == NO_GENRES {
        return Vec::new();
    }
    raw.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
