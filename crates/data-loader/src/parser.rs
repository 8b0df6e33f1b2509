//! Parser for the watchlist export files.
//!
//! - interactions.dat: userId::movieId::status::rating
//! - movies.dat: movieId::title::addedAt
//!
//! The rating column may be empty (or `None`/`null`) when the user never
//! rated the movie. A numeric rating outside `[0, MAX_RATING]` is logged and
//! loaded as absent, so one bad row can't block a refresh. Unknown status
//! labels are accepted and map to `WatchStatus::Unknown`.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Highest rating the watchlist UI lets a user pick
pub const MAX_RATING: f32 = 10.0;

fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Pulls the next `::` field or reports which one is missing
fn next_field<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<&'a str> {
    parts.next().ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Missing {}", name),
    })
}

fn parse_id(value: &str, file: &str, line: usize, name: &str) -> Result<u32> {
    value.trim().parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

/// Parse an optional rating column
///
/// Example: "" -> Ok(None), "7.5" -> Ok(Some(7.5)), "11" -> Err
pub fn parse_rating(value: &str) -> Result<Option<f32>> {
    let value = value.trim();
    if value.is_empty() || matches!(value, "None" | "none" | "null" | "NULL") {
        return Ok(None);
    }
    let rating: f32 = value.parse().map_err(|_| DataLoadError::InvalidValue {
        field: "rating".to_string(),
        value: value.to_string(),
    })?;
    if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
        return Err(DataLoadError::InvalidValue {
            field: "rating".to_string(),
            value: value.to_string(),
        });
    }
    Ok(Some(rating))
}

/// Parse the interactions.dat file
pub fn parse_interactions(path: &Path) -> Result<Vec<Interaction>> {
    const FILE: &str = "interactions.dat";
    let lines = read_lines(path)?;
    let mut interactions = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut parts = line_trimmed.split("::");
        let user_id = next_field(&mut parts, FILE, line_no, "userId")?;
        let movie_id = next_field(&mut parts, FILE, line_no, "movieId")?;
        let status = next_field(&mut parts, FILE, line_no, "status")?;
        // A trailing empty rating column may have been stripped by trim()
        let rating = match parse_rating(parts.next().unwrap_or("")) {
            Ok(rating) => rating,
            Err(DataLoadError::InvalidValue { value, .. }) if value.parse::<f32>().is_ok() => {
                warn!(
                    "{}:{}: rating {} outside [0, {}], loading as unrated",
                    FILE, line_no, value, MAX_RATING
                );
                None
            }
            Err(e) => {
                return Err(DataLoadError::ParseError {
                    file: FILE.to_string(),
                    line: line_no,
                    reason: e.to_string(),
                });
            }
        };

        interactions.push(Interaction {
            user_id: parse_id(user_id, FILE, line_no, "userId")?,
            movie_id: parse_id(movie_id, FILE, line_no, "movieId")?,
            status: WatchStatus::from(status),
            rating,
        });
    }

    Ok(interactions)
}

/// Parse the movies.dat file
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    const FILE: &str = "movies.dat";
    let lines = read_lines(path)?;
    let mut movies = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut parts = line_trimmed.split("::");
        let movie_id = next_field(&mut parts, FILE, line_no, "movieId")?;
        let title = next_field(&mut parts, FILE, line_no, "title")?;
        let added_at = next_field(&mut parts, FILE, line_no, "addedAt")?;

        movies.push(Movie {
            id: parse_id(movie_id, FILE, line_no, "movieId")?,
            title: title.to_string(),
            year: extract_year_from_title(title),
            added_at: added_at
                .trim()
                .parse()
                .map_err(|e| DataLoadError::ParseError {
                    file: FILE.to_string(),
                    line: line_no,
                    reason: format!("Invalid addedAt: {}", e),
                })?,
        });
    }

    Ok(movies)
}

/// Extract year from movie title
///
/// Example: "Heat (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        return title[start + 1..end].parse::<u16>().ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("data-loader-parser-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year_from_title("Heat (1995)"), Some(1995));
        assert_eq!(extract_year_from_title("Movie Title"), None);
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("").unwrap(), None);
        assert_eq!(parse_rating("None").unwrap(), None);
        assert_eq!(parse_rating("NULL").unwrap(), None);
        assert_eq!(parse_rating("7.5").unwrap(), Some(7.5));
        assert!(parse_rating("abc").is_err());
        assert!(parse_rating("-1").is_err());
        assert!(parse_rating("11").is_err());
    }

    #[test]
    fn test_parse_interactions() {
        let path = write_temp(
            "interactions_ok.dat",
            "1::10::watched::5\n1::11::plan_to_watch::\n\n2::10::watching::3\n3::12::dropped::None\n",
        );
        let interactions = parse_interactions(&path).unwrap();

        assert_eq!(interactions.len(), 4);
        assert_eq!(interactions[0].status, WatchStatus::Watched);
        assert_eq!(interactions[0].rating, Some(5.0));
        assert_eq!(interactions[1].rating, None);
        assert_eq!(interactions[3].status, WatchStatus::Unknown);
    }

    #[test]
    fn test_parse_interactions_bad_id() {
        let path = write_temp("interactions_bad.dat", "x::10::watched::5\n");
        let err = parse_interactions(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_out_of_range_rating_loads_as_unrated() {
        let path = write_temp(
            "interactions_out_of_range.dat",
            "1::10::watched::11\n1::11::watching::-2\n2::10::watched::7\n",
        );
        let interactions = parse_interactions(&path).unwrap();

        assert_eq!(interactions.len(), 3);
        assert_eq!(interactions[0].status, WatchStatus::Watched);
        assert_eq!(interactions[0].rating, None);
        assert_eq!(interactions[1].rating, None);
        assert_eq!(interactions[2].rating, Some(7.0));
    }

    #[test]
    fn test_unparseable_rating_is_an_error() {
        let path = write_temp(
            "interactions_bad_rating.dat",
            "1::10::watched::5\n1::11::watched::great\n",
        );
        let err = parse_interactions(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_parse_movies() {
        let path = write_temp(
            "movies_ok.dat",
            "10::Heat (1995)::1700000000\n11::Untitled::1700000100\n",
        );
        let movies = parse_movies(&path).unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].year, Some(1995));
        assert_eq!(movies[1].year, None);
        assert_eq!(movies[1].added_at, 1700000100);
    }

    #[test]
    fn test_missing_file() {
        let err = parse_movies(Path::new("/definitely/not/here/movies.dat")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
