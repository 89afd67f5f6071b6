use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::error::DataError;

/// Built-in city → file mapping.
pub const DEFAULT_CITY_FILES: [(&str, &str); 3] = [
    ("chicago", "chicago.csv"),
    ("new york city", "new_york_city.csv"),
    ("washington", "washington.csv"),
];

// ---------------------------------------------------------------------------
// CityTable
// ---------------------------------------------------------------------------

/// Immutable mapping from lowercase city key to dataset path.
/// Built once at startup and shared by reference afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CityTable {
    files: BTreeMap<String, PathBuf>,
}

impl Default for CityTable {
    fn default() -> Self {
        Self::from_entries(
            DEFAULT_CITY_FILES
                .iter()
                .map(|(city, file)| (city.to_string(), PathBuf::from(file))),
        )
    }
}

impl CityTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
        let files = entries
            .into_iter()
            .map(|(city, path)| (normalize_city(&city), path))
            .collect();
        CityTable { files }
    }

    /// Read a `{ "<city>": "<file>" }` JSON object.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading city table {}", path.display()))?;
        let raw: BTreeMap<String, PathBuf> =
            serde_json::from_str(&text).context("parsing city table JSON")?;
        Ok(Self::from_entries(raw))
    }

    /// Resolve relative paths against `dir`.
    pub fn with_data_dir(self, dir: &Path) -> Self {
        let files = self
            .files
            .into_iter()
            .map(|(city, path)| {
                let path = if path.is_absolute() { path } else { dir.join(path) };
                (city, path)
            })
            .collect();
        CityTable { files }
    }

    /// Look up a city, ignoring case and surrounding whitespace.
    pub fn resolve(&self, city: &str) -> Result<&Path, DataError> {
        self.files
            .get(&normalize_city(city))
            .map(PathBuf::as_path)
            .ok_or_else(|| DataError::UnknownCity(city.trim().to_string()))
    }

    pub fn contains(&self, city: &str) -> bool {
        self.files.contains_key(&normalize_city(city))
    }

    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Explore US bikeshare trip data.
///
/// Without `--city` the explorer runs interactively; with it, one report is
/// printed for the given filters and the program exits.
#[derive(Debug, Parser)]
#[command(name = "bikeshare-explorer", version)]
pub struct AppConfig {
    /// Directory that relative dataset paths are resolved against.
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// JSON file mapping city names to dataset files.
    #[arg(long)]
    pub cities: Option<PathBuf>,

    /// Abort on the first malformed row instead of skipping it.
    #[arg(long)]
    pub strict: bool,

    /// City to analyse (non-interactive mode).
    #[arg(long)]
    pub city: Option<String>,

    #[arg(long, default_value = "all")]
    pub month: String,

    #[arg(long, default_value = "all")]
    pub day: String,

    /// morning, afternoon, evening, night or all.
    #[arg(long, default_value = "all")]
    pub time_of_day: String,

    #[arg(long, default_value = "all")]
    pub bike_type: String,

    /// Number of raw-data pages (5 rows each) to print after the report.
    #[arg(long, default_value_t = 0)]
    pub raw_pages: usize,

    /// Print statistics as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

impl AppConfig {
    pub fn city_table(&self) -> Result<CityTable> {
        let table = match &self.cities {
            Some(path) => CityTable::from_json_file(path)?,
            None => CityTable::default(),
        };
        Ok(table.with_data_dir(&self.data_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_three_cities() {
        let table = CityTable::default();
        assert_eq!(
            table.cities().collect::<Vec<_>>(),
            vec!["chicago", "new york city", "washington"]
        );
    }

    #[test]
    fn resolves_case_insensitively() {
        let table = CityTable::default().with_data_dir(Path::new("/data"));
        assert_eq!(
            table.resolve("  New York City ").unwrap(),
            Path::new("/data/new_york_city.csv")
        );
    }

    #[test]
    fn unknown_city_is_an_error() {
        let table = CityTable::default();
        assert_eq!(
            table.resolve("boston").unwrap_err(),
            DataError::UnknownCity("boston".to_string())
        );
        assert!(!table.contains("boston"));
    }

    #[test]
    fn absolute_paths_survive_data_dir() {
        let table = CityTable::from_entries([("Denver".to_string(), PathBuf::from("/abs/denver.csv"))])
            .with_data_dir(Path::new("/data"));
        assert_eq!(table.resolve("denver").unwrap(), Path::new("/abs/denver.csv"));
    }

    #[test]
    fn reads_json_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.json");
        std::fs::write(&path, r#"{ "Portland": "portland.json" }"#).unwrap();

        let table = CityTable::from_json_file(&path).unwrap();
        assert_eq!(table.cities().collect::<Vec<_>>(), vec!["portland"]);
        assert_eq!(table.resolve("PORTLAND").unwrap(), Path::new("portland.json"));
    }

    #[test]
    fn parses_cli_flags() {
        let cfg = AppConfig::try_parse_from([
            "bikeshare-explorer",
            "--city",
            "chicago",
            "--month",
            "June",
            "--raw-pages",
            "2",
        ])
        .unwrap();
        assert_eq!(cfg.city.as_deref(), Some("chicago"));
        assert_eq!(cfg.month, "June");
        assert_eq!(cfg.day, "all");
        assert_eq!(cfg.raw_pages, 2);
        assert!(!cfg.json);
    }
}
