use log::LevelFilter;
use serde::{Deserialize, Serialize};

use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub token: String,
    pub loglevel: LevelFilter,
    pub database: Database,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            loglevel: LevelFilter::Info,
            database: Database::default(),
        }
    }
}

pub fn from_file<P>(path: P) -> Config
where
    P: AsRef<Path>,
{
    let mut file = File::open(path).unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();

    toml::from_slice(&buf).unwrap()
}

/// Database configuration section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Database {
    pub driver: String,
    pub path: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            driver: String::from("sqlite"),
            path: String::from("rolekeeper.sqlite"),
        }
    }
}

impl Database {
    /// Returns the connect string for the database. The database file
    /// is created if it doesn't exist yet.
    pub fn connect_string(&self) -> String {
        format!("{}://{}?mode=rwc", self.driver, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::Database;

    #[test]
    fn test_database_connect_string() {
        let database = Database {
            driver: String::from("sqlite"),
            path: String::from("./data/rolekeeper.sqlite"),
        };

        assert_eq!(
            database.connect_string(),
            "sqlite://./data/rolekeeper.sqlite?mode=rwc"
        )
    }
}
