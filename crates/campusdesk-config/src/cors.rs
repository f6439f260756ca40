const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::from_list(DEFAULT_ORIGINS)
    }
}

impl CorsConfig {
    pub fn from_env() -> Self {
        Self::from_list(
            &std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.to_string()),
        )
    }

    pub fn from_list(raw: &str) -> Self {
        Self {
            allowed_origins: raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_list_skips_blanks() {
        let config = CorsConfig::from_list(" http://a.test , ,http://b.test,");
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_default_allows_local_dev_servers() {
        assert_eq!(CorsConfig::default().allowed_origins.len(), 2);
    }
}
