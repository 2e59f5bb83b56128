use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// Checks cross-field constraints that TOML deserialization cannot express:
/// non-empty credential and seed lists, sane numeric ranges, and parseable
/// endpoint/seed URLs.
///
/// # Arguments
///
/// * `config` - The configuration to validate
///
/// # Returns
///
/// * `Ok(())` - Configuration is valid
/// * `Err(ConfigError)` - A constraint was violated
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.store.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "store.database-path must not be empty".to_string(),
        ));
    }

    if config.crawler.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "crawler.seeds must contain at least one homepage URL".to_string(),
        ));
    }

    for seed in &config.crawler.seeds {
        let url = Url::parse(seed).map_err(|_| ConfigError::InvalidUrl(seed.clone()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(seed.clone()));
        }
    }

    if config.crawler.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "crawler.keywords must contain at least one topical keyword".to_string(),
        ));
    }

    if config.crawler.max_links == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-links must be greater than 0".to_string(),
        ));
    }

    if config.crawler.concurrency == 0 {
        return Err(ConfigError::Validation(
            "crawler.concurrency must be greater than 0".to_string(),
        ));
    }

    if config.search.keys.is_empty() {
        return Err(ConfigError::Validation(
            "search.keys must contain at least one credential".to_string(),
        ));
    }

    if config.search.query.is_empty() {
        return Err(ConfigError::Validation(
            "search.query must not be empty".to_string(),
        ));
    }

    if config.search.page_size == 0 || config.search.page_size > 100 {
        return Err(ConfigError::Validation(
            "search.page-size must be between 1 and 100".to_string(),
        ));
    }

    if config.search.overlap_secs < 0 {
        return Err(ConfigError::Validation(
            "search.overlap-secs must not be negative".to_string(),
        ));
    }

    if config.search.backfill_window_hours <= 0 {
        return Err(ConfigError::Validation(
            "search.backfill-window-hours must be greater than 0".to_string(),
        ));
    }

    if config.search.ingest_concurrency == 0 {
        return Err(ConfigError::Validation(
            "search.ingest-concurrency must be greater than 0".to_string(),
        ));
    }

    Url::parse(&config.search.endpoint)
        .map_err(|_| ConfigError::InvalidUrl(config.search.endpoint.clone()))?;

    if config.generative.keys.is_empty() {
        return Err(ConfigError::Validation(
            "generative.keys must contain at least one credential".to_string(),
        ));
    }

    if config.generative.system_instruction.is_empty() {
        return Err(ConfigError::Validation(
            "generative.system-instruction must not be empty".to_string(),
        ));
    }

    if config.generative.attempts_per_pair == 0 {
        return Err(ConfigError::Validation(
            "generative.attempts-per-pair must be greater than 0".to_string(),
        ));
    }

    Url::parse(&config.generative.endpoint)
        .map_err(|_| ConfigError::InvalidUrl(config.generative.endpoint.clone()))?;

    if config.fetch.min_content_chars > config.fetch.thin_threshold {
        return Err(ConfigError::Validation(
            "fetch.min-content-chars must not exceed fetch.thin-threshold".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::create_test_config;

    #[test]
    fn test_valid_config_passes() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_seeds_rejected() {
        let mut config = create_test_config();
        config.crawler.seeds.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_non_http_seed_rejected() {
        let mut config = create_test_config();
        config.crawler.seeds = vec!["ftp://example.gov/".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_search_keys_rejected() {
        let mut config = create_test_config();
        config.search.keys.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_oversized_page_size_rejected() {
        let mut config = create_test_config();
        config.search.page_size = 500;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = create_test_config();
        config.generative.attempts_per_pair = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_min_content_above_thin_threshold_rejected() {
        let mut config = create_test_config();
        config.fetch.min_content_chars = 400;
        config.fetch.thin_threshold = 300;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
