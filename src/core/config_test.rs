#[cfg(test)]
mod tests {

    use crate::core::AppConfig;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.last_video_directory.is_none());
        assert!(config.last_music_directory.is_none());
        assert!(config.last_output_directory.is_none());
        assert_eq!(config.music_level_percent, 100);
        assert_eq!(config.original_level_percent, 20);
        assert!(config.duck_by_default);
    }

    #[test]
    fn test_app_config_serialization() {
        let mut config = AppConfig::default();
        config.last_video_directory = Some(std::path::PathBuf::from("/clips"));
        config.music_level_percent = 60;
        config.duck_by_default = false;

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: AppConfig = serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(config.last_video_directory, deserialized.last_video_directory);
        assert_eq!(config.music_level_percent, deserialized.music_level_percent);
        assert_eq!(config.duck_by_default, deserialized.duck_by_default);
    }

    #[test]
    fn test_corrupt_config_is_rejected_by_parser() {
        let corrupt = r#"{"music_level_percent": "not a number"}"#;
        assert!(serde_json::from_str::<AppConfig>(corrupt).is_err());
    }
}
