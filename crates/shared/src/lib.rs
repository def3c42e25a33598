pub mod error;
pub mod transcript;

pub mod settings {
    use serde::{Deserialize, Serialize};

    fn default_true() -> bool {
        true
    }

    fn default_base_url() -> String {
        "http://127.0.0.1:8080/".to_string()
    }

    /// Which kind of backend the next message goes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BackendKind {
        #[default]
        LocalServer,
        Hosted,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        /// Base URL of the local inference server.
        #[serde(default = "default_base_url")]
        pub base_url: String,
        #[serde(default)]
        pub backend: BackendKind,
        /// Local model id picked last time, restored after a rescan.
        #[serde(default)]
        pub last_local_model: String,
        /// Hosted provider display name picked last time.
        #[serde(default)]
        pub last_provider: String,
        #[serde(default = "default_true")]
        pub show_raw_panel: bool,
        /// Docker container to restart when a model refuses to unload.
        #[serde(default)]
        pub backend_container: Option<String>,
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                base_url: default_base_url(),
                backend: BackendKind::default(),
                last_local_model: String::new(),
                last_provider: String::new(),
                show_raw_panel: true,
                backend_container: None,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_settings_defaults_fill_missing_fields() {
            let settings: AppSettings = serde_json::from_str("{}").unwrap();
            assert_eq!(settings.base_url, "http://127.0.0.1:8080/");
            assert_eq!(settings.backend, BackendKind::LocalServer);
            assert!(settings.show_raw_panel);
            assert!(settings.backend_container.is_none());
        }

        #[test]
        fn test_settings_round_trip() {
            let mut settings = AppSettings::default();
            settings.backend = BackendKind::Hosted;
            settings.last_provider = "Gemini".to_string();
            let json = serde_json::to_string_pretty(&settings).unwrap();
            let back: AppSettings = serde_json::from_str(&json).unwrap();
            assert_eq!(back.backend, BackendKind::Hosted);
            assert_eq!(back.last_provider, "Gemini");
        }
    }
}
