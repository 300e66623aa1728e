pub mod settings;

pub use settings::{
    generate_default_config, HistorySettings, ServerSettings, Settings, UpstreamSettings,
};
