mod settings;

pub use settings::{
    ApiConfig, AuthConfig, LogFormat, LoggingConfig, PollingConfig, PushConfig, Settings,
    ToastConfig,
};
