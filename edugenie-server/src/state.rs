use std::sync::Arc;

use edugenie_core::config::EduGenieConfig;
use edugenie_core::otp::OtpService;
use edugenie_core::providers::CompletionService;

/// Shared by every handler; cloned per request
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn CompletionService>,
    pub config: Arc<EduGenieConfig>,
    pub otp: OtpService,
}

impl AppState {
    /// State with an in-process OTP store
    pub fn new(service: Arc<dyn CompletionService>, config: EduGenieConfig) -> Self {
        let otp = OtpService::in_memory(&config.otp);
        Self::with_otp(service, config, otp)
    }

    pub fn with_otp(service: Arc<dyn CompletionService>, config: EduGenieConfig, otp: OtpService) -> Self {
        Self {
            service,
            config: Arc::new(config),
            otp,
        }
    }
}
