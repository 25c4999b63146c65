//! 실행 설정 조립.
//!
//! 우선순위: CLI 인자 > 환경 변수(`DESKPILOT_*`) > 설정 파일 > 기본값.
//! 환경 변수는 `config` 크레이트의 `Environment` 소스로 읽는다.

use config::{Config, ConfigError, Environment};
use deskpilot_core::config::{AppConfig, InputDriverKind};

/// 환경 변수 접두사
pub const ENV_PREFIX: &str = "DESKPILOT";

/// 판단 서비스 관련 환경 변수 덮어쓰기
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `DESKPILOT_API_KEY`
    pub api_key: Option<String>,
    /// `DESKPILOT_ENDPOINT`
    pub endpoint: Option<String>,
    /// `DESKPILOT_MODEL`
    pub model: Option<String>,
}

impl EnvOverrides {
    /// 프로세스 환경에서 읽기
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::with_prefix(ENV_PREFIX))
    }

    pub fn from_source(source: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(source.ignore_empty(true))
            .build()?;

        Ok(Self {
            api_key: settings.get_string("api_key").ok(),
            endpoint: settings.get_string("endpoint").ok(),
            model: settings.get_string("model").ok(),
        })
    }

    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(api_key) = &self.api_key {
            config.decision.api_key = api_key.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.decision.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            config.decision.model = model.clone();
        }
    }
}

/// CLI 덮어쓰기
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max_iterations: Option<u32>,
    pub dry_run: bool,
}

impl CliOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(max_iterations) = self.max_iterations {
            config.agent.max_iterations = max_iterations.max(1);
        }
        if self.dry_run {
            config.input.driver = InputDriverKind::Noop;
        }
    }
}
