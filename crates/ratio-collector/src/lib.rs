//! 비율 수집기.
//!
//! 네 개의 시세를 모아 추세선 적정 비율 대비 프리미엄/디스카운트를 계산하고
//! Google Sheets 원장에 기록합니다. HTTP(`serve`)와 CLI(`run`) 두 진입점이
//! 같은 [`Collector::invoke`]를 사용합니다.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod response;
pub mod server;

pub use config::{
    CaptureConfig, CollectorConfig, EndpointConfig, InstrumentConfig, LedgerConfig, LedgerTarget,
    ServerConfig,
};
pub use error::{CollectorError, Result};
pub use pipeline::{Collector, RunOptions};
pub use response::{FailureReport, InvocationResponse, PremiumReport};
pub use server::{router, serve};
