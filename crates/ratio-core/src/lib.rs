//! # Ratio Core
//!
//! 비율 추적 작업의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 수집기 전반에서 사용되는 기본 타입을 제공합니다:
//! - 선형 추세선 기반 적정 비율 모델
//! - 시세 및 파생 지표(비율, 적정가, 프리미엄) 계산
//! - 원장(스프레드시트) 행/헤더 구성 및 타임스탬프 형식
//! - 호출 단위 로그 수집
//! - 로깅 인프라

pub mod error;
pub mod invocation_log;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod trend;

pub use error::*;
pub use invocation_log::{CaptureLevel, InvocationLog, LogKind, LogLine};
pub use ledger::{format_ledger_timestamp, InstrumentLabels, LedgerRow, LEDGER_COLUMNS};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{parse_locale_number, round4, DerivedMetrics, Quote, QuoteSet};
pub use trend::TrendConfig;
