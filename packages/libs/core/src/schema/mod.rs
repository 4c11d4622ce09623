//! 모델 스키마 정의 및 파싱
//!
//! # 모듈 구조
//!
//! - `ops`: 필드 가시성 작업 집합과 라우트 작업 코드
//! - `types`: 필드 타입 (String, Number, Date, ObjectId 등)
//! - `field`: 필드 정의와 기본값
//! - `model`: 모델 정의, 레이블, 훅
//! - `hooks`: 이름으로 참조하는 내장 훅
//! - `parser`: 모델 설정 검증 및 변환
//! - `catalog`: 읽기 전용 모델 카탈로그와 빌더

mod catalog;
mod field;
pub mod hooks;
mod model;
mod ops;
mod parser;
mod types;

pub use catalog::{CatalogBuilder, ModelCatalog};
pub use field::{now_string, DefaultValue, FieldSpec, GeneratorFn};
pub use model::{Hook, HookFn, HookSet, Label, ModelSpec};
pub use ops::{OpCode, Operation, OperationSet};
pub use parser::{FieldConfig, HooksConfig, LabelConfig, ModelConfig, SchemaParser};
pub(crate) use parser::is_identifier;
pub use types::FieldType;
