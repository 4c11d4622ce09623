//! 작업(Operation) 정의
//!
//! 필드 가시성에 쓰이는 네 가지 작업과, 라우트 규칙에 쓰이는 작업 코드(`c`, `r`, `rA`, `u`, `d`)를 정의합니다.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// 필드 가시성 작업
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// 이 작업에 해당하는 플래그
    pub fn flag(&self) -> OperationSet {
        match self {
            Operation::Create => OperationSet::CREATE,
            Operation::Read => OperationSet::READ,
            Operation::Update => OperationSet::UPDATE,
            Operation::Delete => OperationSet::DELETE,
        }
    }

    /// 이름에서 파싱 (`create`, `update` 등)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" => Some(Operation::Create),
            "read" => Some(Operation::Read),
            "update" => Some(Operation::Update),
            "delete" => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// 필드가 허용되는 작업 집합
    ///
    /// 설정에서는 `"cru"`처럼 글자 코드로 적습니다.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OperationSet: u8 {
        const CREATE = 0b0001;
        const READ = 0b0010;
        const UPDATE = 0b0100;
        const DELETE = 0b1000;
    }
}

impl OperationSet {
    /// 글자 코드(`c`, `r`, `u`, `d`)에서 파싱
    ///
    /// 허용되지 않는 글자가 하나라도 있으면 `None`입니다.
    pub fn from_letters(letters: &str) -> Option<Self> {
        let mut set = OperationSet::empty();
        for ch in letters.chars() {
            let flag = match ch {
                'c' => OperationSet::CREATE,
                'r' => OperationSet::READ,
                'u' => OperationSet::UPDATE,
                'd' => OperationSet::DELETE,
                _ => return None,
            };
            set |= flag;
        }
        Some(set)
    }

    /// 특정 작업 허용 여부
    pub fn allows(&self, op: Operation) -> bool {
        self.contains(op.flag())
    }

    /// 글자 코드로 변환 (항상 c, r, u, d 순서)
    pub fn to_letters(&self) -> String {
        let mut out = String::new();
        if self.contains(OperationSet::CREATE) {
            out.push('c');
        }
        if self.contains(OperationSet::READ) {
            out.push('r');
        }
        if self.contains(OperationSet::UPDATE) {
            out.push('u');
        }
        if self.contains(OperationSet::DELETE) {
            out.push('d');
        }
        out
    }
}

impl fmt::Display for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_letters())
    }
}

/// 라우트 작업 코드
///
/// 순서는 라우트 생성 순서이기도 합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpCode {
    /// `c` - 생성
    Create,
    /// `rA` - 전체 조회
    ReadAll,
    /// `r` - 단건 조회
    Read,
    /// `u` - 수정
    Update,
    /// `d` - 삭제
    Delete,
}

impl OpCode {
    /// 모든 작업 코드
    pub const ALL: [OpCode; 5] = [
        OpCode::Create,
        OpCode::ReadAll,
        OpCode::Read,
        OpCode::Update,
        OpCode::Delete,
    ];

    /// 코드 문자열에서 파싱
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "c" => Some(OpCode::Create),
            "r" => Some(OpCode::Read),
            "rA" => Some(OpCode::ReadAll),
            "u" => Some(OpCode::Update),
            "d" => Some(OpCode::Delete),
            _ => None,
        }
    }

    /// 코드 문자열
    pub fn code(&self) -> &'static str {
        match self {
            OpCode::Create => "c",
            OpCode::Read => "r",
            OpCode::ReadAll => "rA",
            OpCode::Update => "u",
            OpCode::Delete => "d",
        }
    }

    /// 필드 가시성 판단에 쓰는 작업 (`r`, `rA` 모두 read)
    pub fn field_operation(&self) -> Operation {
        match self {
            OpCode::Create => Operation::Create,
            OpCode::Read | OpCode::ReadAll => Operation::Read,
            OpCode::Update => Operation::Update,
            OpCode::Delete => Operation::Delete,
        }
    }

    /// 단일 리소스를 대상으로 하는 작업인지 (`:id` 경로)
    pub fn targets_single(&self) -> bool {
        matches!(self, OpCode::Read | OpCode::Update | OpCode::Delete)
    }

    /// 요청 본문을 받는 작업인지
    pub fn accepts_body(&self) -> bool {
        matches!(self, OpCode::Create | OpCode::Update)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_parsing() {
        let set = OperationSet::from_letters("cru").unwrap();
        assert!(set.allows(Operation::Create));
        assert!(set.allows(Operation::Read));
        assert!(set.allows(Operation::Update));
        assert!(!set.allows(Operation::Delete));

        assert_eq!(OperationSet::from_letters(""), Some(OperationSet::empty()));
        assert_eq!(OperationSet::from_letters("crx"), None);
        assert_eq!(OperationSet::from_letters("CR"), None);
    }

    #[test]
    fn test_letters_are_canonical() {
        let set = OperationSet::from_letters("dcr").unwrap();
        assert_eq!(set.to_letters(), "crd");
    }

    #[test]
    fn test_op_codes() {
        assert_eq!(OpCode::from_code("rA"), Some(OpCode::ReadAll));
        assert_eq!(OpCode::from_code("ra"), None);
        assert_eq!(OpCode::ReadAll.field_operation(), Operation::Read);
        assert_eq!(OpCode::Read.field_operation(), Operation::Read);
        assert!(OpCode::Delete.targets_single());
        assert!(!OpCode::ReadAll.targets_single());
        assert!(OpCode::Update.accepts_body());
    }
}
