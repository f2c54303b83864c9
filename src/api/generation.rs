use std::fmt;

/// 接口版本
///
/// 同一后端同时提供的两代互不兼容的接口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// 旧版接口
    Legacy,
    /// 新版接口（`/uaapi` 前缀）
    Current,
}

impl Generation {
    /// 另一代接口
    pub fn other(self) -> Self {
        match self {
            Generation::Legacy => Generation::Current,
            Generation::Current => Generation::Legacy,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Generation::Legacy => "old",
            Generation::Current => "new",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Generation::Legacy => 0,
            Generation::Current => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        if value == 0 {
            Generation::Legacy
        } else {
            Generation::Current
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
