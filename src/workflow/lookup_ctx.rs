//! 地址查询上下文
//!
//! 封装"我正在查询第几个不重复地址"这一信息

use crate::models::Address;
use std::fmt::Display;

/// 地址查询上下文
#[derive(Debug, Clone)]
pub struct LookupCtx {
    /// 按首次出现顺序的序号（从1开始）
    pub index: usize,

    /// 不重复地址总数
    pub total: usize,

    /// 归一化后的地址
    pub address: Address,

    /// 地址在输入中出现的次数
    pub count: usize,
}

impl LookupCtx {
    pub fn new(index: usize, total: usize, address: Address, count: usize) -> Self {
        Self {
            index,
            total,
            address,
            count,
        }
    }
}

impl Display for LookupCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[地址 {}/{} `{}` ×{}]",
            self.index,
            self.total,
            crate::utils::logging::truncate_text(self.address.as_str(), 60),
            self.count
        )
    }
}
