//! 地址与地址计数
//!
//! 地址统一经过 `normalize_address` 归一化后才参与计数、查询和展示

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::{self, Display};

/// 归一化（小写）后的地址，作为去重键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 归一化原始地址
///
/// 空白单元格返回 `None`，其余内容只做小写转换
pub fn normalize_address(raw: &str) -> Option<Address> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(Address(raw.to_lowercase()))
}

/// 地址出现次数，按首次出现顺序保存
#[derive(Debug, Clone, Default)]
pub struct AddressCount {
    counts: IndexMap<Address, usize>,
    total_rows: usize,
    blank_rows: usize,
}

impl AddressCount {
    /// 统计原始地址序列
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut address_count = Self::default();
        for cell in raw {
            address_count.total_rows += 1;
            match normalize_address(cell.as_ref()) {
                Some(address) => *address_count.counts.entry(address).or_insert(0) += 1,
                None => address_count.blank_rows += 1,
            }
        }
        address_count
    }

    /// 不重复的地址数量
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 输入行数（包括空白行）
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// 跳过的空白行数
    pub fn blank_rows(&self) -> usize {
        self.blank_rows
    }

    pub fn get(&self, address: &Address) -> Option<usize> {
        self.counts.get(address).copied()
    }

    /// 按首次出现顺序遍历 (地址, 次数)
    pub fn iter(&self) -> impl Iterator<Item = (&Address, usize)> {
        self.counts.iter().map(|(address, count)| (address, *count))
    }
}
